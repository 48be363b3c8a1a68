use crate::action::{Action, ActionKind};
use crate::geometry::Vec2;

/// Ordered log of committed actions plus the redo stack.
///
/// Entries are only ever appended or popped from the end, so an index handed
/// out by [`History::commit`] keeps pointing at the same action for as long as
/// that action is in the log. Delete markers rely on this: they store plain
/// indices of the entries they hid.
#[derive(Clone, Debug, Default)]
pub struct History {
    actions: Vec<Action>,
    redo: Vec<Action>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn get(&self, index: usize) -> Option<&Action> {
        self.actions.get(index)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn redo_stack(&self) -> &[Action] {
        &self.redo
    }

    pub fn can_undo(&self) -> bool {
        !self.actions.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Drives the host's "has drawable content" indicator.
    pub fn has_content(&self) -> bool {
        !self.actions.is_empty()
    }

    /// Appends a finished gesture and drops the redo branch. Empty gestures
    /// are discarded and return `None`.
    pub fn commit(&mut self, action: Action) -> Option<usize> {
        if action.is_empty() {
            log::debug!("discarding empty {} gesture", action.label());
            return None;
        }
        self.redo.clear();
        Some(self.push(action))
    }

    pub fn undo(&mut self) -> Option<usize> {
        let action = self.actions.pop()?;
        let index = self.actions.len();
        if let ActionKind::Delete { hidden } = &action.kind {
            self.set_visibility(hidden, true);
        }
        log::debug!("undo {} at {index}", action.label());
        self.redo.push(action);
        Some(index)
    }

    pub fn redo(&mut self) -> Option<usize> {
        let action = self.redo.pop()?;
        log::debug!("redo {} at {}", action.label(), self.actions.len());
        Some(self.push(action))
    }

    /// Appends a soft-clear barrier unless the log already ends with one.
    pub fn add_clear_marker(&mut self) -> bool {
        if self.actions.last().is_some_and(Action::is_clear) {
            return false;
        }
        self.redo.clear();
        self.push(Action::clear_marker());
        true
    }

    /// Unconditional wipe. Not undoable.
    pub fn hard_clear(&mut self) {
        self.actions.clear();
        self.redo.clear();
    }

    /// Index of the most recent clear marker; nothing before it is ever drawn.
    pub fn last_clear_index(&self) -> Option<usize> {
        self.actions.iter().rposition(Action::is_clear)
    }

    /// Visible entries whose point sequence the eraser can hit. Nothing
    /// behind the most recent clear marker is on screen, so it is skipped.
    pub fn erasable(&self) -> impl Iterator<Item = (usize, Vec<Vec2>)> + '_ {
        let start = self.last_clear_index().map_or(0, |index| index + 1);
        self.actions
            .iter()
            .enumerate()
            .skip(start)
            .filter(|(_, action)| action.visible)
            .filter_map(|(index, action)| action.hit_path().map(|path| (index, path)))
    }

    fn push(&mut self, action: Action) -> usize {
        if let ActionKind::Delete { hidden } = &action.kind {
            let hidden = hidden.clone();
            self.set_visibility(&hidden, false);
        }
        self.actions.push(action);
        self.actions.len() - 1
    }

    fn set_visibility(&mut self, indices: &[usize], visible: bool) {
        for &index in indices {
            if let Some(target) = self.actions.get_mut(index) {
                target.visible = visible;
            }
        }
    }
}
