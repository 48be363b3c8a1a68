use inkboard_engine::Command;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyPhase {
    Down,
    Up,
}

#[derive(Clone, Copy, Debug)]
pub struct KeyPress<'a> {
    pub key: &'a str,
    pub alt: bool,
    pub shift: bool,
    /// Ctrl or Meta.
    pub modifier: bool,
    pub repeat: bool,
}

/// Global shortcuts. Everything fires on key release except the momentary
/// stroke-delete hold, which starts on alt+e down and ends when e is released.
pub fn command_for(phase: KeyPhase, press: KeyPress<'_>) -> Option<Command> {
    if press.modifier {
        return None;
    }
    let key = press.key.to_ascii_lowercase();
    match (phase, key.as_str()) {
        (KeyPhase::Down, "e") if press.alt && !press.repeat => Some(Command::HoldStrokeDelete),
        (KeyPhase::Down, _) => None,
        (KeyPhase::Up, "e") => Some(Command::ReleaseStrokeDelete),
        (KeyPhase::Up, "z") if press.alt && press.shift => Some(Command::Redo),
        (KeyPhase::Up, "z") if press.alt => Some(Command::Undo),
        (KeyPhase::Up, "y") if press.alt => Some(Command::Redo),
        (KeyPhase::Up, ".") => Some(Command::Clear),
        (KeyPhase::Up, ",") => Some(Command::ToggleVisibility),
        (KeyPhase::Up, "d") if !press.alt => Some(Command::ToggleStrokeDelete),
        (KeyPhase::Up, "c") if press.alt => Some(Command::ToggleCalligraphy),
        (KeyPhase::Up, "x") if press.alt => Some(Command::TogglePerfectFreehand),
        (KeyPhase::Up, "b") if press.alt => Some(Command::ToggleSmallCanvas),
        (KeyPhase::Up, "t") if press.alt => Some(Command::ToggleTextWriting),
        (KeyPhase::Up, slot @ ("1" | "2" | "3" | "4")) if press.alt => {
            slot.parse::<usize>().ok().map(|slot| Command::SelectPen(slot - 1))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(key: &str, alt: bool) -> KeyPress<'_> {
        KeyPress {
            key,
            alt,
            shift: false,
            modifier: false,
            repeat: false,
        }
    }

    #[test]
    fn alt_bindings_fire_on_release() {
        assert_eq!(command_for(KeyPhase::Up, press("z", true)), Some(Command::Undo));
        assert_eq!(command_for(KeyPhase::Down, press("z", true)), None);
        assert_eq!(command_for(KeyPhase::Up, press("z", false)), None);
        assert_eq!(command_for(KeyPhase::Up, press("C", true)), Some(Command::ToggleCalligraphy));
        assert_eq!(command_for(KeyPhase::Up, press("3", true)), Some(Command::SelectPen(2)));
    }

    #[test]
    fn plain_bindings() {
        assert_eq!(command_for(KeyPhase::Up, press(".", false)), Some(Command::Clear));
        assert_eq!(command_for(KeyPhase::Up, press(",", false)), Some(Command::ToggleVisibility));
        assert_eq!(command_for(KeyPhase::Up, press("d", false)), Some(Command::ToggleStrokeDelete));
    }

    #[test]
    fn hold_delete_ignores_autorepeat() {
        let mut held = press("e", true);
        assert_eq!(command_for(KeyPhase::Down, held), Some(Command::HoldStrokeDelete));
        held.repeat = true;
        assert_eq!(command_for(KeyPhase::Down, held), None);
        assert_eq!(command_for(KeyPhase::Up, press("e", false)), Some(Command::ReleaseStrokeDelete));
    }

    #[test]
    fn browser_shortcuts_pass_through() {
        let mut copy = press("c", false);
        copy.modifier = true;
        assert_eq!(command_for(KeyPhase::Up, copy), None);
    }
}
