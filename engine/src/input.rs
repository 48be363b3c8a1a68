use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionKind, FontSnapshot, InkPoint, StrokeStyle, TextBlock};
use crate::error::ConfigError;
use crate::geometry::{distance, distance_to_segment, normalize_point, polylines_intersect, Vec2};
use crate::history::History;
use crate::render::{LiveGesture, LiveLine};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PointerDevice {
    #[default]
    Mouse,
    Pen,
    Touch,
}

impl PointerDevice {
    /// Maps a DOM `pointerType`. Anything starting with `p` is a pen.
    pub fn from_pointer_type(kind: &str) -> Self {
        if kind.starts_with('p') {
            PointerDevice::Pen
        } else if kind == "touch" {
            PointerDevice::Touch
        } else {
            PointerDevice::Mouse
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PointerInput {
    pub x: f64,
    pub y: f64,
    pub is_primary: bool,
    pub device: PointerDevice,
    pub pressure: f64,
}

impl PointerInput {
    pub fn new(x: f64, y: f64, device: PointerDevice, pressure: f64) -> Self {
        Self {
            x,
            y,
            is_primary: true,
            device,
            pressure,
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    fn sample(&self, base_width: f64, pressure_sensitive: bool) -> InkPoint {
        let pressure = (pressure_sensitive && self.device == PointerDevice::Pen)
            .then_some(self.pressure.clamp(0.0, 1.0));
        InkPoint::sampled(self.position(), pressure, base_width)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    #[default]
    Line,
    PerfectFreehand,
    Calligraphy,
    StrokeDelete,
    TextWriting,
}

impl Tool {
    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Line => "line",
            Tool::PerfectFreehand => "perfect-freehand",
            Tool::Calligraphy => "calligraphy",
            Tool::StrokeDelete => "stroke-delete",
            Tool::TextWriting => "text-writing",
        }
    }

    /// Whether a press on the canvas hands keyboard focus to the text field.
    /// The host must then suppress the default mousedown focus change.
    pub fn keeps_text_focus(self) -> bool {
        self == Tool::TextWriting
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "line" => Ok(Tool::Line),
            "perfect-freehand" => Ok(Tool::PerfectFreehand),
            "calligraphy" => Ok(Tool::Calligraphy),
            "stroke-delete" => Ok(Tool::StrokeDelete),
            "text-writing" => Ok(Tool::TextWriting),
            other => Err(ConfigError::UnknownCommand(other.to_string())),
        }
    }
}

/// What a capture needs from the engine at the moment it starts or grows.
#[derive(Clone, Copy, Debug)]
pub struct CaptureSettings<'a> {
    pub style: &'a StrokeStyle,
    pub font: &'a FontSnapshot,
    pub pressure_sensitive: bool,
    pub min_move_distance: f64,
}

pub enum StrokeMode {
    Idle,
    Drawing {
        style: StrokeStyle,
        points: Vec<InkPoint>,
    },
}

pub enum SampleMode {
    Idle,
    Drawing {
        style: StrokeStyle,
        samples: Vec<Vec2>,
    },
}

pub enum EraseMode {
    Idle,
    Erasing { path: Vec<Vec2> },
}

pub struct EraseState {
    pub mode: EraseMode,
    /// Tool to return to when a momentary hold ends.
    pub held_from: Option<Tool>,
}

pub enum TextMode {
    Idle,
    Editing { style: StrokeStyle, block: TextBlock },
}

pub enum Mode {
    Line(StrokeMode),
    PerfectFreehand(StrokeMode),
    Calligraphy(SampleMode),
    StrokeDelete(EraseState),
    TextWriting(TextMode),
}

impl Mode {
    pub fn idle(tool: Tool) -> Self {
        match tool {
            Tool::Line => Mode::Line(StrokeMode::Idle),
            Tool::PerfectFreehand => Mode::PerfectFreehand(StrokeMode::Idle),
            Tool::Calligraphy => Mode::Calligraphy(SampleMode::Idle),
            Tool::StrokeDelete => Mode::StrokeDelete(EraseState {
                mode: EraseMode::Idle,
                held_from: None,
            }),
            Tool::TextWriting => Mode::TextWriting(TextMode::Idle),
        }
    }

    pub fn tool(&self) -> Tool {
        match self {
            Mode::Line(_) => Tool::Line,
            Mode::PerfectFreehand(_) => Tool::PerfectFreehand,
            Mode::Calligraphy(_) => Tool::Calligraphy,
            Mode::StrokeDelete(_) => Tool::StrokeDelete,
            Mode::TextWriting(_) => Tool::TextWriting,
        }
    }

    pub fn is_capturing(&self) -> bool {
        match self {
            Mode::Line(mode) | Mode::PerfectFreehand(mode) => {
                matches!(mode, StrokeMode::Drawing { .. })
            }
            Mode::Calligraphy(mode) => matches!(mode, SampleMode::Drawing { .. }),
            Mode::StrokeDelete(state) => matches!(state.mode, EraseMode::Erasing { .. }),
            Mode::TextWriting(mode) => matches!(mode, TextMode::Editing { .. }),
        }
    }
}

/// Result of a key pressed while text is being entered.
#[derive(Debug, Default)]
pub struct TextKeyOutcome {
    /// The host should swallow the key.
    pub suppress: bool,
    pub committed: Option<Action>,
}

/// Routes pointer and key input to the single active capture mode.
pub struct InputRouter {
    mode: Mode,
    /// Set once a pen contact starts; other devices are ignored until release
    /// so a resting palm does not draw.
    pen_lock: bool,
}

impl Default for InputRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl InputRouter {
    pub fn new() -> Self {
        Self {
            mode: Mode::idle(Tool::Line),
            pen_lock: false,
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn tool(&self) -> Tool {
        self.mode.tool()
    }

    pub fn is_capturing(&self) -> bool {
        self.mode.is_capturing()
    }

    pub fn is_holding_delete(&self) -> bool {
        matches!(
            &self.mode,
            Mode::StrokeDelete(EraseState {
                held_from: Some(_),
                ..
            })
        )
    }

    /// Ends whatever is in progress. Pending text is submitted, every other
    /// capture is dropped.
    pub fn stop_capture(&mut self) -> Option<Action> {
        self.pen_lock = false;
        match &mut self.mode {
            Mode::Line(mode) | Mode::PerfectFreehand(mode) => {
                *mode = StrokeMode::Idle;
                None
            }
            Mode::Calligraphy(mode) => {
                *mode = SampleMode::Idle;
                None
            }
            Mode::StrokeDelete(state) => {
                state.mode = EraseMode::Idle;
                None
            }
            Mode::TextWriting(mode) => take_text(mode),
        }
    }

    /// Toggles `tool`: selecting the active tool again falls back to plain
    /// lines.
    pub fn toggle(&mut self, tool: Tool) -> Option<Action> {
        let committed = self.stop_capture();
        let next = if self.tool() == tool { Tool::Line } else { tool };
        log::debug!("mode {} -> {}", self.tool(), next);
        self.mode = Mode::idle(next);
        committed
    }

    /// Momentary stroke delete. The current tool is remembered and restored by
    /// [`InputRouter::end_hold_delete`].
    pub fn begin_hold_delete(&mut self) -> Option<Action> {
        if self.tool() == Tool::StrokeDelete {
            return None;
        }
        let committed = self.stop_capture();
        let previous = self.tool();
        log::debug!("holding stroke delete over {previous}");
        self.mode = Mode::StrokeDelete(EraseState {
            mode: EraseMode::Idle,
            held_from: Some(previous),
        });
        committed
    }

    /// Ends a momentary hold, finishing any eraser gesture first.
    pub fn end_hold_delete(&mut self, history: &History, reach: f64) -> Option<Action> {
        let Mode::StrokeDelete(EraseState {
            held_from: Some(previous),
            ..
        }) = &self.mode
        else {
            return None;
        };
        let previous = *previous;
        let committed = self.finish_delete(history, reach);
        log::debug!("released stroke delete, back to {previous}");
        self.mode = Mode::idle(previous);
        committed
    }

    fn accepts(&mut self, input: &PointerInput, starting: bool) -> bool {
        if !input.is_primary {
            return false;
        }
        if input.device == PointerDevice::Pen {
            if starting {
                self.pen_lock = true;
            }
            return true;
        }
        !self.pen_lock
    }

    pub fn pointer_down(&mut self, input: &PointerInput, settings: &CaptureSettings<'_>) -> Option<Action> {
        if !self.accepts(input, true) {
            return None;
        }
        let position = normalize_point(input.position())?;
        match &mut self.mode {
            Mode::Line(mode) | Mode::PerfectFreehand(mode) => {
                if let StrokeMode::Idle = mode {
                    *mode = StrokeMode::Drawing {
                        style: settings.style.clone(),
                        points: vec![input.sample(settings.style.base_width, settings.pressure_sensitive)],
                    };
                }
                None
            }
            Mode::Calligraphy(mode) => {
                if let SampleMode::Idle = mode {
                    *mode = SampleMode::Drawing {
                        style: settings.style.clone(),
                        samples: vec![position],
                    };
                }
                None
            }
            Mode::StrokeDelete(state) => {
                if let EraseMode::Idle = state.mode {
                    state.mode = EraseMode::Erasing {
                        path: vec![position],
                    };
                }
                None
            }
            Mode::TextWriting(mode) => {
                let committed = take_text(mode);
                *mode = TextMode::Editing {
                    style: settings.style.clone(),
                    block: TextBlock {
                        anchor: position,
                        text: String::new(),
                        font: settings.font.clone(),
                    },
                };
                committed
            }
        }
    }

    /// Returns whether the live gesture changed.
    pub fn pointer_move(&mut self, input: &PointerInput, settings: &CaptureSettings<'_>) -> bool {
        if !self.accepts(input, false) {
            return false;
        }
        let Some(position) = normalize_point(input.position()) else {
            return false;
        };
        match &mut self.mode {
            Mode::Line(StrokeMode::Drawing { style, points })
            | Mode::PerfectFreehand(StrokeMode::Drawing { style, points }) => {
                points.push(input.sample(style.base_width, settings.pressure_sensitive));
                true
            }
            Mode::Calligraphy(SampleMode::Drawing { samples, .. }) => {
                push_decimated(samples, position, settings.min_move_distance)
            }
            Mode::StrokeDelete(EraseState {
                mode: EraseMode::Erasing { path },
                ..
            }) => push_decimated(path, position, settings.min_move_distance),
            _ => false,
        }
    }

    /// Finishes the gesture. `input` is `None` when the release happened
    /// somewhere the position is meaningless.
    pub fn pointer_up(
        &mut self,
        input: Option<&PointerInput>,
        settings: &CaptureSettings<'_>,
        history: &History,
    ) -> Option<Action> {
        if let Some(input) = input {
            if !self.accepts(input, false) {
                return None;
            }
        }
        self.pen_lock = false;
        let position = input.and_then(|input| normalize_point(input.position()));
        let tail = input.filter(|_| position.is_some());
        match &mut self.mode {
            Mode::Line(mode) => finish_stroke(mode, tail, settings.pressure_sensitive, false),
            Mode::PerfectFreehand(mode) => finish_stroke(mode, tail, settings.pressure_sensitive, true),
            Mode::Calligraphy(mode) => {
                let SampleMode::Drawing { style, mut samples } = std::mem::replace(mode, SampleMode::Idle) else {
                    return None;
                };
                if let Some(position) = position {
                    push_decimated(&mut samples, position, settings.min_move_distance);
                }
                Some(Action::new(style, ActionKind::Calligraphy { samples }))
            }
            Mode::StrokeDelete(state) => {
                if let (Some(position), EraseMode::Erasing { path }) = (position, &mut state.mode) {
                    push_decimated(path, position, settings.min_move_distance);
                }
                self.finish_delete(history, settings.min_move_distance)
            }
            Mode::TextWriting(_) => None,
        }
    }

    /// Completes an eraser gesture. Produces a delete marker only when the
    /// path touched at least one visible stroke.
    pub fn finish_delete(&mut self, history: &History, reach: f64) -> Option<Action> {
        let Mode::StrokeDelete(state) = &mut self.mode else {
            return None;
        };
        let EraseMode::Erasing { path } = std::mem::replace(&mut state.mode, EraseMode::Idle) else {
            return None;
        };
        let hidden = erase_hits(history, &path, reach);
        if hidden.is_empty() {
            log::debug!("eraser path hit nothing");
            return None;
        }
        log::debug!("eraser hid {hidden:?}");
        Some(Action::delete_marker(hidden))
    }

    pub fn pending_text(&self) -> Option<&TextBlock> {
        match &self.mode {
            Mode::TextWriting(TextMode::Editing { block, .. }) => Some(block),
            _ => None,
        }
    }

    /// Mirrors the hidden input's value into the pending block.
    pub fn text_changed(&mut self, value: &str) -> bool {
        match &mut self.mode {
            Mode::TextWriting(TextMode::Editing { block, .. }) => {
                block.text = value.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn text_key(&mut self, key: &str) -> TextKeyOutcome {
        let Mode::TextWriting(mode) = &mut self.mode else {
            return TextKeyOutcome::default();
        };
        if !matches!(mode, TextMode::Editing { .. }) {
            return TextKeyOutcome::default();
        }
        match key {
            "ArrowUp" | "ArrowDown" | "ArrowLeft" | "ArrowRight" => TextKeyOutcome {
                suppress: true,
                committed: None,
            },
            "Escape" => TextKeyOutcome {
                suppress: true,
                committed: take_text(mode),
            },
            _ => TextKeyOutcome::default(),
        }
    }

    /// The hidden input lost focus.
    pub fn text_blur(&mut self) -> Option<Action> {
        match &mut self.mode {
            Mode::TextWriting(mode) => take_text(mode),
            _ => None,
        }
    }

    /// In-progress plain line, painted directly on the main surface.
    pub fn live_line(&self) -> Option<LiveLine<'_>> {
        match &self.mode {
            Mode::Line(StrokeMode::Drawing { style, points }) => Some(LiveLine { style, points }),
            _ => None,
        }
    }

    /// Feedback for the guide surface.
    pub fn live_gesture(&self) -> Option<LiveGesture<'_>> {
        match &self.mode {
            Mode::PerfectFreehand(StrokeMode::Drawing { style, points }) => {
                Some(LiveGesture::Freehand { style, points })
            }
            Mode::Calligraphy(SampleMode::Drawing { style, samples }) => {
                Some(LiveGesture::Calligraphy { style, samples })
            }
            Mode::StrokeDelete(EraseState {
                mode: EraseMode::Erasing { path },
                ..
            }) => Some(LiveGesture::Eraser { path }),
            Mode::TextWriting(TextMode::Editing { style, block }) => Some(LiveGesture::Text { style, block }),
            _ => None,
        }
    }
}

fn finish_stroke(
    mode: &mut StrokeMode,
    last: Option<&PointerInput>,
    pressure_sensitive: bool,
    perfect: bool,
) -> Option<Action> {
    let StrokeMode::Drawing { style, mut points } = std::mem::replace(mode, StrokeMode::Idle) else {
        return None;
    };
    if let Some(input) = last {
        points.push(input.sample(style.base_width, pressure_sensitive));
    }
    let kind = if perfect {
        ActionKind::PerfectLine { points }
    } else {
        ActionKind::Line { points }
    };
    Some(Action::new(style, kind))
}

fn take_text(mode: &mut TextMode) -> Option<Action> {
    let TextMode::Editing { style, block } = std::mem::replace(mode, TextMode::Idle) else {
        return None;
    };
    if block.is_blank() {
        log::debug!("discarding blank text");
        return None;
    }
    Some(Action::new(style, ActionKind::Text(block)))
}

fn push_decimated(path: &mut Vec<Vec2>, position: Vec2, min_distance: f64) -> bool {
    match path.last() {
        Some(&last) if distance(last, position) <= min_distance => false,
        _ => {
            path.push(position);
            true
        }
    }
}

fn segments(path: &[Vec2]) -> Vec<(Vec2, Vec2)> {
    match path {
        [single] => vec![(*single, *single)],
        _ => path.windows(2).map(|pair| (pair[0], pair[1])).collect(),
    }
}

/// Whether the eraser path touches a stroke. Paths that are a single point
/// (a dot stroke or a tap of the eraser) count when within `reach`.
pub fn eraser_touches(stroke: &[Vec2], eraser: &[Vec2], reach: f64) -> bool {
    if stroke.len() > 1 && eraser.len() > 1 {
        return polylines_intersect(stroke, eraser);
    }
    let (dots, lines) = if stroke.len() == 1 {
        (stroke, eraser)
    } else {
        (eraser, stroke)
    };
    let Some(&dot) = dots.first() else {
        return false;
    };
    segments(lines)
        .into_iter()
        .any(|(a, b)| distance_to_segment(dot, a, b) <= reach)
}

pub fn erase_hits(history: &History, eraser: &[Vec2], reach: f64) -> Vec<usize> {
    if eraser.is_empty() {
        return Vec::new();
    }
    history
        .erasable()
        .filter(|(_, path)| eraser_touches(path, eraser, reach))
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style() -> StrokeStyle {
        StrokeStyle {
            color: "rgba(0, 0, 0, 0.5)".to_string(),
            opaque_color: "rgba(0, 0, 0, 1)".to_string(),
            base_width: 4.0,
            opacity: 0.5,
        }
    }

    fn font() -> FontSnapshot {
        FontSnapshot {
            family: "Arial".to_string(),
            size: 20.0,
            bold: false,
            italic: false,
        }
    }

    fn mouse(x: f64, y: f64) -> PointerInput {
        PointerInput::new(x, y, PointerDevice::Mouse, 0.5)
    }

    fn pen(x: f64, y: f64) -> PointerInput {
        PointerInput::new(x, y, PointerDevice::Pen, 0.5)
    }

    struct Fixture {
        style: StrokeStyle,
        font: FontSnapshot,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                style: style(),
                font: font(),
            }
        }

        fn settings(&self) -> CaptureSettings<'_> {
            CaptureSettings {
                style: &self.style,
                font: &self.font,
                pressure_sensitive: true,
                min_move_distance: 5.0,
            }
        }
    }

    fn draw(router: &mut InputRouter, fixture: &Fixture, history: &History, points: &[(f64, f64)]) -> Option<Action> {
        let settings = fixture.settings();
        let (first, rest) = points.split_first()?;
        router.pointer_down(&mouse(first.0, first.1), &settings);
        let (last, middle) = match rest.split_last() {
            Some(split) => split,
            None => (first, &[][..]),
        };
        for &(x, y) in middle {
            router.pointer_move(&mouse(x, y), &settings);
        }
        router.pointer_up(Some(&mouse(last.0, last.1)), &settings, history)
    }

    #[test]
    fn line_gesture_commits_on_release() {
        let fixture = Fixture::new();
        let mut router = InputRouter::new();
        let history = History::new();
        let action = draw(&mut router, &fixture, &history, &[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]).unwrap();
        let ActionKind::Line { points } = action.kind else {
            panic!("expected a line");
        };
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].pressure, crate::action::SENTINEL_PRESSURE);
        assert!(!router.is_capturing());
    }

    #[test]
    fn tap_is_a_dot() {
        let fixture = Fixture::new();
        let mut router = InputRouter::new();
        let settings = fixture.settings();
        router.pointer_down(&mouse(4.0, 4.0), &settings);
        let action = router.pointer_up(None, &settings, &History::new()).unwrap();
        assert!(matches!(action.kind, ActionKind::Line { ref points } if points.len() == 1));
    }

    #[test]
    fn move_without_down_is_ignored() {
        let fixture = Fixture::new();
        let mut router = InputRouter::new();
        assert!(!router.pointer_move(&mouse(1.0, 1.0), &fixture.settings()));
        assert!(router.pointer_up(Some(&mouse(1.0, 1.0)), &fixture.settings(), &History::new()).is_none());
    }

    #[test]
    fn pen_pressure_sets_width() {
        let fixture = Fixture::new();
        let mut router = InputRouter::new();
        router.pointer_down(&pen(0.0, 0.0), &fixture.settings());
        let line = router.live_line().unwrap();
        assert_eq!(line.points[0].render_width, 1.0 + 0.5 * 4.0 * 2.0);
    }

    #[test]
    fn pen_lock_ignores_touch_until_release() {
        let fixture = Fixture::new();
        let settings = fixture.settings();
        let mut router = InputRouter::new();
        router.pointer_down(&pen(0.0, 0.0), &settings);
        let palm = PointerInput::new(50.0, 50.0, PointerDevice::Touch, 0.0);
        assert!(!router.pointer_move(&palm, &settings));
        assert!(router.pointer_up(Some(&palm), &settings, &History::new()).is_none());
        assert!(router.is_capturing());
        assert!(router.pointer_up(Some(&pen(1.0, 1.0)), &settings, &History::new()).is_some());
        router.pointer_down(&palm, &settings);
        assert!(router.is_capturing());
    }

    #[test]
    fn non_primary_contacts_are_ignored() {
        let fixture = Fixture::new();
        let mut router = InputRouter::new();
        let mut second = mouse(1.0, 1.0);
        second.is_primary = false;
        router.pointer_down(&second, &fixture.settings());
        assert!(!router.is_capturing());
    }

    #[test]
    fn calligraphy_decimates_samples() {
        let fixture = Fixture::new();
        let mut router = InputRouter::new();
        router.toggle(Tool::Calligraphy);
        let action = draw(
            &mut router,
            &fixture,
            &History::new(),
            &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (8.0, 0.0), (9.0, 0.0), (20.0, 0.0)],
        )
        .unwrap();
        let ActionKind::Calligraphy { samples } = action.kind else {
            panic!("expected calligraphy");
        };
        assert_eq!(samples, vec![Vec2::new(0.0, 0.0), Vec2::new(8.0, 0.0), Vec2::new(20.0, 0.0)]);
    }

    #[test]
    fn toggling_is_exclusive_and_reversible() {
        let mut router = InputRouter::new();
        router.toggle(Tool::PerfectFreehand);
        assert_eq!(router.tool(), Tool::PerfectFreehand);
        router.toggle(Tool::Calligraphy);
        assert_eq!(router.tool(), Tool::Calligraphy);
        router.toggle(Tool::Calligraphy);
        assert_eq!(router.tool(), Tool::Line);
    }

    #[test]
    fn toggle_discards_stroke_in_progress() {
        let fixture = Fixture::new();
        let mut router = InputRouter::new();
        router.pointer_down(&mouse(0.0, 0.0), &fixture.settings());
        assert!(router.toggle(Tool::Calligraphy).is_none());
        assert!(!router.is_capturing());
    }

    #[test]
    fn eraser_hits_crossing_strokes_only() {
        let fixture = Fixture::new();
        let mut history = History::new();
        let mut router = InputRouter::new();
        history.commit(draw(&mut router, &fixture, &history, &[(0.0, 0.0), (10.0, 10.0)]).unwrap());
        history.commit(draw(&mut router, &fixture, &history, &[(100.0, 100.0), (110.0, 110.0)]).unwrap());
        router.toggle(Tool::StrokeDelete);
        let action = draw(&mut router, &fixture, &history, &[(0.0, 10.0), (10.0, 0.0)]).unwrap();
        assert_eq!(action.kind, ActionKind::Delete { hidden: vec![0] });
    }

    #[test]
    fn eraser_missing_everything_records_nothing() {
        let fixture = Fixture::new();
        let mut history = History::new();
        let mut router = InputRouter::new();
        history.commit(draw(&mut router, &fixture, &history, &[(0.0, 0.0), (10.0, 10.0)]).unwrap());
        router.toggle(Tool::StrokeDelete);
        assert!(draw(&mut router, &fixture, &history, &[(50.0, 0.0), (60.0, 10.0)]).is_none());
    }

    #[test]
    fn eraser_reaches_dots() {
        let dot = [Vec2::new(5.0, 5.0)];
        let eraser = [Vec2::new(0.0, 7.0), Vec2::new(10.0, 7.0)];
        assert!(eraser_touches(&dot, &eraser, 5.0));
        assert!(!eraser_touches(&dot, &eraser, 1.0));
        let tap = [Vec2::new(5.0, 6.0)];
        let stroke = [Vec2::new(0.0, 5.0), Vec2::new(10.0, 5.0)];
        assert!(eraser_touches(&stroke, &tap, 5.0));
    }

    #[test]
    fn hold_delete_restores_previous_tool() {
        let fixture = Fixture::new();
        let mut history = History::new();
        let mut router = InputRouter::new();
        router.toggle(Tool::Calligraphy);
        history.commit(draw(&mut router, &fixture, &history, &[(0.0, 0.0), (10.0, 10.0)]).unwrap());
        router.begin_hold_delete();
        assert!(router.is_holding_delete());
        let settings = fixture.settings();
        router.pointer_down(&mouse(0.0, 10.0), &settings);
        router.pointer_move(&mouse(10.0, 0.0), &settings);
        let committed = router.end_hold_delete(&history, 5.0).unwrap();
        assert_eq!(committed.kind, ActionKind::Delete { hidden: vec![0] });
        assert_eq!(router.tool(), Tool::Calligraphy);
    }

    #[test]
    fn text_commits_on_click_elsewhere() {
        let fixture = Fixture::new();
        let settings = fixture.settings();
        let mut router = InputRouter::new();
        router.toggle(Tool::TextWriting);
        assert!(router.pointer_down(&mouse(10.0, 10.0), &settings).is_none());
        router.text_changed("hello");
        let committed = router.pointer_down(&mouse(50.0, 50.0), &settings).unwrap();
        let ActionKind::Text(block) = committed.kind else {
            panic!("expected text");
        };
        assert_eq!(block.text, "hello");
        assert_eq!(block.anchor, Vec2::new(10.0, 10.0));
        assert_eq!(router.pending_text().unwrap().anchor, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn text_keys() {
        let fixture = Fixture::new();
        let mut router = InputRouter::new();
        router.toggle(Tool::TextWriting);
        router.pointer_down(&mouse(10.0, 10.0), &fixture.settings());
        router.text_changed("hi");
        let arrow = router.text_key("ArrowLeft");
        assert!(arrow.suppress && arrow.committed.is_none());
        assert!(!router.text_key("a").suppress);
        let escape = router.text_key("Escape");
        assert!(escape.committed.is_some());
        assert!(router.pending_text().is_none());
    }

    #[test]
    fn enter_passes_through_to_the_text_field() {
        let fixture = Fixture::new();
        let mut router = InputRouter::new();
        router.toggle(Tool::TextWriting);
        router.pointer_down(&mouse(10.0, 10.0), &fixture.settings());
        router.text_changed("a");
        let enter = router.text_key("Enter");
        assert!(!enter.suppress);
        assert!(enter.committed.is_none());
        router.text_changed("a\nb");
        assert_eq!(router.pending_text().unwrap().lines().count(), 2);
    }

    #[test]
    fn only_text_writing_keeps_text_focus() {
        assert!(Tool::TextWriting.keeps_text_focus());
        for tool in [Tool::Line, Tool::PerfectFreehand, Tool::Calligraphy, Tool::StrokeDelete] {
            assert!(!tool.keeps_text_focus());
        }
    }

    #[test]
    fn blank_text_is_discarded() {
        let fixture = Fixture::new();
        let mut router = InputRouter::new();
        router.toggle(Tool::TextWriting);
        router.pointer_down(&mouse(10.0, 10.0), &fixture.settings());
        router.text_changed("   ");
        assert!(router.text_blur().is_none());
    }

    #[test]
    fn switching_away_submits_text() {
        let fixture = Fixture::new();
        let mut router = InputRouter::new();
        router.toggle(Tool::TextWriting);
        router.pointer_down(&mouse(10.0, 10.0), &fixture.settings());
        router.text_changed("keep");
        assert!(router.toggle(Tool::PerfectFreehand).is_some());
    }
}
