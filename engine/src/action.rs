use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Pressure recorded for samples from devices that report none.
pub const SENTINEL_PRESSURE: f64 = 2.0;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct InkPoint {
    pub x: f64,
    pub y: f64,
    pub pressure: f64,
    pub render_width: f64,
}

impl InkPoint {
    pub fn new(x: f64, y: f64, pressure: f64, render_width: f64) -> Self {
        Self {
            x,
            y,
            pressure,
            render_width,
        }
    }

    /// A sample stamped with the width it will be drawn at. Real pen pressure
    /// widens the line, anything else draws at the pen's base width.
    pub fn sampled(position: Vec2, pressure: Option<f64>, base_width: f64) -> Self {
        match pressure {
            Some(pressure) => Self::new(
                position.x,
                position.y,
                pressure,
                1.0 + pressure * base_width * 2.0,
            ),
            None => Self::new(position.x, position.y, SENTINEL_PRESSURE, base_width),
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn has_real_pressure(&self) -> bool {
        self.pressure <= 1.0
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Render color with the opacity baked in.
    pub color: String,
    /// Same color with alpha stripped, used for the cut pass.
    pub opaque_color: String,
    pub base_width: f64,
    pub opacity: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FontSnapshot {
    pub family: String,
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
}

impl FontSnapshot {
    /// CSS font shorthand.
    pub fn css(&self) -> String {
        let mut css = String::new();
        if self.italic {
            css.push_str("italic ");
        }
        if self.bold {
            css.push_str("bold ");
        }
        css.push_str(&format!("{}px {}", self.size, self.family));
        css
    }
}

/// Line spacing for a font size. Small fonts get proportionally more room.
pub fn line_height(font_size: f64) -> f64 {
    let font_size = font_size.max(1.0);
    if font_size < 20.0 {
        font_size * 1.5
    } else if font_size < 40.0 {
        font_size * 1.3
    } else {
        font_size * 1.15
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TextBlock {
    pub anchor: Vec2,
    pub text: String,
    pub font: FontSnapshot,
}

impl TextBlock {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    /// Each line with its vertical offset from the anchor.
    pub fn laid_out_lines(&self) -> impl Iterator<Item = (&str, f64)> {
        let step = line_height(self.font.size);
        self.lines()
            .enumerate()
            .map(move |(index, line)| (line, index as f64 * step))
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum ActionKind {
    Line { points: Vec<InkPoint> },
    PerfectLine { points: Vec<InkPoint> },
    Calligraphy { samples: Vec<Vec2> },
    Text(TextBlock),
    /// Indices into the history of the actions this erase gesture hid.
    Delete { hidden: Vec<usize> },
    Clear,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Action {
    pub style: StrokeStyle,
    pub visible: bool,
    pub kind: ActionKind,
}

impl Action {
    pub fn new(style: StrokeStyle, kind: ActionKind) -> Self {
        Self {
            style,
            visible: true,
            kind,
        }
    }

    fn marker(kind: ActionKind) -> Self {
        Self::new(
            StrokeStyle {
                color: String::new(),
                opaque_color: String::new(),
                base_width: 0.0,
                opacity: 0.0,
            },
            kind,
        )
    }

    pub fn clear_marker() -> Self {
        Self::marker(ActionKind::Clear)
    }

    pub fn delete_marker(hidden: Vec<usize>) -> Self {
        Self::marker(ActionKind::Delete { hidden })
    }

    pub fn is_clear(&self) -> bool {
        matches!(self.kind, ActionKind::Clear)
    }

    /// Positions the eraser can hit, if this action owns a point sequence.
    pub fn hit_path(&self) -> Option<Vec<Vec2>> {
        match &self.kind {
            ActionKind::Line { points } | ActionKind::PerfectLine { points } => {
                Some(points.iter().map(InkPoint::position).collect())
            }
            ActionKind::Calligraphy { samples } => Some(samples.clone()),
            ActionKind::Text(_) | ActionKind::Delete { .. } | ActionKind::Clear => None,
        }
    }

    /// Whether a finished gesture produced anything worth recording.
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            ActionKind::Line { points } | ActionKind::PerfectLine { points } => points.is_empty(),
            ActionKind::Calligraphy { samples } => samples.is_empty(),
            ActionKind::Text(block) => block.is_blank(),
            ActionKind::Delete { hidden } => hidden.is_empty(),
            ActionKind::Clear => false,
        }
    }

    pub fn label(&self) -> &'static str {
        match self.kind {
            ActionKind::Line { .. } => "line",
            ActionKind::PerfectLine { .. } => "perfect-line",
            ActionKind::Calligraphy { .. } => "calligraphy",
            ActionKind::Text(_) => "text",
            ActionKind::Delete { .. } => "delete",
            ActionKind::Clear => "clear",
        }
    }
}
