use crate::error::RenderError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Composite {
    SourceOver,
    /// Cuts whatever is underneath instead of painting over it.
    DestinationOut,
}

impl Composite {
    pub fn as_str(self) -> &'static str {
        match self {
            Composite::SourceOver => "source-over",
            Composite::DestinationOut => "destination-out",
        }
    }
}

/// The 2D raster operations the renderer needs. Mirrors the subset of
/// `CanvasRenderingContext2d` in use, so the browser implementation is a thin
/// forwarding layer.
pub trait Surface {
    fn clear(&mut self);
    fn set_composite(&mut self, composite: Composite);
    fn set_stroke_style(&mut self, color: &str);
    fn set_fill_style(&mut self, color: &str);
    fn set_line_width(&mut self, width: f64);
    /// Round caps and joins for freehand lines.
    fn set_round_lines(&mut self);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64);
    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64);
    fn close_path(&mut self);
    fn stroke(&mut self);
    fn fill(&mut self);
    fn fill_svg_path(&mut self, data: &str) -> Result<(), RenderError>;
    fn set_font(&mut self, css: &str);
    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), RenderError>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear,
    Composite(Composite),
    StrokeStyle(String),
    FillStyle(String),
    LineWidth(f64),
    RoundLines,
    BeginPath,
    MoveTo(f64, f64),
    LineTo(f64, f64),
    QuadraticCurveTo(f64, f64, f64, f64),
    BezierCurveTo(f64, f64, f64, f64, f64, f64),
    Arc(f64, f64, f64),
    ClosePath,
    Stroke,
    Fill,
    FillPath(String),
    Font(String),
    FillText(String, f64, f64),
}

/// Surface that records every call. Used by tests and by hosts that want the
/// command stream instead of pixels.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
    /// Makes `fill_text` fail, for exercising per-action error handling.
    pub reject_text: bool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Commands since the most recent `Clear`.
    pub fn visible(&self) -> &[DrawCommand] {
        let start = self
            .commands
            .iter()
            .rposition(|command| *command == DrawCommand::Clear)
            .map_or(0, |index| index + 1);
        &self.commands[start..]
    }

    pub fn count(&self, wanted: &DrawCommand) -> usize {
        self.commands.iter().filter(|command| *command == wanted).count()
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn set_composite(&mut self, composite: Composite) {
        self.commands.push(DrawCommand::Composite(composite));
    }

    fn set_stroke_style(&mut self, color: &str) {
        self.commands.push(DrawCommand::StrokeStyle(color.to_string()));
    }

    fn set_fill_style(&mut self, color: &str) {
        self.commands.push(DrawCommand::FillStyle(color.to_string()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.commands.push(DrawCommand::LineWidth(width));
    }

    fn set_round_lines(&mut self) {
        self.commands.push(DrawCommand::RoundLines);
    }

    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCommand::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.commands.push(DrawCommand::LineTo(x, y));
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.commands
            .push(DrawCommand::QuadraticCurveTo(cpx, cpy, x, y));
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.commands
            .push(DrawCommand::BezierCurveTo(cp1x, cp1y, cp2x, cp2y, x, y));
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, _start: f64, _end: f64) {
        self.commands.push(DrawCommand::Arc(x, y, radius));
    }

    fn close_path(&mut self) {
        self.commands.push(DrawCommand::ClosePath);
    }

    fn stroke(&mut self) {
        self.commands.push(DrawCommand::Stroke);
    }

    fn fill(&mut self) {
        self.commands.push(DrawCommand::Fill);
    }

    fn fill_svg_path(&mut self, data: &str) -> Result<(), RenderError> {
        if data.is_empty() {
            return Err(RenderError::Path("empty path data".to_string()));
        }
        self.commands.push(DrawCommand::FillPath(data.to_string()));
        Ok(())
    }

    fn set_font(&mut self, css: &str) {
        self.commands.push(DrawCommand::Font(css.to_string()));
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), RenderError> {
        if self.reject_text {
            return Err(RenderError::Text(text.to_string()));
        }
        self.commands
            .push(DrawCommand::FillText(text.to_string(), x, y));
        Ok(())
    }
}
