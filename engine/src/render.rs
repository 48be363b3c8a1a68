//! Replays history onto the main surface and draws live feedback onto the
//! guide surface.
//!
//! The main surface is persistent: each frame only the tail of the history
//! that has not been drawn yet is painted. Anything structural (an undo, a
//! delete, a clear, a resize) throws the cursor away and the next frame clears
//! the surface and replays from the most recent clear marker.

use std::f64::consts::PI;

use crate::action::{line_height, Action, ActionKind, InkPoint, StrokeStyle, TextBlock};
use crate::cache::{CachedGeometry, RenderCache};
use crate::calligraphy::CalligraphyStroke;
use crate::color::ERASER_GUIDE_COLOR;
use crate::config::EngineConfig;
use crate::error::RenderError;
use crate::freehand::{get_stroke, StrokeOptions};
use crate::geometry::{midpoint, svg_path_from_outline, Vec2};
use crate::history::History;
use crate::surface::{Composite, Surface};

const ERASER_GUIDE_WIDTH: f64 = 2.0;

/// Where the next incremental pass picks up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderCursor {
    /// History index of the first action not fully drawn. Equal to the
    /// history length when the in-progress line is being drawn.
    pub action: usize,
    /// First point of that action not drawn yet.
    pub point: usize,
}

/// A line still being captured. It is painted straight onto the main surface
/// as points arrive, at the index it will occupy once committed.
#[derive(Clone, Copy, Debug)]
pub struct LiveLine<'a> {
    pub style: &'a StrokeStyle,
    pub points: &'a [InkPoint],
}

/// Uncommitted gesture shown on the guide surface.
#[derive(Clone, Copy, Debug)]
pub enum LiveGesture<'a> {
    Freehand {
        style: &'a StrokeStyle,
        points: &'a [InkPoint],
    },
    Calligraphy {
        style: &'a StrokeStyle,
        samples: &'a [Vec2],
    },
    Eraser {
        path: &'a [Vec2],
    },
    Text {
        style: &'a StrokeStyle,
        block: &'a TextBlock,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
    pub stroke: StrokeOptions,
    pub curve_resolution: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl RenderSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            // Size is filled in per action from its own style.
            stroke: config.freehand_options(StrokeOptions::default().size, true),
            curve_resolution: config.tuning.curve_resolution,
        }
    }

    /// Freehand options for `points`. Pressure is simulated when the samples
    /// came from a device without real pressure.
    pub fn freehand(&self, points: &[InkPoint], size: f64, last: bool) -> StrokeOptions {
        StrokeOptions {
            size,
            last,
            simulate_pressure: points.first().is_some_and(|point| !point.has_real_pressure()),
            ..self.stroke
        }
    }
}

fn passes(style: &StrokeStyle) -> [(Composite, &str); 2] {
    [
        (Composite::DestinationOut, style.opaque_color.as_str()),
        (Composite::SourceOver, style.color.as_str()),
    ]
}

fn draw_line_segment(surface: &mut dyn Surface, style: &StrokeStyle, points: &[InkPoint], index: usize) {
    let current = points[index];
    if index == 0 {
        for (composite, color) in passes(style) {
            surface.set_composite(composite);
            surface.set_fill_style(color);
            surface.begin_path();
            surface.arc(current.x, current.y, current.render_width / 2.0, 0.0, PI * 2.0);
            surface.fill();
        }
        return;
    }
    let control = points[index - 1].position();
    let before = points[index.saturating_sub(2)].position();
    let start = midpoint(before, control);
    let end = midpoint(control, current.position());
    for (composite, color) in passes(style) {
        surface.set_composite(composite);
        surface.set_stroke_style(color);
        surface.set_round_lines();
        surface.set_line_width(current.render_width);
        surface.begin_path();
        surface.move_to(start.x, start.y);
        surface.quadratic_curve_to(control.x, control.y, end.x, end.y);
        surface.stroke();
    }
}

/// Draws the part of a line starting at point `from`. Drawing a line in
/// pieces emits exactly the same commands as drawing it in one go.
pub fn draw_line_points(surface: &mut dyn Surface, style: &StrokeStyle, points: &[InkPoint], from: usize) {
    for index in from..points.len() {
        draw_line_segment(surface, style, points, index);
    }
}

fn fill_path_twice(surface: &mut dyn Surface, style: &StrokeStyle, path: &str) -> Result<(), RenderError> {
    for (composite, color) in passes(style) {
        surface.set_composite(composite);
        surface.set_fill_style(color);
        surface.fill_svg_path(path)?;
    }
    Ok(())
}

fn draw_text(surface: &mut dyn Surface, style: &StrokeStyle, block: &TextBlock) -> Result<(), RenderError> {
    surface.set_font(&block.font.css());
    for (composite, color) in passes(style) {
        surface.set_composite(composite);
        surface.set_fill_style(color);
        for (line, offset) in block.laid_out_lines() {
            surface.fill_text(line, block.anchor.x, block.anchor.y + offset)?;
        }
    }
    Ok(())
}

fn perfect_outline(points: &[InkPoint], style: &StrokeStyle, settings: &RenderSettings) -> CachedGeometry {
    let options = settings.freehand(points, style.base_width, true);
    let outline = get_stroke(points, &options);
    let path = svg_path_from_outline(&outline);
    CachedGeometry::PerfectOutline { outline, path }
}

fn cached<'c>(
    cache: &'c mut RenderCache,
    index: usize,
    history_len: usize,
    want_outline: bool,
    compute: impl FnOnce() -> CachedGeometry,
) -> &'c CachedGeometry {
    let mismatched = cache
        .get(index)
        .is_some_and(|entry| matches!(entry, CachedGeometry::PerfectOutline { .. }) != want_outline);
    if mismatched {
        log::warn!("render cache entry {index} has the wrong kind, recomputing");
        cache.invalidate(index);
    }
    cache.get_or_compute(index, history_len, compute)
}

/// Draws one committed action. `from_point` skips already drawn points of a
/// line that is being continued.
pub fn draw_action(
    surface: &mut dyn Surface,
    action: &Action,
    index: usize,
    from_point: usize,
    history_len: usize,
    cache: &mut RenderCache,
    settings: &RenderSettings,
) -> Result<(), RenderError> {
    let style = &action.style;
    match &action.kind {
        ActionKind::Line { points } => {
            draw_line_points(surface, style, points, from_point);
            Ok(())
        }
        ActionKind::PerfectLine { points } => {
            let entry = cached(cache, index, history_len, true, || {
                perfect_outline(points, style, settings)
            });
            let CachedGeometry::PerfectOutline { path, .. } = entry else {
                return Err(RenderError::Empty { index });
            };
            if path.is_empty() {
                return Err(RenderError::Empty { index });
            }
            fill_path_twice(surface, style, path)
        }
        ActionKind::Calligraphy { samples } => {
            let entry = cached(cache, index, history_len, false, || {
                CachedGeometry::Calligraphy(CalligraphyStroke::fit(samples))
            });
            let CachedGeometry::Calligraphy(stroke) = entry else {
                return Err(RenderError::Empty { index });
            };
            for (composite, color) in passes(style) {
                surface.set_composite(composite);
                surface.set_fill_style(color);
                stroke.draw(surface, style.base_width, settings.curve_resolution);
            }
            Ok(())
        }
        ActionKind::Text(block) => draw_text(surface, style, block),
        ActionKind::Delete { .. } | ActionKind::Clear => Ok(()),
    }
}

fn is_structural(action: &Action) -> bool {
    matches!(action.kind, ActionKind::Delete { .. } | ActionKind::Clear)
}

/// One render pass over `history` (plus the line being captured, if any).
/// `None` or a cursor that no longer fits the history forces a full redraw
/// from the most recent clear marker. Returns the cursor for the next pass.
pub fn render_history(
    surface: &mut dyn Surface,
    history: &History,
    live: Option<LiveLine<'_>>,
    cache: &mut RenderCache,
    settings: &RenderSettings,
    cursor: Option<RenderCursor>,
) -> RenderCursor {
    let len = history.len();
    let actions = history.actions();
    let resume = cursor.filter(|cursor| {
        cursor.action <= len && !actions[cursor.action..].iter().any(is_structural)
    });
    let start = match resume {
        Some(cursor) => cursor,
        None => {
            surface.clear();
            RenderCursor {
                action: history.last_clear_index().unwrap_or(0),
                point: 0,
            }
        }
    };
    log::trace!(
        "render pass from {}:{} ({})",
        start.action,
        start.point,
        if resume.is_some() { "incremental" } else { "full" }
    );

    for (index, action) in actions.iter().enumerate().skip(start.action) {
        if !action.visible {
            continue;
        }
        let from_point = if index == start.action { start.point } else { 0 };
        if let Err(error) = draw_action(surface, action, index, from_point, len, cache, settings) {
            log::warn!("skipping {} at {index}: {error}", action.label());
        }
    }

    match live {
        Some(line) => {
            let from = if start.action == len { start.point } else { 0 };
            draw_line_points(surface, line.style, line.points, from);
            RenderCursor {
                action: len,
                point: line.points.len(),
            }
        }
        None => RenderCursor {
            action: len,
            point: 0,
        },
    }
}

/// Owns the main-surface cursor between frames.
#[derive(Clone, Debug)]
pub struct Renderer {
    cursor: RenderCursor,
    full_redraw: bool,
    settings: RenderSettings,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderSettings::default())
    }
}

impl Renderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            cursor: RenderCursor::default(),
            full_redraw: true,
            settings,
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: RenderSettings) {
        self.settings = settings;
        self.full_redraw = true;
    }

    pub fn request_full_redraw(&mut self) {
        self.full_redraw = true;
    }

    pub fn needs_full_redraw(&self) -> bool {
        self.full_redraw
    }

    pub fn cursor(&self) -> RenderCursor {
        self.cursor
    }

    pub fn frame(
        &mut self,
        surface: &mut dyn Surface,
        history: &History,
        live: Option<LiveLine<'_>>,
        cache: &mut RenderCache,
    ) {
        let cursor = (!self.full_redraw).then_some(self.cursor);
        self.cursor = render_history(surface, history, live, cache, &self.settings, cursor);
        self.full_redraw = false;
    }
}

/// Repaints the guide surface for an in-progress gesture. Guide strokes use
/// the alpha-stripped color; the host shows the guide layer at the pen's
/// opacity.
pub fn draw_live(
    surface: &mut dyn Surface,
    gesture: LiveGesture<'_>,
    settings: &RenderSettings,
) -> Result<(), RenderError> {
    surface.clear();
    surface.set_composite(Composite::SourceOver);
    match gesture {
        LiveGesture::Freehand { style, points } => {
            let options = settings.freehand(points, style.base_width, false);
            let path = svg_path_from_outline(&get_stroke(points, &options));
            if path.is_empty() {
                return Ok(());
            }
            surface.set_fill_style(&style.opaque_color);
            surface.fill_svg_path(&path)
        }
        LiveGesture::Calligraphy { style, samples } => {
            surface.set_fill_style(&style.opaque_color);
            CalligraphyStroke::fit(samples).draw(surface, style.base_width, settings.curve_resolution);
            Ok(())
        }
        LiveGesture::Eraser { path } => {
            let Some((first, rest)) = path.split_first() else {
                return Ok(());
            };
            surface.set_stroke_style(ERASER_GUIDE_COLOR);
            surface.set_fill_style(ERASER_GUIDE_COLOR);
            surface.set_round_lines();
            surface.set_line_width(ERASER_GUIDE_WIDTH);
            surface.begin_path();
            if rest.is_empty() {
                surface.arc(first.x, first.y, ERASER_GUIDE_WIDTH, 0.0, PI * 2.0);
                surface.fill();
                return Ok(());
            }
            surface.move_to(first.x, first.y);
            for point in rest {
                surface.line_to(point.x, point.y);
            }
            surface.stroke();
            Ok(())
        }
        LiveGesture::Text { style, block } => {
            surface.set_font(&block.font.css());
            surface.set_fill_style(&style.opaque_color);
            for (line, offset) in block.laid_out_lines() {
                surface.fill_text(line, block.anchor.x, block.anchor.y + offset)?;
            }
            // Caret down the left edge of the block.
            let height = line_height(block.font.size) * block.lines().count() as f64;
            surface.set_stroke_style(&style.opaque_color);
            surface.set_line_width(1.0);
            surface.begin_path();
            surface.move_to(block.anchor.x - 2.0, block.anchor.y - block.font.size);
            surface.line_to(block.anchor.x - 2.0, block.anchor.y - block.font.size + height);
            surface.stroke();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::FontSnapshot;
    use crate::surface::{DrawCommand, RecordingSurface};

    fn style() -> StrokeStyle {
        StrokeStyle {
            color: "rgba(0, 0, 0, 0.5)".to_string(),
            opaque_color: "rgba(0, 0, 0, 1)".to_string(),
            base_width: 2.0,
            opacity: 0.5,
        }
    }

    fn line(points: &[(f64, f64)]) -> Action {
        Action::new(
            style(),
            ActionKind::Line {
                points: points
                    .iter()
                    .map(|&(x, y)| InkPoint::new(x, y, 0.5, 2.0))
                    .collect(),
            },
        )
    }

    fn text(value: &str) -> Action {
        Action::new(
            style(),
            ActionKind::Text(TextBlock {
                anchor: Vec2::new(5.0, 30.0),
                text: value.to_string(),
                font: FontSnapshot {
                    family: "serif".to_string(),
                    size: 16.0,
                    bold: false,
                    italic: false,
                },
            }),
        )
    }

    #[test]
    fn segments_are_cut_then_painted() {
        let mut surface = RecordingSurface::new();
        let action = line(&[(0.0, 0.0), (10.0, 0.0)]);
        let ActionKind::Line { points } = &action.kind else {
            unreachable!();
        };
        draw_line_points(&mut surface, &action.style, points, 1);
        let composites: Vec<_> = surface
            .commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Composite(composite) => Some(*composite),
                _ => None,
            })
            .collect();
        assert_eq!(composites, vec![Composite::DestinationOut, Composite::SourceOver]);
        assert!(surface
            .commands
            .contains(&DrawCommand::QuadraticCurveTo(0.0, 0.0, 5.0, 0.0)));
    }

    #[test]
    fn full_pass_starts_at_last_clear() {
        let mut history = History::new();
        history.commit(line(&[(0.0, 0.0), (1.0, 1.0)]));
        history.add_clear_marker();
        history.commit(line(&[(5.0, 5.0)]));
        let mut surface = RecordingSurface::new();
        let mut cache = RenderCache::new();
        let cursor = render_history(&mut surface, &history, None, &mut cache, &RenderSettings::default(), None);
        assert_eq!(cursor, RenderCursor { action: 3, point: 0 });
        assert_eq!(surface.count(&DrawCommand::Arc(5.0, 5.0, 1.0)), 2);
        assert_eq!(surface.count(&DrawCommand::Arc(0.0, 0.0, 1.0)), 0);
    }

    #[test]
    fn incremental_pass_draws_only_new_actions() {
        let mut history = History::new();
        history.commit(line(&[(0.0, 0.0)]));
        let mut renderer = Renderer::new(RenderSettings::default());
        let mut cache = RenderCache::new();
        let mut surface = RecordingSurface::new();
        renderer.frame(&mut surface, &history, None, &mut cache);
        surface.take();

        history.commit(line(&[(9.0, 9.0)]));
        renderer.frame(&mut surface, &history, None, &mut cache);
        assert!(!surface.commands.contains(&DrawCommand::Clear));
        assert_eq!(surface.count(&DrawCommand::Arc(0.0, 0.0, 1.0)), 0);
        assert_eq!(surface.count(&DrawCommand::Arc(9.0, 9.0, 1.0)), 2);
    }

    #[test]
    fn delete_in_tail_forces_full_pass() {
        let mut history = History::new();
        history.commit(line(&[(0.0, 0.0)]));
        history.commit(line(&[(9.0, 9.0)]));
        let mut renderer = Renderer::new(RenderSettings::default());
        let mut cache = RenderCache::new();
        let mut surface = RecordingSurface::new();
        renderer.frame(&mut surface, &history, None, &mut cache);
        surface.take();

        history.commit(Action::new(style(), ActionKind::Delete { hidden: vec![0] }));
        renderer.frame(&mut surface, &history, None, &mut cache);
        assert_eq!(surface.commands.first(), Some(&DrawCommand::Clear));
        assert_eq!(surface.count(&DrawCommand::Arc(0.0, 0.0, 1.0)), 0);
        assert_eq!(surface.count(&DrawCommand::Arc(9.0, 9.0, 1.0)), 2);
    }

    #[test]
    fn failing_action_does_not_blank_the_frame() {
        let mut history = History::new();
        history.commit(text("broken"));
        history.commit(line(&[(3.0, 3.0)]));
        let mut surface = RecordingSurface {
            reject_text: true,
            ..RecordingSurface::default()
        };
        let mut cache = RenderCache::new();
        render_history(&mut surface, &history, None, &mut cache, &RenderSettings::default(), None);
        assert_eq!(surface.count(&DrawCommand::Arc(3.0, 3.0, 1.0)), 2);
    }

    #[test]
    fn text_lines_are_offset_by_line_height() {
        let mut surface = RecordingSurface::new();
        let mut cache = RenderCache::new();
        let action = text("a\nb");
        draw_action(&mut surface, &action, 0, 0, 1, &mut cache, &RenderSettings::default()).unwrap();
        let step = line_height(16.0);
        assert_eq!(surface.count(&DrawCommand::FillText("a".to_string(), 5.0, 30.0)), 2);
        assert_eq!(surface.count(&DrawCommand::FillText("b".to_string(), 5.0, 30.0 + step)), 2);
    }

    #[test]
    fn perfect_line_outline_is_cached() {
        let mut history = History::new();
        let points = (0..10)
            .map(|i| InkPoint::new(f64::from(i) * 4.0, 0.0, 2.0, 2.0))
            .collect();
        history.commit(Action::new(style(), ActionKind::PerfectLine { points }));
        let mut cache = RenderCache::new();
        let mut surface = RecordingSurface::new();
        render_history(&mut surface, &history, None, &mut cache, &RenderSettings::default(), None);
        assert!(cache.contains(0));
        assert_eq!(surface.count(&DrawCommand::Composite(Composite::DestinationOut)), 1);
    }

    #[test]
    fn eraser_guide_is_red() {
        let mut surface = RecordingSurface::new();
        let path = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0)];
        draw_live(&mut surface, LiveGesture::Eraser { path: &path }, &RenderSettings::default()).unwrap();
        assert!(surface
            .commands
            .contains(&DrawCommand::StrokeStyle(ERASER_GUIDE_COLOR.to_string())));
        assert!(surface.commands.contains(&DrawCommand::LineTo(10.0, 10.0)));
    }
}
