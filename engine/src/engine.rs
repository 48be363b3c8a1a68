use std::str::FromStr;

use crate::action::{Action, ActionKind, FontSnapshot, StrokeStyle};
use crate::cache::RenderCache;
use crate::config::{ConfigUpdate, EngineConfig, UpdateEffect};
use crate::error::{ConfigError, EngineError};
use crate::history::History;
use crate::input::{CaptureSettings, InputRouter, PointerInput, TextKeyOutcome, Tool};
use crate::render::{draw_live, RenderSettings, Renderer};
use crate::surface::Surface;

/// Named operations the host binds to keys and buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Undo,
    Redo,
    /// Soft clear: appends a clear marker, undoable.
    Clear,
    HardClear,
    ToggleVisibility,
    ToggleStrokeDelete,
    HoldStrokeDelete,
    ReleaseStrokeDelete,
    ToggleCalligraphy,
    TogglePerfectFreehand,
    ToggleSmallCanvas,
    ToggleTextWriting,
    /// Zero-based pen slot.
    SelectPen(usize),
    Redraw,
}

impl FromStr for Command {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let command = match value {
            "undo" => Command::Undo,
            "redo" => Command::Redo,
            "clear" => Command::Clear,
            "hard-clear" => Command::HardClear,
            "toggle-visibility" => Command::ToggleVisibility,
            "toggle-stroke-delete" => Command::ToggleStrokeDelete,
            "hold-stroke-delete" => Command::HoldStrokeDelete,
            "release-stroke-delete" => Command::ReleaseStrokeDelete,
            "toggle-calligraphy" => Command::ToggleCalligraphy,
            "toggle-perfect-freehand" => Command::TogglePerfectFreehand,
            "toggle-small-canvas" => Command::ToggleSmallCanvas,
            "toggle-text-writing" => Command::ToggleTextWriting,
            "redraw" => Command::Redraw,
            other => {
                let slot = other
                    .strip_prefix("select-pen-")
                    .and_then(|slot| slot.parse::<usize>().ok())
                    .filter(|slot| (1..=4).contains(slot))
                    .ok_or_else(|| ConfigError::UnknownCommand(other.to_string()))?;
                Command::SelectPen(slot - 1)
            }
        };
        Ok(command)
    }
}

/// Page metrics the canvas size is derived from, in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub client_width: f64,
    pub client_height: f64,
    pub content_width: f64,
    pub content_height: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasSize {
    /// CSS size.
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            dpr: 1.0,
        }
    }
}

impl CanvasSize {
    pub fn backing_width(&self) -> u32 {
        (self.width * self.dpr).round().max(0.0) as u32
    }

    pub fn backing_height(&self) -> u32 {
        (self.height * self.dpr).round().max(0.0) as u32
    }
}

/// Styles derived from the active pen, refreshed whenever the pen or the
/// configuration changes.
#[derive(Clone, Debug)]
struct Brush {
    line: StrokeStyle,
    calligraphy: StrokeStyle,
    font: FontSnapshot,
}

impl Brush {
    fn from_config(config: &EngineConfig) -> Self {
        let line = config.pens.style();
        let calligraphy = StrokeStyle {
            base_width: config.tuning.calligraphy_weight,
            ..line.clone()
        };
        Self {
            line,
            calligraphy,
            font: config.font.snapshot(),
        }
    }

    fn capture<'a>(&'a self, config: &EngineConfig, tool: Tool) -> CaptureSettings<'a> {
        CaptureSettings {
            style: match tool {
                Tool::Calligraphy => &self.calligraphy,
                _ => &self.line,
            },
            font: &self.font,
            pressure_sensitive: config.pressure_sensitive,
            min_move_distance: config.tuning.min_move_distance,
        }
    }
}

/// The whole annotation layer: history, render state and input routing for
/// one pair of main and guide surfaces.
pub struct DrawingEngine {
    config: EngineConfig,
    history: History,
    cache: RenderCache,
    renderer: Renderer,
    router: InputRouter,
    brush: Brush,
    visible: bool,
    size: CanvasSize,
    guide_dirty: bool,
}

impl Default for DrawingEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl DrawingEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            renderer: Renderer::new(RenderSettings::from_config(&config)),
            brush: Brush::from_config(&config),
            visible: config.enabled,
            config,
            history: History::new(),
            cache: RenderCache::new(),
            router: InputRouter::new(),
            size: CanvasSize::default(),
            guide_dirty: true,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(EngineConfig::from_json(json)?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    pub fn router(&self) -> &InputRouter {
        &self.router
    }

    pub fn tool(&self) -> Tool {
        self.router.tool()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn has_content(&self) -> bool {
        self.history.has_content()
    }

    pub fn size(&self) -> CanvasSize {
        self.size
    }

    /// Opacity the host should give the guide layer, which is drawn with
    /// alpha-stripped colors.
    pub fn guide_opacity(&self) -> f64 {
        self.brush.line.opacity
    }

    pub fn execute(&mut self, command: Command) -> Result<UpdateEffect, EngineError> {
        log::debug!("command {command:?}");
        match command {
            Command::Undo => self.undo(),
            Command::Redo => self.redo(),
            Command::Clear => self.clear(),
            Command::HardClear => self.hard_clear(),
            Command::ToggleVisibility => self.toggle_visibility(),
            Command::ToggleStrokeDelete => self.toggle(Tool::StrokeDelete),
            Command::HoldStrokeDelete => {
                let committed = self.router.begin_hold_delete();
                self.commit(committed);
                self.guide_dirty = true;
            }
            Command::ReleaseStrokeDelete => {
                let reach = self.config.tuning.min_move_distance;
                let committed = self.router.end_hold_delete(&self.history, reach);
                self.commit(committed);
                self.guide_dirty = true;
            }
            Command::ToggleCalligraphy => self.toggle(Tool::Calligraphy),
            Command::TogglePerfectFreehand => self.toggle(Tool::PerfectFreehand),
            Command::ToggleTextWriting => self.toggle(Tool::TextWriting),
            Command::ToggleSmallCanvas => {
                self.stop_capture();
                self.config.small_canvas_enabled = !self.config.small_canvas_enabled;
                return Ok(UpdateEffect::Resize);
            }
            Command::SelectPen(slot) => self.select_pen(slot)?,
            Command::Redraw => self.renderer.request_full_redraw(),
        }
        Ok(UpdateEffect::Redraw)
    }

    pub fn execute_named(&mut self, name: &str) -> Result<UpdateEffect, EngineError> {
        let command = name.parse::<Command>()?;
        self.execute(command)
    }

    fn commit(&mut self, action: Option<Action>) {
        let Some(action) = action else {
            return;
        };
        let label = action.label();
        let structural = matches!(action.kind, ActionKind::Delete { .. });
        if let Some(index) = self.history.commit(action) {
            log::debug!("committed {label} at {index}");
            if structural {
                self.renderer.request_full_redraw();
            }
        }
        self.guide_dirty = true;
    }

    fn stop_capture(&mut self) {
        let committed = self.router.stop_capture();
        self.commit(committed);
        self.guide_dirty = true;
        // A discarded line may already be on the main surface.
        self.renderer.request_full_redraw();
    }

    pub fn undo(&mut self) {
        self.stop_capture();
        if let Some(index) = self.history.undo() {
            self.cache.invalidate(index);
        }
        self.renderer.request_full_redraw();
    }

    pub fn redo(&mut self) {
        self.stop_capture();
        if let Some(index) = self.history.redo() {
            self.cache.invalidate(index);
        }
        self.renderer.request_full_redraw();
    }

    pub fn clear(&mut self) {
        self.stop_capture();
        if self.history.add_clear_marker() {
            self.renderer.request_full_redraw();
        }
    }

    pub fn hard_clear(&mut self) {
        self.stop_capture();
        self.history.hard_clear();
        self.cache.clear();
        self.renderer.request_full_redraw();
    }

    pub fn toggle_visibility(&mut self) {
        self.stop_capture();
        self.visible = !self.visible;
        log::debug!("drawing layer visible: {}", self.visible);
    }

    pub fn toggle(&mut self, tool: Tool) {
        let committed = self.router.toggle(tool);
        self.commit(committed);
        self.brush = Brush::from_config(&self.config);
        self.guide_dirty = true;
        self.renderer.request_full_redraw();
    }

    pub fn select_pen(&mut self, slot: usize) -> Result<(), ConfigError> {
        self.config.pens.select(slot)?;
        self.refresh();
        Ok(())
    }

    /// Applies a single runtime parameter change without touching history.
    pub fn apply_update(&mut self, update: ConfigUpdate) -> Result<UpdateEffect, ConfigError> {
        let effect = update.apply(&mut self.config)?;
        if effect == UpdateEffect::Redraw {
            self.refresh();
        } else {
            self.brush = Brush::from_config(&self.config);
        }
        Ok(effect)
    }

    fn refresh(&mut self) {
        self.brush = Brush::from_config(&self.config);
        let settings = RenderSettings::from_config(&self.config);
        if &settings != self.renderer.settings() {
            // Cached outlines were built with the old stroke options.
            self.cache.clear();
            self.renderer.set_settings(settings);
        }
        self.renderer.request_full_redraw();
        self.guide_dirty = true;
    }

    pub fn pointer_down(&mut self, input: &PointerInput) {
        if !self.visible {
            return;
        }
        let tool = self.router.tool();
        let settings = self.brush.capture(&self.config, tool);
        let committed = self.router.pointer_down(input, &settings);
        self.commit(committed);
        self.guide_dirty = true;
    }

    pub fn pointer_move(&mut self, input: &PointerInput) {
        if !self.visible {
            return;
        }
        let tool = self.router.tool();
        let settings = self.brush.capture(&self.config, tool);
        if self.router.pointer_move(input, &settings) {
            self.guide_dirty = true;
        }
    }

    /// Window-level release; `input` is `None` when the position is unknown.
    pub fn pointer_up(&mut self, input: Option<&PointerInput>) {
        let tool = self.router.tool();
        let settings = self.brush.capture(&self.config, tool);
        let committed = self.router.pointer_up(input, &settings, &self.history);
        self.commit(committed);
        self.guide_dirty = true;
    }

    pub fn finish_delete(&mut self) {
        let reach = self.config.tuning.min_move_distance;
        let committed = self.router.finish_delete(&self.history, reach);
        self.commit(committed);
        self.guide_dirty = true;
    }

    pub fn text_changed(&mut self, value: &str) {
        if self.router.text_changed(value) {
            self.guide_dirty = true;
        }
    }

    /// Returns whether the host should suppress the key.
    pub fn text_key(&mut self, key: &str) -> bool {
        let TextKeyOutcome { suppress, committed } = self.router.text_key(key);
        if committed.is_some() {
            self.commit(committed);
        }
        suppress
    }

    pub fn text_blur(&mut self) {
        let committed = self.router.text_blur();
        self.commit(committed);
    }

    /// Box the surfaces should occupy for the current page metrics.
    pub fn canvas_size(&self, viewport: Viewport, dpr: f64) -> CanvasSize {
        let (width, height) = if self.config.small_canvas_enabled {
            (
                viewport.client_width.min(self.config.small_canvas.width),
                viewport.client_height.min(self.config.small_canvas.height),
            )
        } else if self.config.follow_scroll {
            (viewport.client_width - 1.0, viewport.client_height - 1.0)
        } else {
            (
                viewport.content_width.max(viewport.client_width),
                viewport.content_height.max(viewport.client_height),
            )
        };
        CanvasSize {
            width: width.max(0.0),
            height: height.max(0.0),
            dpr: if dpr > 0.0 { dpr } else { 1.0 },
        }
    }

    /// Records a new surface size. Resizing wipes the surfaces, so everything
    /// is drawn again.
    pub fn resize(&mut self, width: f64, height: f64, dpr: f64) {
        self.size = CanvasSize { width, height, dpr };
        log::debug!("resized to {width}x{height} @{dpr}");
        self.renderer.request_full_redraw();
        self.guide_dirty = true;
    }

    /// One animation frame.
    pub fn frame(&mut self, main: &mut dyn Surface, guide: &mut dyn Surface) {
        if !self.visible {
            return;
        }
        self.renderer
            .frame(main, &self.history, self.router.live_line(), &mut self.cache);
        if !self.guide_dirty {
            return;
        }
        self.guide_dirty = false;
        match self.router.live_gesture() {
            Some(gesture) => {
                if let Err(error) = draw_live(guide, gesture, self.renderer.settings()) {
                    log::warn!("guide feedback skipped: {error}");
                }
            }
            None => guide.clear(),
        }
    }
}
