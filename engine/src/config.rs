use serde::{Deserialize, Serialize};

use crate::action::FontSnapshot;
use crate::color::Rgba;
use crate::error::ConfigError;
use crate::freehand::{Easing, StrokeOptions, TaperOptions};
use crate::pens::PenProfiles;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ToolbarCorner {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolbarConfig {
    pub corner: ToolbarCorner,
    pub x_offset: f64,
    pub y_offset: f64,
    pub vertical: bool,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self {
            corner: ToolbarCorner::TopRight,
            x_offset: 2.0,
            y_offset: 2.0,
            vertical: true,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FontConfig {
    pub family: String,
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "Arial".to_string(),
            size: 20.0,
            bold: false,
            italic: false,
        }
    }
}

impl FontConfig {
    pub fn snapshot(&self) -> FontSnapshot {
        FontSnapshot {
            family: self.family.clone(),
            size: self.size.max(1.0),
            bold: self.bold,
            italic: self.italic,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasBox {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasBox {
    fn default() -> Self {
        Self {
            width: 500.0,
            height: 500.0,
        }
    }
}

/// Stroke tuning knobs. None of them are load-bearing; they only shape how
/// strokes look.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Tuning {
    pub thinning: f64,
    pub smoothing: f64,
    pub streamline: f64,
    pub easing: Easing,
    /// Calligraphy and eraser samples closer than this to the previous one
    /// are dropped.
    pub min_move_distance: f64,
    pub calligraphy_weight: f64,
    /// Curve length between nib cross-sections.
    pub curve_resolution: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            thinning: 0.6,
            smoothing: 0.5,
            streamline: 0.5,
            easing: Easing::EaseOutSine,
            min_move_distance: 5.0,
            calligraphy_weight: 15.0,
            curve_resolution: 4.0,
        }
    }
}

/// Snapshot of everything the host configures, as sent in its JSON blob.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    #[serde(flatten)]
    pub pens: PenProfiles,
    pub pressure_sensitive: bool,
    pub small_canvas: CanvasBox,
    pub small_canvas_enabled: bool,
    pub background_color: String,
    pub toolbar: ToolbarConfig,
    pub auto_hide: bool,
    pub auto_hide_pointer: bool,
    pub zen_mode: bool,
    pub follow_scroll: bool,
    pub font: FontConfig,
    /// Legacy: render never-moving freehand strokes as round dots.
    pub convert_dot_strokes: bool,
    pub enabled: bool,
    pub log_level: String,
    pub tuning: Tuning,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pens: PenProfiles::default(),
            pressure_sensitive: true,
            small_canvas: CanvasBox::default(),
            small_canvas_enabled: false,
            background_color: "#FFFFFF00".to_string(),
            toolbar: ToolbarConfig::default(),
            auto_hide: true,
            auto_hide_pointer: true,
            zen_mode: false,
            follow_scroll: false,
            font: FontConfig::default(),
            convert_dot_strokes: true,
            enabled: true,
            log_level: "info".to_string(),
            tuning: Tuning::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.pens.validate()?;
        Ok(config)
    }

    pub fn log_level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }

    /// Freehand options for a stroke drawn with `size`. `last` closes the tip
    /// once the gesture is committed.
    pub fn freehand_options(&self, size: f64, last: bool) -> StrokeOptions {
        let defaults = StrokeOptions::default();
        StrokeOptions {
            size,
            thinning: self.tuning.thinning,
            smoothing: self.tuning.smoothing,
            streamline: self.tuning.streamline,
            easing: self.tuning.easing,
            start: TaperOptions {
                cap: true,
                ..defaults.start
            },
            end: TaperOptions {
                cap: true,
                ..defaults.end
            },
            last,
            convert_dot_strokes: self.convert_dot_strokes,
            ..defaults
        }
    }
}

/// What the engine has to do after a runtime update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateEffect {
    None,
    Redraw,
    Resize,
}

/// A single parameter change pushed by the host, e.g.
/// `{"param":"penColor","slot":1,"value":"#ff0000"}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "param", rename_all = "camelCase")]
pub enum ConfigUpdate {
    PenColor { slot: usize, value: String },
    PenWidth { slot: usize, value: f64 },
    PenOpacity { slot: usize, value: f64 },
    ActivePen { value: usize },
    PressureSensitive { value: bool },
    FontFamily { value: String },
    FontSize { value: f64 },
    FontBold { value: bool },
    FontItalic { value: bool },
    BackgroundColor { value: String },
    SmallCanvas { width: f64, height: f64 },
    SmallCanvasEnabled { value: bool },
    FollowScroll { value: bool },
    ZenMode { value: bool },
    ConvertDotStrokes { value: bool },
    Tuning(Tuning),
}

impl ConfigUpdate {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Applies the change. Never touches drawing history.
    pub fn apply(self, config: &mut EngineConfig) -> Result<UpdateEffect, ConfigError> {
        let effect = match self {
            ConfigUpdate::PenColor { slot, value } => {
                value.parse::<Rgba>()?;
                config.pens.pen_mut(slot)?.color = value;
                UpdateEffect::Redraw
            }
            ConfigUpdate::PenWidth { slot, value } => {
                config.pens.pen_mut(slot)?.width = value;
                UpdateEffect::Redraw
            }
            ConfigUpdate::PenOpacity { slot, value } => {
                config.pens.pen_mut(slot)?.opacity = value.clamp(0.0, 1.0);
                UpdateEffect::Redraw
            }
            ConfigUpdate::ActivePen { value } => {
                config.pens.select(value)?;
                UpdateEffect::Redraw
            }
            ConfigUpdate::PressureSensitive { value } => {
                config.pressure_sensitive = value;
                UpdateEffect::None
            }
            ConfigUpdate::FontFamily { value } => {
                config.font.family = value;
                UpdateEffect::None
            }
            ConfigUpdate::FontSize { value } => {
                config.font.size = value;
                UpdateEffect::None
            }
            ConfigUpdate::FontBold { value } => {
                config.font.bold = value;
                UpdateEffect::None
            }
            ConfigUpdate::FontItalic { value } => {
                config.font.italic = value;
                UpdateEffect::None
            }
            ConfigUpdate::BackgroundColor { value } => {
                config.background_color = value;
                UpdateEffect::None
            }
            ConfigUpdate::SmallCanvas { width, height } => {
                config.small_canvas = CanvasBox { width, height };
                UpdateEffect::Resize
            }
            ConfigUpdate::SmallCanvasEnabled { value } => {
                config.small_canvas_enabled = value;
                UpdateEffect::Resize
            }
            ConfigUpdate::FollowScroll { value } => {
                config.follow_scroll = value;
                UpdateEffect::Resize
            }
            ConfigUpdate::ZenMode { value } => {
                config.zen_mode = value;
                UpdateEffect::None
            }
            ConfigUpdate::ConvertDotStrokes { value } => {
                config.convert_dot_strokes = value;
                UpdateEffect::Redraw
            }
            ConfigUpdate::Tuning(tuning) => {
                config.tuning = tuning;
                UpdateEffect::Redraw
            }
        };
        Ok(effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.tuning.min_move_distance, 5.0);
    }

    #[test]
    fn reads_pens_and_active_slot() {
        let config = EngineConfig::from_json(
            r##"{"activePen":2,"pens":[{"color":"#000"},{},{"width":9},{}],"smallCanvasEnabled":true}"##,
        )
        .unwrap();
        assert_eq!(config.pens.active_index(), 2);
        assert_eq!(config.pens.active().width, 9.0);
        assert_eq!(config.pens.pens()[0].color, "#000");
        assert!(config.small_canvas_enabled);
    }

    #[test]
    fn rejects_bad_active_pen() {
        let error = EngineConfig::from_json(r#"{"activePen":7}"#).unwrap_err();
        assert!(matches!(error, ConfigError::PenSlot(7)));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            EngineConfig::from_json("{"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn applies_tagged_updates() {
        let mut config = EngineConfig::default();
        let update = ConfigUpdate::from_json(r##"{"param":"penColor","slot":1,"value":"#ff0000"}"##).unwrap();
        assert_eq!(update.apply(&mut config).unwrap(), UpdateEffect::Redraw);
        assert_eq!(config.pens.pens()[1].color, "#ff0000");

        let update = ConfigUpdate::from_json(r#"{"param":"smallCanvas","width":300,"height":200}"#).unwrap();
        assert_eq!(update.apply(&mut config).unwrap(), UpdateEffect::Resize);
        assert_eq!(config.small_canvas.width, 300.0);

        let update = ConfigUpdate::FontSize { value: 32.0 };
        assert_eq!(update.apply(&mut config).unwrap(), UpdateEffect::None);
        assert_eq!(config.font.snapshot().size, 32.0);
    }

    #[test]
    fn bad_updates_leave_config_alone() {
        let mut config = EngineConfig::default();
        let before = config.clone();
        assert!(ConfigUpdate::PenColor {
            slot: 0,
            value: "blue".to_string()
        }
        .apply(&mut config)
        .is_err());
        assert!(ConfigUpdate::PenWidth { slot: 4, value: 3.0 }
            .apply(&mut config)
            .is_err());
        assert_eq!(config, before);
    }

    #[test]
    fn freehand_options_follow_tuning() {
        let config = EngineConfig::default();
        let options = config.freehand_options(4.0, true);
        assert_eq!(options.size, 4.0);
        assert_eq!(options.thinning, 0.6);
        assert_eq!(options.easing, Easing::EaseOutSine);
        assert!(options.last);
    }
}
