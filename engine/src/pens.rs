use serde::{Deserialize, Serialize};

use crate::action::StrokeStyle;
use crate::color;
use crate::error::ConfigError;

pub const PEN_SLOTS: usize = 4;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Pen {
    pub color: String,
    pub width: f64,
    pub opacity: f64,
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            color: "#272828".to_string(),
            width: 4.0,
            opacity: 0.7,
        }
    }
}

impl Pen {
    fn preset(color: &str, width: f64, opacity: f64) -> Self {
        Self {
            color: color.to_string(),
            width,
            opacity,
        }
    }

    pub fn style(&self) -> StrokeStyle {
        let opacity = self.opacity.clamp(0.0, 1.0);
        let (render, opaque) = color::resolve(&self.color, opacity);
        StrokeStyle {
            color: render,
            opaque_color: opaque,
            base_width: self.width.max(0.1),
            opacity,
        }
    }
}

pub fn default_pens() -> [Pen; PEN_SLOTS] {
    [
        Pen::default(),
        Pen::preset("#d32f2f", 4.0, 0.8),
        Pen::preset("#1565c0", 4.0, 0.8),
        Pen::preset("#fdd835", 16.0, 0.35),
    ]
}

/// The four pen presets and which one is in use. Flattened into the host
/// configuration as `pens` and `activePen`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PenProfiles {
    pens: [Pen; PEN_SLOTS],
    #[serde(rename = "activePen")]
    active: usize,
}

impl Default for PenProfiles {
    fn default() -> Self {
        Self::new(default_pens(), 0)
    }
}

impl PenProfiles {
    pub fn new(pens: [Pen; PEN_SLOTS], active: usize) -> Self {
        Self {
            pens,
            active: active.min(PEN_SLOTS - 1),
        }
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &Pen {
        &self.pens[self.active]
    }

    pub fn pens(&self) -> &[Pen; PEN_SLOTS] {
        &self.pens
    }

    pub fn select(&mut self, slot: usize) -> Result<(), ConfigError> {
        if slot >= PEN_SLOTS {
            return Err(ConfigError::PenSlot(slot));
        }
        log::debug!("pen {} selected", slot + 1);
        self.active = slot;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.active >= PEN_SLOTS {
            return Err(ConfigError::PenSlot(self.active));
        }
        Ok(())
    }

    pub fn pen_mut(&mut self, slot: usize) -> Result<&mut Pen, ConfigError> {
        self.pens.get_mut(slot).ok_or(ConfigError::PenSlot(slot))
    }

    /// Snapshot of the active pen, stamped onto every new action.
    pub fn style(&self) -> StrokeStyle {
        self.active().style()
    }
}
