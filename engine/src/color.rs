use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

pub const DEFAULT_COLOR: &str = "#1f1f1f";
pub const ERASER_GUIDE_COLOR: &str = "red";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub fn with_opacity(self, opacity: f64) -> Rgba {
        let opacity = if opacity.is_finite() { opacity } else { 1.0 };
        Rgba {
            a: (self.a * opacity).clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn opaque(self) -> Rgba {
        Rgba { a: 1.0, ..self }
    }
}

impl FromStr for Rgba {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(value.to_string());
        let hex = value.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        let short = |index: usize| channel(index..index + 1).map(|value| value * 17);
        match hex.len() {
            3 => Ok(Rgba {
                r: short(0)?,
                g: short(1)?,
                b: short(2)?,
                a: 1.0,
            }),
            6 | 8 => Ok(Rgba {
                r: channel(0..2)?,
                g: channel(2..4)?,
                b: channel(4..6)?,
                a: if hex.len() == 8 {
                    f64::from(channel(6..8)?) / 255.0
                } else {
                    1.0
                },
            }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alpha = (self.a * 1000.0).round() / 1000.0;
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
    }
}

/// Resolves a hex color and an opacity into the render color and the
/// alpha-stripped color used for cut passes and guide feedback.
pub fn resolve(hex: &str, opacity: f64) -> (String, String) {
    let base = hex.parse::<Rgba>().unwrap_or_else(|error| {
        log::warn!("{error}, falling back to {DEFAULT_COLOR}");
        Rgba {
            r: 0x1f,
            g: 0x1f,
            b: 0x1f,
            a: 1.0,
        }
    });
    (
        base.with_opacity(opacity).to_string(),
        base.opaque().to_string(),
    )
}
