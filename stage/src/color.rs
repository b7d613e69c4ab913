//! RGBA colors and the pixel-sampling summary returned by `get_image_data`.

#[cfg(test)]
#[path = "color_test.rs"]
mod color_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// 8-bit-per-channel RGBA color. Alpha 255 is opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// `#rrggbb`, two lowercase hex digits per channel. Alpha is not encoded.
    #[must_use]
    pub fn to_hex(self) -> String {
        rgb_to_hex(self.r, self.g, self.b)
    }

    /// Parse `#rgb`, `#rrggbb`, or `#rrggbbaa` (leading `#` optional).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] for any other shape or a non-hex digit.
    pub fn from_hex(raw: &str) -> Result<Self, EngineError> {
        let digits = raw.trim().trim_start_matches('#');
        let bad = || EngineError::Configuration(format!("invalid hex color: {raw}"));
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| bad());

        match digits.len() {
            3 => {
                let mut out = [0u8; 3];
                for (slot, ch) in out.iter_mut().zip(digits.chars()) {
                    let nibble = ch.to_digit(16).ok_or_else(bad)?;
                    // 0xf -> 0xff
                    *slot = u8::try_from(nibble * 17).map_err(|_| bad())?;
                }
                Ok(Self::rgb(out[0], out[1], out[2]))
            }
            6 | 8 => {
                let r = channel(digits.get(0..2).ok_or_else(bad)?)?;
                let g = channel(digits.get(2..4).ok_or_else(bad)?)?;
                let b = channel(digits.get(4..6).ok_or_else(bad)?)?;
                let a = match digits.get(6..8) {
                    Some(s) => channel(s)?,
                    None => 255,
                };
                Ok(Self::rgba(r, g, b, a))
            }
            _ => Err(bad()),
        }
    }

    /// CSS `rgba(...)` string for the browser backend.
    #[must_use]
    pub fn to_css(self) -> String {
        format!("rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, f64::from(self.a) / 255.0)
    }

    #[must_use]
    pub fn channels(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Simplified view of a pixel region read back from a surface.
///
/// Channel values and `hex` come from the first pixel of the region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelSample {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
    pub width: u32,
    pub height: u32,
    pub hex: String,
}

impl PixelSample {
    /// Reduce raw RGBA bytes (row-major, 4 bytes per pixel) to a sample.
    ///
    /// An empty region yields all-zero channels and `#000000`.
    #[must_use]
    pub fn from_rgba(data: &[u8], width: u32, height: u32) -> Self {
        let px = |i: usize| data.get(i).copied().unwrap_or(0);
        let (red, green, blue, alpha) = (px(0), px(1), px(2), px(3));
        Self { red, green, blue, alpha, width, height, hex: rgb_to_hex(red, green, blue) }
    }

    #[must_use]
    pub fn color(&self) -> Color {
        Color::rgba(self.red, self.green, self.blue, self.alpha)
    }
}
