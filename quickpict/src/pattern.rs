//! QuickDraw fill patterns, reduced to a replacement color.

use crate::color::Color;
use crate::error::Result;
use crate::reader::Reader;

/// An 8×8 monochrome pattern, kept only as the information this decoder
/// needs: how many of its 64 bits are set, or an explicit replacement
/// color for the extended pixel patterns.
///
/// A freshly constructed pattern is "unset" until a `read` populates it;
/// unset patterns resolve to the plain foreground color.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pattern {
    /// Number of set bits, 0..=64.
    bits_set: u8,
    /// Replacement color from a pixel pattern, if any.
    color: Option<Color>,
    /// Whether the pattern came from the stream or is still the default.
    is_read: bool,
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            bits_set: 64,
            color: None,
            is_read: false,
        }
    }
}

impl Pattern {
    /// Read the classic 8-byte bitmap form. Returns the bytes consumed.
    pub(crate) fn read(&mut self, r: &mut Reader<'_>) -> Result<usize> {
        let bytes = r.read_bytes(8)?;
        self.bits_set = bytes.iter().map(|b| b.count_ones() as u8).sum();
        self.color = None;
        self.is_read = true;

        Ok(8)
    }

    /// Replace the pattern with an explicit color.
    pub(crate) fn set_color(&mut self, color: Color) {
        self.color = Some(color);
    }

    pub(crate) fn is_default(&self) -> bool {
        !self.is_read
    }

    /// The color this pattern approximates, given the current background
    /// and foreground.
    ///
    /// Classic patterns interpolate each channel between background (no
    /// bits set) and foreground (all 64 bits set); explicit-color patterns
    /// return their color unchanged.
    pub(crate) fn resolve(&self, bg: Color, fg: Color) -> Color {
        if let Some(color) = self.color {
            return color;
        }
        if self.is_default() {
            return fg;
        }

        let alpha = f64::from(self.bits_set) / 64.0;
        let mix = |b: u8, f: u8| (alpha * f64::from(f) + (1.0 - alpha) * f64::from(b)) as u8;

        Color::new(mix(bg.r, fg.r), mix(bg.g, fg.g), mix(bg.b, fg.b))
    }
}
