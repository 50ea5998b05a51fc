//! RGB24 colors and the two PICT color encodings.

/// A 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0x00, 0x00, 0x00);
    pub const WHITE: Self = Self::new(0xff, 0xff, 0xff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Resolve a legacy 32-bit indexed color code.
///
/// The classic palette has eight named entries; anything else maps to a
/// neutral light gray.
pub(crate) fn from_palette_code(code: u32) -> Color {
    match code {
        33 => Color::BLACK,
        30 => Color::WHITE,
        205 => Color::new(0xff, 0x00, 0x00),
        341 => Color::new(0x00, 0xff, 0x00),
        409 => Color::new(0x00, 0x00, 0xff),
        273 => Color::new(0x00, 0xff, 0xff),
        137 => Color::new(0xff, 0x00, 0xff),
        69 => Color::new(0xff, 0xff, 0x00),
        _ => Color::new(0xc0, 0xc0, 0xc0),
    }
}
