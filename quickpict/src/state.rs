//! The mutable graphics state threaded through the decode loop.

use crate::color::Color;
use crate::geom::{Point, Polygon, Rect, Size};
use crate::pattern::Pattern;
use bitflags::bitflags;

/// The transfer mode drawing operates under.
///
/// The wire encoding maps `mode % 8` onto the eight QuickDraw source
/// modes; mode 23 is a private sentinel that switches the interpreter
/// into a pass-through mode in which nothing is drawn at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RasterOp {
    #[default]
    Copy,
    Or,
    Xor,
    Bic,
    NotCopy,
    NotOr,
    NotXor,
    NotBic,
    /// Drawing disabled (the "postscript" escape hatch).
    PassThrough,
}

impl RasterOp {
    pub(crate) fn from_mode(mode: u16) -> Self {
        if mode == 23 {
            return Self::PassThrough;
        }

        match mode & 7 {
            0 => Self::Copy,
            1 => Self::Or,
            2 => Self::Xor,
            3 => Self::Bic,
            4 => Self::NotCopy,
            5 => Self::NotOr,
            6 => Self::NotXor,
            _ => Self::NotBic,
        }
    }
}

/// How a shape opcode applies the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Outline with the pen. Skipped entirely while the pen size is empty.
    Frame,
    /// Fill with the pen pattern.
    Paint,
    /// Fill with the background pattern.
    Erase,
    /// Invert the covered pixels.
    Invert,
    /// Fill with the dedicated fill pattern, always in plain copy mode.
    Fill,
}

/// The verb encoded in the low bits of a shape opcode.
///
/// Only meaningful for the shape opcode families, where the low three bits
/// of the tag run 0..=4 over the five verbs.
pub(crate) fn verb_of(opcode: u16) -> Verb {
    match opcode & 7 {
        0 => Verb::Frame,
        1 => Verb::Paint,
        2 => Verb::Erase,
        3 => Verb::Invert,
        _ => Verb::Fill,
    }
}

bitflags! {
    /// Style bits from the text-face opcode. A face byte fully replaces
    /// the previous flags; a clear bit clears the attribute.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FaceFlags: u8 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const OUTLINE = 1 << 3;
        const SHADOW = 1 << 4;
    }
}

/// The coarse family class a legacy font id maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontFamily {
    #[default]
    Swiss,
    Roman,
    Modern,
    Decorative,
}

impl FontFamily {
    /// Classify a legacy font id into a family.
    pub(crate) fn classify(id: u16) -> Self {
        match id {
            0..=1 => Self::Swiss,
            2..=12 => Self::Decorative,
            13..=20 => Self::Roman,
            21 => Self::Swiss,
            22 => Self::Modern,
            23..=1023 => Self::Swiss,
            _ => Self::Roman,
        }
    }
}

/// The font attributes text runs are emitted with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontState {
    pub family: FontFamily,
    pub id: u16,
    pub size: u16,
    pub face: FaceFlags,
    pub name: Option<String>,
}

impl Default for FontState {
    fn default() -> Self {
        Self {
            family: FontFamily::Swiss,
            id: 0,
            size: 12,
            face: FaceFlags::empty(),
            name: None,
        }
    }
}

/// A snapshot of the state a shape command was emitted under.
///
/// Commands capture what they need at emission time; the graphics state
/// keeps mutating afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeStyle {
    /// The resolved drawing color.
    pub color: Color,
    /// The transfer mode in effect.
    pub op: RasterOp,
    /// The pen size, relevant for framed shapes and lines.
    pub pen_size: Size,
    /// The clip rectangle active at emission time, if any.
    pub clip: Option<Rect>,
}

/// The decode-time graphics state. One instance per decode call, owned
/// exclusively by the decode loop; state-change opcodes mutate it in
/// place and shape opcodes consume it.
#[derive(Debug, Clone)]
pub(crate) struct GraphicsState {
    pub pen_position: Point,
    pub text_position: Point,
    pub fore_color: Color,
    pub back_color: Color,
    pub pen_pattern: Pattern,
    pub fill_pattern: Pattern,
    pub back_pattern: Pattern,
    pub pen_size: Size,
    pub raster_op: RasterOp,
    pub oval_size: Size,
    pub clip: Option<Rect>,
    pub font: FontState,

    // The "same shape as last time" opcodes reuse these slots.
    pub last_rect: Rect,
    pub last_round_rect: Rect,
    pub last_oval: Rect,
    pub last_polygon: Polygon,
    pub last_arc_rect: Rect,
    pub last_region: Rect,
}

impl GraphicsState {
    /// Initial state for a decode whose picture frame starts at the given
    /// origin. Pen and text positions start at the translated origin.
    pub(crate) fn new(origin: Point) -> Self {
        let start = Point::new(-origin.x, -origin.y);

        Self {
            pen_position: start,
            text_position: start,
            fore_color: Color::BLACK,
            back_color: Color::WHITE,
            pen_pattern: Pattern::default(),
            fill_pattern: Pattern::default(),
            back_pattern: Pattern::default(),
            pen_size: Size::new(1, 1),
            raster_op: RasterOp::Copy,
            oval_size: Size::new(1, 1),
            clip: None,
            font: FontState::default(),
            last_rect: Rect::default(),
            last_round_rect: Rect::default(),
            last_oval: Rect::default(),
            last_polygon: Polygon::default(),
            last_arc_rect: Rect::default(),
            last_region: Rect::default(),
        }
    }

    /// Whether drawing is globally disabled by the pass-through mode.
    pub(crate) fn drawing_disabled(&self) -> bool {
        self.raster_op == RasterOp::PassThrough
    }

    /// Whether a shape drawn with this verb would be invisible and can be
    /// skipped (its operand bytes are still consumed by the caller).
    pub(crate) fn is_invisible(&self, verb: Verb) -> bool {
        self.drawing_disabled() || (verb == Verb::Frame && self.pen_size.is_empty())
    }

    /// Resolve the style snapshot a shape emitted with this verb carries.
    pub(crate) fn style_for(&self, verb: Verb) -> ShapeStyle {
        let (color, op) = match verb {
            Verb::Frame | Verb::Paint => (
                self.pen_pattern.resolve(self.back_color, self.fore_color),
                self.raster_op,
            ),
            Verb::Erase => (
                self.back_pattern.resolve(Color::BLACK, self.back_color),
                RasterOp::Copy,
            ),
            Verb::Invert => (Color::BLACK, RasterOp::NotCopy),
            Verb::Fill => (
                self.fill_pattern.resolve(self.back_color, self.fore_color),
                RasterOp::Copy,
            ),
        };

        ShapeStyle {
            color,
            op,
            pen_size: self.pen_size,
            clip: self.clip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_op_mapping() {
        assert_eq!(RasterOp::from_mode(0), RasterOp::Copy);
        assert_eq!(RasterOp::from_mode(2), RasterOp::Xor);
        assert_eq!(RasterOp::from_mode(7), RasterOp::NotBic);
        // Modes wrap modulo eight...
        assert_eq!(RasterOp::from_mode(8), RasterOp::Copy);
        assert_eq!(RasterOp::from_mode(34), RasterOp::Xor);
        // ...except the pass-through sentinel.
        assert_eq!(RasterOp::from_mode(23), RasterOp::PassThrough);
    }

    #[test]
    fn family_classification() {
        assert_eq!(FontFamily::classify(0), FontFamily::Swiss);
        assert_eq!(FontFamily::classify(1), FontFamily::Swiss);
        assert_eq!(FontFamily::classify(5), FontFamily::Decorative);
        assert_eq!(FontFamily::classify(20), FontFamily::Roman);
        assert_eq!(FontFamily::classify(21), FontFamily::Swiss);
        assert_eq!(FontFamily::classify(22), FontFamily::Modern);
        assert_eq!(FontFamily::classify(1023), FontFamily::Swiss);
        assert_eq!(FontFamily::classify(1024), FontFamily::Roman);
    }

    #[test]
    fn frame_with_empty_pen_is_invisible() {
        let mut state = GraphicsState::new(Point::default());
        state.pen_size = Size::new(0, 0);
        assert!(state.is_invisible(Verb::Frame));
        assert!(!state.is_invisible(Verb::Paint));
    }

    #[test]
    fn pass_through_disables_all_verbs() {
        let mut state = GraphicsState::new(Point::default());
        state.raster_op = RasterOp::PassThrough;
        for verb in [Verb::Frame, Verb::Paint, Verb::Erase, Verb::Invert, Verb::Fill] {
            assert!(state.is_invisible(verb));
        }
    }

    #[test]
    fn erase_uses_background_and_copy() {
        let mut state = GraphicsState::new(Point::default());
        state.back_color = Color::new(9, 9, 9);
        state.raster_op = RasterOp::Xor;

        let style = state.style_for(Verb::Erase);
        assert_eq!(style.color, Color::new(9, 9, 9));
        assert_eq!(style.op, RasterOp::Copy);

        // Paint keeps the live raster op.
        assert_eq!(state.style_for(Verb::Paint).op, RasterOp::Xor);
    }
}
