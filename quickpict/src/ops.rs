//! The opcode dispatch loop.
//!
//! Each opcode either mutates the graphics state or emits a drawing
//! command. Dispatch returns the number of operand bytes the opcode
//! occupies; the loop then seeks past them, so an opcode handler that
//! reads less than the declared size (comments, reserved opcodes,
//! oversized records) still leaves the stream positioned correctly. In
//! the extended framing operand sizes are rounded up to keep opcodes on
//! even offsets.

use log::{trace, warn};

use crate::color::{Color, from_palette_code};
use crate::error::{DecodeError, Result};
use crate::geom::{Point, Polygon, Rect, Size};
use crate::header::{Framing, Header};
use crate::pattern::Pattern;
use crate::pixmap::{PixmapLayout, read_pixmap};
use crate::reader::Reader;
use crate::state::{FaceFlags, FontFamily, GraphicsState, RasterOp, Verb, verb_of};
use crate::text::{read_pascal_string, read_text_run};
use crate::{DrawCommand, ShapeStyle};

pub(crate) struct Decoder<'a> {
    r: Reader<'a>,
    framing: Framing,
    frame: Rect,
    data_start: usize,
    state: GraphicsState,
    commands: Vec<DrawCommand>,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(data: &'a [u8], header: &Header) -> Self {
        let origin = Point::new(header.frame.left, header.frame.top);

        Self {
            r: Reader::new(data),
            framing: header.framing,
            frame: header.frame,
            data_start: header.data_start,
            state: GraphicsState::new(origin),
            commands: Vec::new(),
        }
    }

    /// Run the opcode loop to the end marker or the first error, then
    /// hand back whatever was decoded.
    pub(crate) fn decode_all(mut self) -> (Vec<DrawCommand>, usize, Option<DecodeError>) {
        let error = self.run().err();
        (self.commands, self.r.tell(), error)
    }

    fn run(&mut self) -> Result<()> {
        self.r.seek_abs(self.data_start)?;

        loop {
            let opcode = match self.framing {
                Framing::Legacy => u16::from(self.r.read_u8()?),
                Framing::Extended => self.r.read_u16()?,
            };
            if opcode == 0x00ff {
                return Ok(());
            }

            let operand_start = self.r.tell();
            let mut size = self.dispatch(opcode)?;
            if self.framing == Framing::Extended && size % 2 == 1 {
                size += 1;
            }
            self.r.seek_abs(operand_start + size)?;
        }
    }

    // Point and rectangle operands are stored y-first in frame
    // coordinates; reads translate them to the picture origin.

    fn read_point(&mut self) -> Result<Point> {
        let y = i32::from(self.r.read_i16()?);
        let x = i32::from(self.r.read_i16()?);
        Ok(Point::new(x - self.frame.left, y - self.frame.top))
    }

    fn read_size(&mut self) -> Result<Size> {
        let height = i32::from(self.r.read_i16()?);
        let width = i32::from(self.r.read_i16()?);
        Ok(Size::new(width, height))
    }

    fn read_rect(&mut self) -> Result<Rect> {
        let top_left = self.read_point()?;
        let bottom_right = self.read_point()?;
        Rect::from_corners(top_left, bottom_right)
    }

    /// A rectangle read that tolerates inverted bounds, used for region
    /// bounding boxes.
    fn read_raw_rect(&mut self) -> Result<Rect> {
        let top_left = self.read_point()?;
        let bottom_right = self.read_point()?;
        Ok(Rect::new(top_left.x, top_left.y, bottom_right.x, bottom_right.y))
    }

    fn read_rgb(&mut self) -> Result<Color> {
        let r = (self.r.read_u16()? >> 8) as u8;
        let g = (self.r.read_u16()? >> 8) as u8;
        let b = (self.r.read_u16()? >> 8) as u8;
        Ok(Color::new(r, g, b))
    }

    fn push_shape(&mut self, verb: Verb, make: impl FnOnce(ShapeStyle, Verb) -> DrawCommand) {
        if self.state.is_invisible(verb) {
            return;
        }
        let style = self.state.style_for(verb);
        self.commands.push(make(style, verb));
    }

    fn push_line(&mut self, from: Point, to: Point) {
        self.push_shape(Verb::Frame, |style, verb| DrawCommand::Line { from, to, verb, style });
        self.state.pen_position = to;
    }

    fn push_text(&mut self, text: String) {
        if self.state.drawing_disabled() {
            return;
        }
        self.commands.push(DrawCommand::Text {
            position: self.state.text_position,
            text,
            font: self.state.font.clone(),
            color: self.state.fore_color,
        });
    }

    /// Read a pixel pattern record. Type 1 embeds a raster whose mean
    /// color replaces the pattern; type 2 carries an explicit color.
    /// Returns the decoded pattern and the bytes consumed.
    fn read_pix_pattern(&mut self) -> Result<(Pattern, usize)> {
        let pattern_type = self.r.read_u16()?;
        let mut pattern = Pattern::default();
        match pattern_type {
            1 => {
                pattern.read(&mut self.r)?;
                let origin = Point::new(self.frame.left, self.frame.top);
                let layout = PixmapLayout { color_table: true, ..Default::default() };
                let (pix, consumed) = read_pixmap(&mut self.r, layout, origin)?;
                pattern.set_color(pix.image.average_color());
                Ok((pattern, 2 + 8 + consumed))
            }
            2 => {
                pattern.read(&mut self.r)?;
                let color = self.read_rgb()?;
                pattern.set_color(color);
                Ok((pattern, 2 + 8 + 6))
            }
            _ => Err(DecodeError::InvalidPattern),
        }
    }

    fn read_polygon(&mut self) -> Result<(Polygon, usize)> {
        let declared = usize::from(self.r.read_u16()?);
        // The bounding box is implied by the vertices.
        self.r.skip(8)?;

        let mut count = declared.saturating_sub(10) / 4;
        let available = self.r.remaining() / 4;
        if count > available {
            warn!("polygon claims {count} vertices but only {available} fit, clamping");
            count = available;
        }

        let mut polygon = Polygon::default();
        polygon.points.reserve(count);
        for _ in 0..count {
            polygon.points.push(self.read_point()?);
        }

        Ok((polygon, declared))
    }

    /// Blit records. The opcode decides which optional fields frame the
    /// raster data.
    fn read_blit(&mut self, layout: PixmapLayout) -> Result<usize> {
        let origin = Point::new(self.frame.left, self.frame.top);
        let (pix, consumed) = read_pixmap(&mut self.r, layout, origin)?;
        self.commands.push(DrawCommand::Bitmap {
            image: pix.image,
            src: pix.src.unwrap_or_default(),
            dst: pix.dst.unwrap_or_default(),
        });
        Ok(consumed)
    }

    /// Handle one opcode and return the size of its operand data. For
    /// records whose first field is a total size covering that field
    /// itself, the returned value is that total; the caller's seek is
    /// relative to the operand start either way.
    fn dispatch(&mut self, opcode: u16) -> Result<usize> {
        trace!("opcode {opcode:#06x} at {:#x}", self.r.tell());
        let verb = verb_of(opcode);

        match opcode {
            // NOP.
            0x00 => Ok(0),
            // Clip region: total size, then the bounding box.
            0x01 => {
                let total = usize::from(self.r.read_u16()?);
                let mut rect = self.read_rect()?;
                rect.right += 1;
                rect.bottom += 1;
                self.state.clip = Some(rect);
                Ok(total)
            }
            0x02 => self.state.back_pattern.read(&mut self.r),
            0x03 => {
                let id = self.r.read_u16()?;
                self.state.font.id = id;
                self.state.font.family = FontFamily::classify(id);
                Ok(2)
            }
            0x04 => {
                self.state.font.face = FaceFlags::from_bits_truncate(self.r.read_u8()?);
                Ok(1)
            }
            // Text transfer mode.
            0x05 => Ok(2),
            // Space extra.
            0x06 => Ok(4),
            0x07 => {
                self.state.pen_size = self.read_size()?;
                Ok(4)
            }
            0x08 => {
                self.state.raster_op = RasterOp::from_mode(self.r.read_u16()?);
                Ok(2)
            }
            0x09 => self.state.pen_pattern.read(&mut self.r),
            0x0a => self.state.fill_pattern.read(&mut self.r),
            0x0b => {
                self.state.oval_size = self.read_size()?;
                Ok(4)
            }
            // Origin offset, ignored.
            0x0c => Ok(4),
            0x0d => {
                self.state.font.size = self.r.read_u16()?;
                Ok(2)
            }
            0x0e => {
                self.state.fore_color = from_palette_code(self.r.read_u32()?);
                Ok(4)
            }
            0x0f => {
                self.state.back_color = from_palette_code(self.r.read_u32()?);
                Ok(4)
            }
            // Text ratio.
            0x10 => Ok(8),
            // In-stream version byte.
            0x11 => Ok(1),
            0x12 => {
                let (pattern, n) = self.read_pix_pattern()?;
                self.state.back_pattern = pattern;
                Ok(n)
            }
            0x13 => {
                let (pattern, n) = self.read_pix_pattern()?;
                self.state.pen_pattern = pattern;
                Ok(n)
            }
            0x14 => {
                let (pattern, n) = self.read_pix_pattern()?;
                self.state.fill_pattern = pattern;
                Ok(n)
            }
            // Fractional pen position, character extra.
            0x15 | 0x16 => Ok(2),
            0x17..=0x19 => Ok(0),
            0x1a => {
                self.state.fore_color = self.read_rgb()?;
                Ok(6)
            }
            0x1b => {
                self.state.back_color = self.read_rgb()?;
                Ok(6)
            }
            // Highlighting and opcolor, ignored.
            0x1c | 0x1e => Ok(0),
            0x1d | 0x1f => Ok(6),

            0x20 => {
                let from = self.read_point()?;
                let to = self.read_point()?;
                self.push_line(from, to);
                Ok(8)
            }
            0x21 => {
                let from = self.state.pen_position;
                let to = self.read_point()?;
                self.push_line(from, to);
                Ok(4)
            }
            0x22 => {
                let from = self.read_point()?;
                let dh = i32::from(self.r.read_i8()?);
                let dv = i32::from(self.r.read_i8()?);
                self.push_line(from, Point::new(from.x + dh, from.y + dv));
                Ok(6)
            }
            0x23 => {
                let from = self.state.pen_position;
                let dh = i32::from(self.r.read_i8()?);
                let dv = i32::from(self.r.read_i8()?);
                self.push_line(from, Point::new(from.x + dh, from.y + dv));
                Ok(2)
            }
            // Reserved text family.
            0x24..=0x27 => Ok(usize::from(self.r.read_u16()?) + 2),

            0x28 => {
                self.state.text_position = self.read_point()?;
                let (text, n) = read_text_run(&mut self.r)?;
                self.push_text(text);
                Ok(4 + n)
            }
            0x29 => {
                self.state.text_position.x += i32::from(self.r.read_u8()?);
                let (text, n) = read_text_run(&mut self.r)?;
                self.push_text(text);
                Ok(1 + n)
            }
            0x2a => {
                self.state.text_position.y += i32::from(self.r.read_u8()?);
                let (text, n) = read_text_run(&mut self.r)?;
                self.push_text(text);
                Ok(1 + n)
            }
            0x2b => {
                self.state.text_position.x += i32::from(self.r.read_u8()?);
                self.state.text_position.y += i32::from(self.r.read_u8()?);
                let (text, n) = read_text_run(&mut self.r)?;
                self.push_text(text);
                Ok(2 + n)
            }
            // Font by name: total size, numeric id, then the name.
            0x2c => {
                let total = usize::from(self.r.read_u16()?);
                let id = self.r.read_u16()?;
                self.state.font.id = id;
                self.state.font.family = FontFamily::classify(id);
                let (name, _) = read_pascal_string(&mut self.r)?;
                self.state.font.name = Some(name);
                Ok(total + 2)
            }
            // Line justification.
            0x2d => Ok(10),
            0x2e | 0x2f => Ok(usize::from(self.r.read_u16()?) + 2),

            0x30..=0x34 => {
                let rect = self.read_rect()?;
                self.state.last_rect = rect;
                self.push_shape(verb, |style, verb| DrawCommand::Rect { bounds: rect, verb, style });
                Ok(8)
            }
            0x35..=0x37 => Ok(8),
            0x38..=0x3c => {
                let rect = self.state.last_rect;
                self.push_shape(verb, |style, verb| DrawCommand::Rect { bounds: rect, verb, style });
                Ok(0)
            }
            0x3d..=0x3f => Ok(0),

            0x40..=0x44 => {
                let rect = self.read_rect()?;
                self.state.last_round_rect = rect;
                let corner = self.state.oval_size;
                self.push_shape(verb, |style, verb| DrawCommand::RoundRect {
                    bounds: rect,
                    corner,
                    verb,
                    style,
                });
                Ok(8)
            }
            0x45..=0x47 => Ok(8),
            0x48..=0x4c => {
                let rect = self.state.last_round_rect;
                let corner = self.state.oval_size;
                self.push_shape(verb, |style, verb| DrawCommand::RoundRect {
                    bounds: rect,
                    corner,
                    verb,
                    style,
                });
                Ok(0)
            }
            0x4d..=0x4f => Ok(0),

            0x50..=0x54 => {
                let rect = self.read_rect()?;
                self.state.last_oval = rect;
                self.push_shape(verb, |style, verb| DrawCommand::Oval { bounds: rect, verb, style });
                Ok(8)
            }
            0x55..=0x57 => Ok(8),
            0x58..=0x5c => {
                let rect = self.state.last_oval;
                self.push_shape(verb, |style, verb| DrawCommand::Oval { bounds: rect, verb, style });
                Ok(0)
            }
            0x5d..=0x5f => Ok(0),

            0x60..=0x64 => {
                let rect = self.read_rect()?;
                self.state.last_arc_rect = rect;
                let (start, sweep) = self.read_angles()?;
                self.push_shape(verb, |style, verb| DrawCommand::Arc {
                    bounds: rect,
                    start_angle: start,
                    sweep_angle: sweep,
                    verb,
                    style,
                });
                Ok(12)
            }
            0x65..=0x67 => Ok(12),
            0x68..=0x6c => {
                // Angles are present even when nothing gets drawn.
                let rect = self.state.last_arc_rect;
                let (start, sweep) = self.read_angles()?;
                self.push_shape(verb, |style, verb| DrawCommand::Arc {
                    bounds: rect,
                    start_angle: start,
                    sweep_angle: sweep,
                    verb,
                    style,
                });
                Ok(4)
            }
            0x6d..=0x6f => Ok(4),

            0x70..=0x74 => {
                let (polygon, total) = self.read_polygon()?;
                self.state.last_polygon = polygon.clone();
                self.push_shape(verb, |style, verb| DrawCommand::Polygon { polygon, verb, style });
                Ok(total)
            }
            0x75..=0x77 => Ok(usize::from(self.r.read_u16()?)),
            0x78..=0x7c => {
                let polygon = self.state.last_polygon.clone();
                self.push_shape(verb, |style, verb| DrawCommand::Polygon { polygon, verb, style });
                Ok(0)
            }
            0x7d..=0x7f => Ok(0),

            0x80..=0x84 => {
                let total = usize::from(self.r.read_u16()?);
                if total >= 10 {
                    // Only the bounding box of the region is kept; the
                    // scanline runs after it are skipped by the seek.
                    let bounds = self.read_raw_rect()?;
                    self.state.last_region = bounds;
                    self.push_shape(verb, |style, verb| DrawCommand::Region { bounds, verb, style });
                }
                Ok(total)
            }
            0x85..=0x87 => Ok(usize::from(self.r.read_u16()?)),
            0x88..=0x8c => {
                let bounds = self.state.last_region;
                self.push_shape(verb, |style, verb| DrawCommand::Region { bounds, verb, style });
                Ok(0)
            }
            0x8d..=0x8f => Ok(0),

            // Raster blits: copyBits with and without a mask region.
            0x90 | 0x98 => self.read_blit(PixmapLayout {
                color_table: true,
                src_rect: true,
                dst_rect: true,
                mode: true,
                ..Default::default()
            }),
            0x91 | 0x99 => self.read_blit(PixmapLayout {
                color_table: true,
                src_rect: true,
                dst_rect: true,
                mode: true,
                mask_region: true,
                ..Default::default()
            }),
            0x9a => self.read_blit(PixmapLayout {
                base_addr: true,
                src_rect: true,
                dst_rect: true,
                mode: true,
                ..Default::default()
            }),
            0x9b => self.read_blit(PixmapLayout {
                base_addr: true,
                src_rect: true,
                dst_rect: true,
                mode: true,
                mask_region: true,
                ..Default::default()
            }),
            0x92..=0x97 | 0x9c..=0x9f => Ok(usize::from(self.r.read_u16()?) + 2),

            // Short comment.
            0xa0 => Ok(2),
            // Long comment: kind, then a sized payload.
            0xa1 => {
                self.r.skip(2)?;
                let n = usize::from(self.r.read_u16()?);
                Ok(4 + n)
            }

            // Everything else only needs its size skipped. The ranges
            // follow the opcode map's size categories.
            0xa2..=0xaf => Ok(usize::from(self.r.read_u16()?) + 2),
            0xb0..=0xcf => Ok(0),
            0xd0..=0xfe => Ok(self.r.read_u32()? as usize + 4),
            0x0100..=0x01ff => Ok(2),
            0x0200..=0x0bfe => Ok(4),
            0x0bff => Ok(22),
            0x0c00..=0x7eff => Ok(24),
            0x7f00..=0x7fff => Ok(254),
            0x8000..=0x80ff => Ok(0),
            _ => Ok(self.r.read_u32()? as usize + 4),
        }
    }

    /// Arc angles, normalized so the sweep is non-negative.
    fn read_angles(&mut self) -> Result<(i32, i32)> {
        let mut start = i32::from(self.r.read_i16()?);
        let mut sweep = i32::from(self.r.read_i16()?);
        if sweep < 0 {
            start += sweep;
            sweep = -sweep;
        }
        Ok((start, sweep))
    }
}
