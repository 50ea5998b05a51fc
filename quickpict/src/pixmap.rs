//! Decoding of embedded Bitmap/PixMap raster records.
//!
//! A raster record carries its own little header (row stride, bounds and,
//! for the color form, a pixel format block and color table), optionally
//! followed by source/destination rectangles and a transfer mode, then the
//! pixel rows. Rows are stored literally or PackBits-compressed. Every
//! size field is cross-checked against the remaining input before it is
//! used as an allocation size or loop bound.

use crate::color::Color;
use crate::error::{DecodeError, Result};
use crate::geom::{Point, Rect};
use crate::reader::Reader;

/// A decoded raster image, normalized to RGB24 row-major regardless of
/// the source pixel depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
    /// Pixel data, three bytes per pixel, row-major order.
    pub data: Vec<u8>,
}

impl RasterImage {
    fn new(width: u16, height: u16) -> Self {
        let data = vec![0; usize::from(width) * usize::from(height) * 3];
        Self { width, height, data }
    }

    #[inline]
    fn set_pixel(&mut self, x: u16, y: u16, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (usize::from(y) * usize::from(self.width) + usize::from(x)) * 3;
        self.data[i] = color.r;
        self.data[i + 1] = color.g;
        self.data[i + 2] = color.b;
    }

    /// Get the pixel at (x, y). Out-of-range coordinates read as black.
    #[inline]
    pub fn pixel(&self, x: u16, y: u16) -> Color {
        if x >= self.width || y >= self.height {
            return Color::BLACK;
        }
        let i = (usize::from(y) * usize::from(self.width) + usize::from(x)) * 3;
        Color::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    /// The mean color over all pixels, used to approximate pixel patterns.
    pub(crate) fn average_color(&self) -> Color {
        let pixels = self.data.len() / 3;
        if pixels == 0 {
            return Color::BLACK;
        }

        let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
        for chunk in self.data.chunks_exact(3) {
            r += u64::from(chunk[0]);
            g += u64::from(chunk[1]);
            b += u64::from(chunk[2]);
        }
        let n = pixels as u64;

        Color::new((r / n) as u8, (g / n) as u8, (b / n) as u8)
    }
}

/// Which optional fields surround a raster record. The calling opcode,
/// not the record itself, decides what is present.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PixmapLayout {
    pub base_addr: bool,
    pub color_table: bool,
    pub src_rect: bool,
    pub dst_rect: bool,
    pub mode: bool,
    pub mask_region: bool,
}

/// A fully decoded raster record.
#[derive(Debug, Clone)]
pub(crate) struct DecodedPixmap {
    pub image: RasterImage,
    pub src: Option<Rect>,
    pub dst: Option<Rect>,
}

/// Decode one raster record. Returns the record and the total number of
/// bytes consumed from the reader.
///
/// `origin` is the picture frame's top-left corner; destination
/// rectangles are stored in frame coordinates and get translated by it.
pub(crate) fn read_pixmap(
    r: &mut Reader<'_>,
    layout: PixmapLayout,
    origin: Point,
) -> Result<(DecodedPixmap, usize)> {
    let start = r.tell();

    if layout.base_addr {
        r.skip(4)?;
    }

    let stride_flags = r.read_u16()?;
    let bnd_top = r.read_u16()?;
    let bnd_left = r.read_u16()?;
    let bnd_bottom = r.read_u16()?;
    let bnd_right = r.read_u16()?;
    if bnd_top >= bnd_bottom || bnd_left >= bnd_right {
        return Err(DecodeError::MalformedGeometry);
    }
    let height = bnd_bottom - bnd_top;
    let width = bnd_right - bnd_left;

    let is_pixmap = stride_flags & 0x8000 != 0;
    let row_bytes = stride_flags & 0x3fff;

    let mut pack_type = 0u16;
    let mut pixel_size = 1u16;
    let mut cmp_count = 1u16;
    let palette;

    if is_pixmap {
        let _version = r.read_u16()?;
        pack_type = r.read_u16()?;
        // Pack size, then two fixed-point resolutions.
        r.skip(12)?;
        let _pixel_type = r.read_u16()?;
        pixel_size = r.read_u16()?;
        cmp_count = r.read_u16()?;
        let _cmp_size = r.read_u16()?;
        // Plane bytes plus the color-table handle.
        r.skip(12)?;

        palette = if layout.color_table {
            read_color_table(r)?
        } else {
            Vec::new()
        };
    } else {
        // Plain one-bit bitmap with an implied black/white table.
        palette = vec![Color::WHITE, Color::BLACK];
    }

    let src = if layout.src_rect {
        let top = r.read_u16()?;
        let left = r.read_u16()?;
        let bottom = r.read_u16()?;
        let right = r.read_u16()?;
        Some(Rect::new(
            i32::from(left),
            i32::from(top),
            i32::from(right),
            i32::from(bottom),
        ))
    } else {
        None
    };

    let dst = if layout.dst_rect {
        let tl = read_frame_point(r, origin)?;
        let br = read_frame_point(r, origin)?;
        Some(Rect::new(tl.x, tl.y, br.x, br.y))
    } else {
        None
    };

    if layout.mode {
        r.skip(2)?;
    }

    if layout.mask_region {
        let size = r.read_u16()?;
        if size < 2 {
            return Err(DecodeError::OutOfData);
        }
        r.skip(usize::from(size) - 2)?;
    }

    let image = match pixel_size {
        1 | 2 | 4 | 8 => decode_indexed(r, width, height, row_bytes, pack_type, pixel_size, &palette)?,
        16 => decode_16(r, width, height, row_bytes, pack_type)?,
        32 => decode_32(r, width, height, row_bytes, pack_type, cmp_count)?,
        _ => return Err(DecodeError::UnsupportedRasterDepth),
    };

    let consumed = r.tell() - start;
    Ok((DecodedPixmap { image, src, dst }, consumed))
}

fn read_color_table(r: &mut Reader<'_>) -> Result<Vec<Color>> {
    // Table seed and flags are ignored.
    r.skip(6)?;
    let last = r.read_u16()?;
    if last > 255 {
        return Err(DecodeError::OversizedColorTable);
    }

    let n = usize::from(last) + 1;
    let mut palette = Vec::with_capacity(n);
    for _ in 0..n {
        // Entry index, then three 16-bit channels of which only the top
        // byte survives.
        r.skip(2)?;
        let red = r.read_u8()?;
        r.skip(1)?;
        let green = r.read_u8()?;
        r.skip(1)?;
        let blue = r.read_u8()?;
        r.skip(1)?;
        palette.push(Color::new(red, green, blue));
    }

    Ok(palette)
}

fn read_frame_point(r: &mut Reader<'_>, origin: Point) -> Result<Point> {
    let y = i32::from(r.read_i16()?);
    let x = i32::from(r.read_i16()?);
    Ok(Point::new(x - origin.x, y - origin.y))
}

#[inline]
fn palette_color(palette: &[Color], index: usize) -> Color {
    palette.get(index).copied().unwrap_or(Color::BLACK)
}

/// Write the pixels packed into one data byte, most significant group
/// first, stopping at the row width.
fn set_packed_byte(
    image: &mut RasterImage,
    x: &mut u16,
    y: u16,
    pixel_size: u16,
    dat: u8,
    palette: &[Color],
) {
    let per_byte = 8 / pixel_size;
    let mask = (1u16 << pixel_size) - 1;

    for i in 0..per_byte {
        if *x >= image.width {
            break;
        }
        let shift = (per_byte - 1 - i) * pixel_size;
        let index = (u16::from(dat) >> shift) & mask;
        image.set_pixel(*x, y, palette_color(palette, usize::from(index)));
        *x += 1;
    }
}

/// Whether rows of this record are stored literally rather than packed.
fn rows_are_literal(row_bytes: u16, pack_type: u16) -> bool {
    row_bytes < 8 || pack_type == 1
}

/// Read the per-row packed byte count. Records with wide rows use a
/// 16-bit count. The returned count includes the count field itself.
fn read_row_byte_count(r: &mut Reader<'_>, row_bytes: u16) -> Result<usize> {
    if row_bytes > 250 {
        Ok(usize::from(r.read_u16()?) + 2)
    } else {
        Ok(usize::from(r.read_u8()?) + 1)
    }
}

/// Guard against rows that cannot possibly fit in the remaining input.
fn check_row_budget(r: &Reader<'_>, height: u16, row_bytes: u16, pack_type: u16) -> Result<()> {
    let per_row = if rows_are_literal(row_bytes, pack_type) {
        usize::from(row_bytes)
    } else if row_bytes > 250 {
        2
    } else {
        1
    };
    if per_row == 0 || usize::from(height) > r.remaining() / per_row {
        return Err(DecodeError::OutOfData);
    }

    Ok(())
}

fn decode_indexed(
    r: &mut Reader<'_>,
    width: u16,
    height: u16,
    row_bytes: u16,
    pack_type: u16,
    pixel_size: u16,
    palette: &[Color],
) -> Result<RasterImage> {
    // Stride math in usize: a claimed width near u16::MAX must reject
    // cleanly, not overflow.
    let width_px = usize::from(width);
    let src_bpl = match pixel_size {
        1 => (width_px + 7) >> 3,
        2 => (width_px + 3) >> 2,
        4 => (width_px + 1) >> 1,
        _ => width_px,
    };
    let dst_bpl = (src_bpl + 3) & !3;
    if row_bytes == 0 || usize::from(row_bytes) < src_bpl || usize::from(row_bytes) > dst_bpl {
        return Err(DecodeError::InconsistentRowStride);
    }

    check_row_budget(r, height, row_bytes, pack_type)?;

    let mut image = RasterImage::new(width, height);

    for y in 0..height {
        let mut x = 0u16;
        if rows_are_literal(row_bytes, pack_type) {
            for byte in r.read_bytes(usize::from(row_bytes))? {
                if x < width {
                    set_packed_byte(&mut image, &mut x, y, pixel_size, *byte, palette);
                }
            }
        } else {
            let byte_count = read_row_byte_count(r, row_bytes)?;
            let row_start = r.tell();
            let row_end = row_start + byte_count
                - if row_bytes > 250 { 2 } else { 1 };

            while r.tell() < row_end {
                let ctl = r.read_u8()?;
                if ctl & 0x80 == 0 {
                    let count = usize::from(ctl) + 1;
                    if r.tell() + count > row_end {
                        return Err(DecodeError::OutOfData);
                    }
                    for _ in 0..count {
                        let dat = r.read_u8()?;
                        if x < width {
                            set_packed_byte(&mut image, &mut x, y, pixel_size, dat, palette);
                        }
                    }
                } else {
                    let count = 257 - usize::from(ctl);
                    let dat = r.read_u8()?;
                    for _ in 0..count {
                        if x < width {
                            set_packed_byte(&mut image, &mut x, y, pixel_size, dat, palette);
                        }
                    }
                }
            }
            r.seek_abs(row_end)?;
        }
    }

    Ok(image)
}

#[inline]
fn expand_555(d: u16) -> Color {
    // The historical cheap 5-to-8-bit expansion, kept bit-exact.
    Color::new((d >> 7) as u8, (d >> 2) as u8, (d << 3) as u8)
}

fn decode_16(
    r: &mut Reader<'_>,
    width: u16,
    height: u16,
    row_bytes: u16,
    pack_type: u16,
) -> Result<RasterImage> {
    if width > row_bytes / 2 {
        return Err(DecodeError::InconsistentRowStride);
    }

    check_row_budget(r, height, row_bytes, pack_type)?;

    let mut image = RasterImage::new(width, height);

    for y in 0..height {
        let mut x = 0u16;
        if rows_are_literal(row_bytes, pack_type) {
            for _ in 0..width {
                let d = r.read_u16()?;
                image.set_pixel(x, y, expand_555(d));
                x += 1;
            }
        } else {
            let row_start = r.tell();
            let byte_count = read_row_byte_count(r, row_bytes)?;

            while x != width {
                let ctl = r.read_u8()?;
                if ctl & 0x80 == 0 {
                    let mut count = u16::from(ctl) + 1;
                    count = count.min(width - x);
                    if r.remaining() < 2 * usize::from(count) {
                        return Err(DecodeError::OutOfData);
                    }
                    for _ in 0..count {
                        let d = r.read_u16()?;
                        image.set_pixel(x, y, expand_555(d));
                        x += 1;
                    }
                } else {
                    let mut count = 257 - u16::from(ctl);
                    count = count.min(width - x);
                    let color = expand_555(r.read_u16()?);
                    for _ in 0..count {
                        image.set_pixel(x, y, color);
                        x += 1;
                    }
                }
            }
            r.seek_abs(row_start + byte_count)?;
        }
    }

    Ok(image)
}

fn decode_32(
    r: &mut Reader<'_>,
    width: u16,
    height: u16,
    row_bytes: u16,
    pack_type: u16,
    cmp_count: u16,
) -> Result<RasterImage> {
    if u32::from(row_bytes) != 4 * u32::from(width) {
        return Err(DecodeError::InconsistentRowStride);
    }

    if rows_are_literal(row_bytes, pack_type) || pack_type == 2 {
        let bytes_per_pixel = if pack_type == 2 && !rows_are_literal(row_bytes, pack_type) {
            3
        } else {
            4
        };
        let max_pixels = r.remaining() / bytes_per_pixel;
        if usize::from(height) > max_pixels / usize::from(width)
            || usize::from(width) > max_pixels / usize::from(height)
        {
            return Err(DecodeError::OutOfData);
        }

        let mut image = RasterImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if bytes_per_pixel == 4 {
                    r.skip(1)?;
                }
                let red = r.read_u8()?;
                let green = r.read_u8()?;
                let blue = r.read_u8()?;
                image.set_pixel(x, y, Color::new(red, green, blue));
            }
        }
        return Ok(image);
    }

    // PackBits-compressed rows with per-component planes.
    if cmp_count != 3 && cmp_count != 4 {
        return Err(DecodeError::UnsupportedRasterDepth);
    }

    check_row_budget(r, height, row_bytes, pack_type)?;

    let mut image = RasterImage::new(width, height);
    let mut scanline = vec![0u8; usize::from(width) * usize::from(cmp_count)];

    for y in 0..height {
        let row_start = r.tell();
        let byte_count = read_row_byte_count(r, row_bytes)?;

        let mut i = 0;
        while i < scanline.len() {
            let ctl = r.read_u8()?;
            if ctl & 0x80 == 0 {
                let mut count = usize::from(ctl) + 1;
                count = count.min(scanline.len() - i);
                if r.remaining() < count {
                    return Err(DecodeError::OutOfData);
                }
                for byte in r.read_bytes(count)? {
                    scanline[i] = *byte;
                    i += 1;
                }
            } else {
                let mut count = 257 - usize::from(ctl);
                count = count.min(scanline.len() - i);
                let dat = r.read_u8()?;
                for _ in 0..count {
                    scanline[i] = dat;
                    i += 1;
                }
            }
        }

        // An alpha plane, when present, comes first and is dropped.
        let offset = if cmp_count == 4 { usize::from(width) } else { 0 };
        let w = usize::from(width);
        for x in 0..width {
            let idx = offset + usize::from(x);
            image.set_pixel(
                x,
                y,
                Color::new(scanline[idx], scanline[idx + w], scanline[idx + 2 * w]),
            );
        }

        r.seek_abs(row_start + byte_count)?;
    }

    Ok(image)
}
