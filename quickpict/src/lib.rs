/*!
A memory-safe, pure-Rust decoder for QuickDraw PICT images.

`quickpict` decodes the classic Macintosh picture format into a display
list: a vector of resolution-independent drawing commands (lines, rects,
ovals, arcs, polygons, text runs) plus fully decoded raster images for
the embedded bitmap records. Both the version 1 framing (one-byte
opcodes) and the version 2 framing (two-byte, word-aligned opcodes) are
handled, with or without the 512-byte application block some files carry
in front of the header.

Decoding is forgiving by design: a malformed opcode aborts the decode,
but every command recorded up to that point is still returned, so a
partially corrupted picture renders whatever was salvageable.

# Example
```rust,no_run
use quickpict::{DrawCommand, decode};

let data = std::fs::read("drawing.pict").unwrap();
let picture = decode(&data);

for command in &picture.commands {
    if let DrawCommand::Bitmap { image, .. } = command {
        println!("{}x{} raster", image.width, image.height);
    }
}
```

# Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![forbid(unsafe_code)]
#![allow(missing_docs)]

mod color;
mod error;
mod geom;
mod header;
mod ops;
mod pattern;
mod pixmap;
mod reader;
mod state;
mod text;

pub use color::Color;
pub use error::{DecodeError, Result};
pub use geom::{Fraction, Point, Polygon, Rect, Size};
pub use header::Framing;
pub use pixmap::RasterImage;
pub use state::{FaceFlags, FontFamily, FontState, RasterOp, ShapeStyle, Verb};

use ops::Decoder;

/// One entry of the decoded display list.
///
/// Shape commands carry the verb they were recorded with and a
/// [`ShapeStyle`] snapshot of the graphics state at that moment, so
/// replaying the list needs no state machine of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand {
    /// A straight pen stroke.
    Line { from: Point, to: Point, verb: Verb, style: ShapeStyle },
    /// An axis-aligned rectangle.
    Rect { bounds: Rect, verb: Verb, style: ShapeStyle },
    /// A rectangle with elliptical corners of the given diameter.
    RoundRect { bounds: Rect, corner: Size, verb: Verb, style: ShapeStyle },
    /// An ellipse inscribed in its bounds.
    Oval { bounds: Rect, verb: Verb, style: ShapeStyle },
    /// A wedge of the ellipse inscribed in its bounds. Angles are in
    /// degrees clockwise from twelve o'clock; the sweep is never
    /// negative.
    Arc { bounds: Rect, start_angle: i32, sweep_angle: i32, verb: Verb, style: ShapeStyle },
    /// A closed polygon.
    Polygon { polygon: Polygon, verb: Verb, style: ShapeStyle },
    /// An arbitrary region, reduced to its bounding box.
    Region { bounds: Rect, verb: Verb, style: ShapeStyle },
    /// A run of text at a baseline position.
    Text { position: Point, text: String, font: FontState, color: Color },
    /// A decoded raster, blitted from `src` in image coordinates to
    /// `dst` in picture coordinates.
    Bitmap { image: RasterImage, src: Rect, dst: Rect },
}

/// A decoded picture.
#[derive(Debug, Clone)]
pub struct Picture {
    /// The display list, in stream order.
    pub commands: Vec<DrawCommand>,
    /// The picture frame, translated so its top-left corner is (0, 0).
    pub frame: Rect,
    /// Which stream framing the picture used.
    pub framing: Framing,
    /// Horizontal scale from device units to 72 dpi points.
    pub h_res: Fraction,
    /// Vertical scale from device units to 72 dpi points.
    pub v_res: Fraction,
    /// The byte offset at which decoding stopped.
    pub stopped_at: usize,
    /// The error that ended the decode early, if any.
    pub error: Option<DecodeError>,
}

/// Decode a QuickDraw picture from the given data.
///
/// This never fails outright: if no plausible header is found the
/// returned [`Picture`] is empty with [`Picture::error`] set, and a
/// decode that dies mid-stream keeps the commands recorded before the
/// failure point.
pub fn decode(data: &[u8]) -> Picture {
    let header = match header::sniff(data) {
        Ok(header) => header,
        Err(e) => {
            return Picture {
                commands: Vec::new(),
                frame: Rect::default(),
                framing: Framing::Legacy,
                h_res: Fraction::ONE,
                v_res: Fraction::ONE,
                stopped_at: 0,
                error: Some(e),
            };
        }
    };

    let frame = Rect::new(
        0,
        0,
        header.frame.width(),
        header.frame.height(),
    );
    let (commands, stopped_at, error) = Decoder::new(data, &header).decode_all();

    Picture {
        commands,
        frame,
        framing: header.framing,
        h_res: header.h_res,
        v_res: header.v_res,
        stopped_at,
        error,
    }
}
