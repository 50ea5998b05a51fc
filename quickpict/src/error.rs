//! Error types for PICT decoding.

use core::fmt;

/// The reason a decode stopped early.
///
/// All of these are fatal to the decode in progress. The drawing commands
/// recorded before the failure point are still returned to the caller, so
/// a partially corrupted picture can render whatever was salvageable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A read or seek would cross the end of the input buffer.
    OutOfData,
    /// A rectangle with inverted bounds where the format requires a valid box.
    MalformedGeometry,
    /// A pixel depth or component layout outside the supported set.
    UnsupportedRasterDepth,
    /// A declared row stride incompatible with the declared width and depth.
    InconsistentRowStride,
    /// A raster color table claiming more than 256 entries.
    OversizedColorTable,
    /// A pixel pattern record with an unknown pattern type.
    InvalidPattern,
    /// No plausible picture header at any candidate offset.
    HeaderNotFound,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfData => write!(f, "unexpected end of input"),
            Self::MalformedGeometry => write!(f, "rectangle with inverted bounds"),
            Self::UnsupportedRasterDepth => write!(f, "unsupported pixel depth"),
            Self::InconsistentRowStride => write!(f, "row stride inconsistent with width and depth"),
            Self::OversizedColorTable => write!(f, "color table claims more than 256 entries"),
            Self::InvalidPattern => write!(f, "unknown pixel pattern type"),
            Self::HeaderNotFound => write!(f, "no picture header found"),
        }
    }
}

impl core::error::Error for DecodeError {}

/// Result type for PICT decoding operations.
pub type Result<T> = core::result::Result<T, DecodeError>;
