//! Locating and parsing the picture header.
//!
//! PICT data arrives with or without a 512-byte application block in
//! front of it, and the header itself never carries a magic number. The
//! sniffer therefore scores candidate headers at offset 0 and offset
//! 512 by plausibility, and when neither convinces it, scans forward
//! byte by byte for a spot where a strict header parse succeeds.

use log::debug;

use crate::error::{DecodeError, Result};
use crate::geom::{Fraction, Rect};
use crate::reader::Reader;

/// Which of the two stream framings the picture uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Version 1: one-byte opcodes, no alignment.
    Legacy,
    /// Version 2: two-byte opcodes kept on even offsets.
    Extended,
}

#[derive(Debug, Clone)]
pub(crate) struct Header {
    pub framing: Framing,
    pub frame: Rect,
    pub h_res: Fraction,
    pub v_res: Fraction,
    /// Byte offset of the first opcode.
    pub data_start: usize,
}

/// Parse a header candidate at `offset` and score how plausible it is.
///
/// Scoring starts at 20 and loses points for an implausibly large or
/// degenerate frame and for stray padding before the version opcode. In
/// strict mode any deduction on the frame disqualifies the candidate.
fn parse_candidate(data: &[u8], offset: usize, strict: bool) -> Option<(Header, i32)> {
    let mut r = Reader::new(data);
    r.seek_abs(offset).ok()?;

    // Picture size; meaningless for pictures over 64k, so ignored.
    r.skip(2).ok()?;
    let y1 = i32::from(r.read_i16().ok()?);
    let x1 = i32::from(r.read_i16().ok()?);
    let y2 = i32::from(r.read_i16().ok()?);
    let x2 = i32::from(r.read_i16().ok()?);
    if x2 < x1 || y2 < y1 {
        return None;
    }

    let mut confidence = 20;
    if !(-2048..=2048).contains(&x1)
        || !(-2048..=2048).contains(&y1)
        || !(-2048..=2048).contains(&x2)
        || !(-2048..=2048).contains(&y2)
        || (x1 == x2 && y1 == y2)
    {
        confidence -= 3;
    } else if x2 < x1 + 8 || y2 < y1 + 8 {
        confidence -= 1;
    }
    if strict && confidence != 20 {
        return None;
    }

    let mut frame = Rect::new(x1, y1, x2, y2);
    let mut h_res = Fraction::ONE;
    let mut v_res = Fraction::ONE;

    let mut b = [r.read_u8().ok()?, r.read_u8().ok()?];
    let framing = if b == [0x11, 0x01] {
        confidence -= 1;
        Framing::Legacy
    } else {
        if b[0] != 0 {
            return None;
        }
        // Some writers pad with NULs before the version opcode.
        let mut num_zero = 0;
        loop {
            num_zero += 1;
            r.seek_rel(-1).ok()?;
            b = [r.read_u8().ok()?, r.read_u8().ok()?];
            if b[0] != 0 || num_zero >= 10 {
                break;
            }
        }
        confidence -= num_zero - 1;

        if b[0] != 0x11 {
            return None;
        }
        if b[1] == 0x01 {
            confidence -= 1;
            Framing::Legacy
        } else if b[1] != 0x02 {
            return None;
        } else {
            // Version 2 header opcode: 0x02 0xff 0x0c 0x00 then a
            // two-byte variant selector.
            r.skip(3).ok()?;
            let variant = r.read_i16().ok()?;
            let _reserved = r.read_i16().ok()?;
            match variant {
                -2 => {
                    // Fixed-point horizontal and vertical resolution.
                    let hf = r.read_i32().ok()?;
                    let vf = r.read_i32().ok()?;
                    let top = i32::from(r.read_i16().ok()?);
                    let left = i32::from(r.read_i16().ok()?);
                    let bottom = i32::from(r.read_i16().ok()?);
                    let right = i32::from(r.read_i16().ok()?);
                    if right < left || bottom < top {
                        return None;
                    }
                    frame = Rect::new(left, top, right, bottom);
                    if hf != 0 {
                        h_res = Fraction { num: 65536, den: hf };
                    }
                    if vf != 0 {
                        v_res = Fraction { num: 65536, den: vf };
                    }
                    r.skip(4).ok()?;
                }
                -1 => {
                    // Bounding rectangle at native resolution.
                    r.skip(16).ok()?;
                    r.skip(4).ok()?;
                }
                _ => return None,
            }
            Framing::Extended
        }
    };

    let header = Header { framing, frame, h_res, v_res, data_start: r.tell() };
    Some((header, confidence))
}

/// Find the picture header, trying offset 0 and offset 512 first and
/// falling back to a byte-wise scan.
pub(crate) fn sniff(data: &[u8]) -> Result<Header> {
    let mut best: Option<(Header, i32)> = None;

    // Steps 0 and 1 probe the two canonical offsets, step 2 settles for
    // the better scored of the two, and the rest scan 512..=1024.
    for step in 0..=515usize {
        if step < 2 {
            let offset = step * 512;
            if let Some((header, confidence)) = parse_candidate(data, offset, false) {
                if header.framing == Framing::Extended && confidence == 20 {
                    return Ok(header);
                }
                if confidence > 0 {
                    let better = match &best {
                        Some((_, c)) => confidence > *c,
                        None => true,
                    };
                    if better {
                        best = Some((header, confidence));
                    }
                }
            }
        } else if step == 2 {
            if let Some((header, confidence)) = best.take() {
                debug!("accepted header with confidence {confidence}, opcodes start at {}", header.data_start);
                return Ok(header);
            }
        } else {
            // Last resort: slide a strict parse across the first
            // kilobyte, peeking at where the version opcode would sit.
            let offset = 509 + step;
            let Some(probe) = data.get(offset + 10..offset + 12) else {
                break;
            };
            if probe[0] == 0x11 || (probe[0] == 0 && probe[1] == 0x11) {
                if let Some((header, _)) = parse_candidate(data, offset, true) {
                    return Ok(header);
                }
            }
        }
    }

    Err(DecodeError::HeaderNotFound)
}
