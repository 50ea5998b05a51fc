//! A bounds-checked reader over the input buffer.

use crate::error::{DecodeError, Result};

/// A cursor for reading big-endian values from a byte stream.
///
/// Every read or seek that would cross the end of the buffer fails with
/// [`DecodeError::OutOfData`] instead of reading garbage.
#[derive(Debug, Clone)]
pub(crate) struct Reader<'a> {
    /// The underlying data.
    data: &'a [u8],
    /// The position in bytes. Always `<= data.len()`.
    pos: usize,
}

impl<'a> Reader<'a> {
    #[inline(always)]
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// The current byte offset from the start of the buffer.
    #[inline(always)]
    pub(crate) fn tell(&self) -> usize {
        self.pos
    }

    /// The number of bytes left to read.
    #[inline(always)]
    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Read the given number of bytes.
    #[inline(always)]
    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(DecodeError::OutOfData)?;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(DecodeError::OutOfData)?;
        self.pos = end;

        Ok(bytes)
    }

    /// Skip the given number of bytes.
    #[inline(always)]
    pub(crate) fn skip(&mut self, len: usize) -> Result<()> {
        self.read_bytes(len).map(|_| ())
    }

    #[inline(always)]
    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        let byte = *self.data.get(self.pos).ok_or(DecodeError::OutOfData)?;
        self.pos += 1;

        Ok(byte)
    }

    #[inline(always)]
    pub(crate) fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Read a big-endian u16.
    #[inline(always)]
    pub(crate) fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(
            self.read_bytes(2)?.try_into().map_err(|_| DecodeError::OutOfData)?,
        ))
    }

    /// Read a big-endian i16.
    #[inline(always)]
    pub(crate) fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    /// Read a big-endian u32.
    #[inline(always)]
    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(
            self.read_bytes(4)?.try_into().map_err(|_| DecodeError::OutOfData)?,
        ))
    }

    /// Read a big-endian i32.
    #[inline(always)]
    pub(crate) fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// Move to an absolute byte offset. The end of the buffer is a valid
    /// position; anything past it is not.
    #[inline(always)]
    pub(crate) fn seek_abs(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(DecodeError::OutOfData);
        }
        self.pos = pos;

        Ok(())
    }

    /// Move relative to the current position.
    #[inline(always)]
    pub(crate) fn seek_rel(&mut self, delta: i64) -> Result<()> {
        let pos = i64::try_from(self.pos)
            .ok()
            .and_then(|p| p.checked_add(delta))
            .ok_or(DecodeError::OutOfData)?;
        let pos = usize::try_from(pos).map_err(|_| DecodeError::OutOfData)?;

        self.seek_abs(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_reads() {
        let data = [0x12, 0x34, 0x56, 0x78, 0xff];
        let mut r = Reader::new(&data);
        assert_eq!(r.read_u16(), Ok(0x1234));
        assert_eq!(r.read_u16(), Ok(0x5678));
        assert_eq!(r.read_i8(), Ok(-1));
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn reads_past_end_fail() {
        let data = [0x00, 0x01, 0x02];
        let mut r = Reader::new(&data);
        assert_eq!(r.read_u32(), Err(DecodeError::OutOfData));
        // A failed read must not advance the cursor.
        assert_eq!(r.tell(), 0);
        assert_eq!(r.read_u16(), Ok(0x0001));
        assert_eq!(r.read_u16(), Err(DecodeError::OutOfData));
    }

    #[test]
    fn seeks_are_bounds_checked() {
        let data = [0u8; 8];
        let mut r = Reader::new(&data);
        assert!(r.seek_abs(8).is_ok());
        assert_eq!(r.seek_abs(9), Err(DecodeError::OutOfData));
        assert!(r.seek_rel(-8).is_ok());
        assert_eq!(r.tell(), 0);
        assert_eq!(r.seek_rel(-1), Err(DecodeError::OutOfData));
    }

    #[test]
    fn signed_sixteen_bit() {
        let data = [0xff, 0xfe];
        let mut r = Reader::new(&data);
        assert_eq!(r.read_i16(), Ok(-2));
    }
}
