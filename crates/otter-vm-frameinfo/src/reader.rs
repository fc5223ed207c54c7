//! Variable-length integer reader over frame info encodings
//!
//! Signed values are SLEB128, unsigned values ULEB128. Readers are plain
//! cursors: they never allocate and can be repositioned freely, which the
//! decoder uses to follow shared-frame back-references.

use crate::error::{FrameInfoError, Result};

const LAST_BYTE_SHIFT: u32 = 63;

/// Cursor over an encoding buffer
pub trait TypeReader {
    /// Current byte offset
    fn get_byte_index(&self) -> usize;

    /// Move the cursor to `byte_index`
    fn set_byte_index(&mut self, byte_index: usize);

    /// Read one raw byte
    fn get_u1(&mut self) -> Result<u8>;

    /// Read a signed variable-length integer
    fn get_sv(&mut self) -> Result<i64>;

    /// Read an unsigned variable-length integer
    fn get_uv(&mut self) -> Result<u64>;

    /// Bytes left after the cursor
    fn remaining(&self) -> usize;

    /// Read a signed variable-length integer that must fit in 32 bits
    fn get_sv_int(&mut self) -> Result<i32> {
        let value = self.get_sv()?;
        i32::try_from(value).map_err(|_| FrameInfoError::IntOutOfRange { value })
    }

    /// Read an unsigned variable-length integer that must fit in 32 bits
    fn get_uv_int(&mut self) -> Result<u32> {
        let value = self.get_uv()?;
        u32::try_from(value).map_err(|_| FrameInfoError::IntOutOfRange {
            value: value as i64,
        })
    }
}

/// Reader over a borrowed byte slice
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteArrayTypeReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteArrayTypeReader<'a> {
    /// Create a reader positioned at `byte_index`
    pub fn new(data: &'a [u8], byte_index: usize) -> Self {
        Self {
            data,
            pos: byte_index,
        }
    }

    /// Point the reader at a different buffer, keeping the cursor
    pub fn set_data(&mut self, data: &'a [u8]) {
        self.data = data;
    }

    fn read_leb128(&mut self, signed: bool) -> Result<u64> {
        let start = self.pos;
        let mut result: u64 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = self.get_u1()?;
            // the tenth byte holds bit 63; signed values may only sign-extend it
            if shift == LAST_BYTE_SHIFT {
                let fits = if signed {
                    matches!(byte, 0x00 | 0x7f)
                } else {
                    byte <= 0x01
                };
                if !fits {
                    return Err(FrameInfoError::VarIntOverflow { offset: start });
                }
            }
            result |= u64::from(byte & 0x7f) << shift;
            shift += 7;
            if byte & 0x80 == 0 {
                if signed && shift < u64::BITS && byte & 0x40 != 0 {
                    result |= u64::MAX << shift;
                }
                return Ok(result);
            }
        }
    }
}

impl TypeReader for ByteArrayTypeReader<'_> {
    #[inline]
    fn get_byte_index(&self) -> usize {
        self.pos
    }

    #[inline]
    fn set_byte_index(&mut self, byte_index: usize) {
        self.pos = byte_index;
    }

    #[inline]
    fn get_u1(&mut self) -> Result<u8> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(FrameInfoError::UnexpectedEnd { offset: self.pos })?;
        self.pos += 1;
        Ok(byte)
    }

    fn get_sv(&mut self) -> Result<i64> {
        self.read_leb128(true).map(|v| v as i64)
    }

    fn get_uv(&mut self) -> Result<u64> {
        self.read_leb128(false)
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }
}
