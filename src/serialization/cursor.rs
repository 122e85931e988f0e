//! Cursor-style reader and writer over the offset-based codecs
//!
//! Transaction and header serializers compose many small fields; these
//! types carry the position so callers don't thread offsets by hand. A
//! failed read leaves the reader position unchanged and a failed write
//! leaves the writer contents unchanged.

use super::fixed64::{read_i64, read_u64, write_i64, write_u64};
use super::varint::{read_varint, varint_size, write_varint};
use super::varint2::{read_varint2, read_varint2_u64, varint2_size_u64, write_varint2_u64};
use crate::error::{ensure_readable, Result};
use crate::types::Number;
use byteorder::{ByteOrder, LittleEndian};

/// Serialize a u32 as 4 little-endian bytes
#[inline]
pub fn write_u32_le(num: u32) -> [u8; 4] {
    num.to_le_bytes()
}

/// Growing little-endian writer
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Grow by `len` zero bytes and return the offset of the new region
    fn reserve_tail(&mut self, len: usize) -> usize {
        let offset = self.buf.len();
        self.buf.resize(offset + len, 0);
        offset
    }

    /// Run a fixed-size encoder on a fresh tail region, rolling back on error
    fn encode_tail<F>(&mut self, len: usize, encode: F) -> Result<()>
    where
        F: FnOnce(&mut [u8], usize) -> Result<usize>,
    {
        let offset = self.reserve_tail(len);
        match encode(&mut self.buf, offset) {
            Ok(end) => {
                debug_assert_eq!(end, self.buf.len());
                Ok(())
            }
            Err(e) => {
                self.buf.truncate(offset);
                Err(e)
            }
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&write_u32_le(value));
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn write_u64(&mut self, value: &Number) -> Result<()> {
        self.encode_tail(8, |buf, off| write_u64::<LittleEndian>(buf, value, off))
    }

    pub fn write_i64(&mut self, value: &Number) -> Result<()> {
        self.encode_tail(8, |buf, off| write_i64::<LittleEndian>(buf, value, off))
    }

    pub fn write_varint(&mut self, value: u64) -> Result<()> {
        self.encode_tail(varint_size(value), |buf, off| write_varint(buf, value, off))
    }

    pub fn write_varint2(&mut self, value: u64) -> Result<()> {
        self.encode_tail(varint2_size_u64(value), |buf, off| {
            write_varint2_u64(buf, value, off)
        })
    }

    /// VarInt length prefix followed by the bytes themselves
    pub fn write_var_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.write_varint(data.len() as u64)?;
        self.write_bytes(data);
        Ok(())
    }
}

/// Little-endian reader over a borrowed slice
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Apply a decoder at the current position and advance past what it consumed
    fn decode<T, F>(&mut self, decode: F) -> Result<T>
    where
        F: FnOnce(&'a [u8], usize) -> Result<(T, usize)>,
    {
        let (value, size) = decode(self.data, self.pos)?;
        self.pos += size;
        Ok(value)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        ensure_readable(self.data, self.pos, 1)?;
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        ensure_readable(self.data, self.pos, 4)?;
        let value = LittleEndian::read_u32(&self.data[self.pos..self.pos + 4]);
        self.pos += 4;
        Ok(value)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        ensure_readable(self.data, self.pos, len)?;
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn read_u64(&mut self) -> Result<Number> {
        self.decode(|data, off| Ok((read_u64::<LittleEndian>(data, off)?, 8)))
    }

    pub fn read_i64(&mut self) -> Result<Number> {
        self.decode(|data, off| Ok((read_i64::<LittleEndian>(data, off)?, 8)))
    }

    pub fn read_varint(&mut self) -> Result<u64> {
        self.decode(read_varint)
    }

    pub fn read_varint2(&mut self) -> Result<u64> {
        self.decode(read_varint2_u64)
    }

    pub fn read_varint2_big(&mut self) -> Result<Number> {
        self.decode(|data, off| read_varint2(data, off, true))
    }

    /// VarInt length prefix followed by that many bytes
    ///
    /// The position is restored if the payload is truncated.
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8]> {
        let start = self.pos;
        let len = self.read_varint()?;
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        match self.read_bytes(len) {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                self.pos = start;
                Err(e)
            }
        }
    }
}
