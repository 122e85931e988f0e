//! Bitcoin VarInt (CompactSize) encoding/decoding
//!
//! VarInt (Variable Integer) is a compact encoding for integers used throughout
//! Bitcoin's wire format. It uses 1-9 bytes depending on the value.
//!
//! Encoding rules:
//! - If value < 0xfd: single byte
//! - If value <= 0xffff: 0xfd prefix + 2 bytes (little-endian)
//! - If value <= 0xffffffff: 0xfe prefix + 4 bytes (little-endian)
//! - Otherwise: 0xff prefix + 8 bytes (little-endian)
//!
//! Decoding rejects any value that would have fit a shorter prefix. Accepting
//! such encodings would let two byte strings describe the same transaction.

use super::fixed64::{read_u64_big, write_u64_big};
use crate::error::{ensure_readable, ensure_writable, CodecError, Result};
use byteorder::{ByteOrder, LittleEndian};
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};

/// Prefix byte announcing a 2-byte payload
pub const VARINT_PREFIX_U16: u8 = 0xfd;
/// Prefix byte announcing a 4-byte payload
pub const VARINT_PREFIX_U32: u8 = 0xfe;
/// Prefix byte announcing an 8-byte payload
pub const VARINT_PREFIX_U64: u8 = 0xff;

/// Number of bytes `value` occupies as a VarInt
///
/// ```
/// use blvm_codec::serialization::varint::varint_size;
///
/// assert_eq!(varint_size(252), 1);
/// assert_eq!(varint_size(253), 3);
/// assert_eq!(varint_size(0x10000), 5);
/// assert_eq!(varint_size(u64::MAX), 9);
/// ```
#[inline]
pub fn varint_size(value: u64) -> usize {
    if value < 0xfd {
        1
    } else if value <= 0xffff {
        3
    } else if value <= 0xffffffff {
        5
    } else {
        9
    }
}

/// Number of bytes an arbitrary-precision `value` occupies as a VarInt
pub fn varint_size_big(value: &BigInt) -> Result<usize> {
    Ok(varint_size(big_to_varint_value(value)?))
}

fn big_to_varint_value(value: &BigInt) -> Result<u64> {
    if value.is_negative() {
        return Err(CodecError::bounds("Negative VarInt value"));
    }
    value
        .to_u64()
        .ok_or_else(|| CodecError::bounds("VarInt value exceeds 2^64-1"))
}

/// Write `value` as a VarInt at `offset`, returning the new offset
///
/// # Errors
///
/// `InsufficientCapacity` if `dst` cannot hold the full encoding; nothing is
/// written in that case.
pub fn write_varint(dst: &mut [u8], value: u64, offset: usize) -> Result<usize> {
    let size = varint_size(value);
    ensure_writable(dst, offset, size)?;

    let out = &mut dst[offset..offset + size];
    match size {
        1 => out[0] = value as u8,
        3 => {
            out[0] = VARINT_PREFIX_U16;
            LittleEndian::write_u16(&mut out[1..], value as u16);
        }
        5 => {
            out[0] = VARINT_PREFIX_U32;
            LittleEndian::write_u32(&mut out[1..], value as u32);
        }
        _ => {
            out[0] = VARINT_PREFIX_U64;
            LittleEndian::write_u64(&mut out[1..], value);
        }
    }

    Ok(offset + size)
}

/// Write an arbitrary-precision `value` as a VarInt
///
/// Values wider than 32 bits always take the 9-byte form and go through the
/// arbitrary-precision 64-bit writer.
pub fn write_varint_big(dst: &mut [u8], value: &BigInt, offset: usize) -> Result<usize> {
    let small = big_to_varint_value(value)?;

    if value.bits() <= 32 {
        return write_varint(dst, small, offset);
    }

    ensure_writable(dst, offset, 9)?;
    dst[offset] = VARINT_PREFIX_U64;
    write_u64_big::<LittleEndian>(dst, value, offset + 1)
}

/// Encode a u64 value as a Bitcoin VarInt
///
/// # Examples
///
/// ```
/// use blvm_codec::serialization::varint::encode_varint;
///
/// assert_eq!(encode_varint(0), vec![0]);
/// assert_eq!(encode_varint(252), vec![252]);
/// assert_eq!(encode_varint(253), vec![0xfd, 253, 0]);
/// assert_eq!(encode_varint(65535), vec![0xfd, 255, 255]);
/// assert_eq!(encode_varint(65536), vec![0xfe, 0, 0, 1, 0]);
/// ```
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut result = Vec::with_capacity(varint_size(value));
    if value < 0xfd {
        result.push(value as u8);
    } else if value <= 0xffff {
        result.push(VARINT_PREFIX_U16);
        result.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffffffff {
        result.push(VARINT_PREFIX_U32);
        result.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        result.push(VARINT_PREFIX_U64);
        result.extend_from_slice(&value.to_le_bytes());
    }
    result
}

/// Read a VarInt at `offset`
///
/// Returns the decoded value and the number of bytes consumed.
///
/// # Errors
///
/// `TruncatedInput` if the encoding runs past the end of `data`,
/// `MalformedEncoding` if the value would have fit a shorter prefix.
pub fn read_varint(data: &[u8], offset: usize) -> Result<(u64, usize)> {
    ensure_readable(data, offset, 1)?;
    let prefix = data[offset];

    let (value, size) = match prefix {
        VARINT_PREFIX_U16 => {
            ensure_readable(data, offset, 3)?;
            let value = u64::from(LittleEndian::read_u16(&data[offset + 1..offset + 3]));
            (value, 3)
        }
        VARINT_PREFIX_U32 => {
            ensure_readable(data, offset, 5)?;
            let value = u64::from(LittleEndian::read_u32(&data[offset + 1..offset + 5]));
            (value, 5)
        }
        VARINT_PREFIX_U64 => {
            ensure_readable(data, offset, 9)?;
            let value = LittleEndian::read_u64(&data[offset + 1..offset + 9]);
            (value, 9)
        }
        b => return Ok((u64::from(b), 1)),
    };

    check_canonical(prefix, value, offset)?;
    Ok((value, size))
}

/// Bitcoin Core rejects values that fit a shorter encoding
fn check_canonical(prefix: u8, value: u64, offset: usize) -> Result<()> {
    let canonical = match prefix {
        VARINT_PREFIX_U16 => value >= 0xfd,
        VARINT_PREFIX_U32 => value > 0xffff,
        _ => value > 0xffffffff,
    };

    if !canonical {
        tracing::debug!(prefix, value, offset, "non-canonical VarInt");
        return Err(CodecError::malformed(format!(
            "Non-canonical VarInt: prefix {prefix:#04x} with value {value}"
        )));
    }

    Ok(())
}

/// Read a VarInt at `offset` into arbitrary precision
///
/// The same canonicality rules apply as for [`read_varint`].
pub fn read_varint_big(data: &[u8], offset: usize) -> Result<(BigInt, usize)> {
    ensure_readable(data, offset, 1)?;

    if data[offset] == VARINT_PREFIX_U64 {
        let value = read_u64_big::<LittleEndian>(data, offset + 1)?;
        if value.bits() <= 32 {
            let small = value.to_u64().unwrap_or(0);
            check_canonical(VARINT_PREFIX_U64, small, offset)?;
        }
        return Ok((value, 9));
    }

    let (value, size) = read_varint(data, offset)?;
    Ok((BigInt::from(value), size))
}

/// Decode a Bitcoin VarInt from the start of `data`
///
/// Returns the decoded value and the number of bytes consumed.
///
/// # Examples
///
/// ```
/// use blvm_codec::serialization::varint::decode_varint;
///
/// assert_eq!(decode_varint(&[0]), Ok((0, 1)));
/// assert_eq!(decode_varint(&[252]), Ok((252, 1)));
/// assert_eq!(decode_varint(&[0xfd, 253, 0]), Ok((253, 3)));
/// assert_eq!(decode_varint(&[0xfd, 255, 255]), Ok((65535, 3)));
/// assert_eq!(decode_varint(&[0xfe, 0, 0, 1, 0]), Ok((65536, 5)));
/// assert!(decode_varint(&[]).is_err());
/// ```
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    read_varint(data, 0)
}
