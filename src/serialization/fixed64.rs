//! Fixed-width 64-bit integer codec
//!
//! Every read and write consumes exactly 8 bytes. Byte order is chosen at
//! compile time through a `byteorder::ByteOrder` type parameter:
//!
//! ```
//! use blvm_codec::serialization::fixed64::{read_i64n, write_i64n};
//! use byteorder::{BigEndian, LittleEndian};
//!
//! let mut buf = [0u8; 8];
//! assert_eq!(write_i64n::<LittleEndian>(&mut buf, -1, 0), Ok(8));
//! assert_eq!(buf, [0xff; 8]);
//! assert_eq!(read_i64n::<BigEndian>(&buf, 0, false), Ok(-1));
//! ```
//!
//! Two paths exist for each entry point:
//! - the native path (`*n` functions) works on values whose magnitude fits
//!   in 53 bits and fails for anything larger;
//! - the arbitrary-precision path (`*_big` functions) covers the whole
//!   64-bit range using `BigInt`.
//!
//! `read_u64`/`read_i64`/`write_u64`/`write_i64` bridge the two through
//! [`Number`].

use crate::constants::{HI_53_MASK, HI_UNSAFE_BITS, MAX_SAFE_INTEGER};
use crate::error::{ensure_readable, ensure_writable, CodecError, Result};
use crate::types::Number;
use byteorder::ByteOrder;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};

const HALF: u64 = 0x1_0000_0000;

#[inline]
fn read_halves<B: ByteOrder>(data: &[u8], offset: usize) -> Result<(u32, u32)> {
    ensure_readable(data, offset, 8)?;
    let raw = B::read_u64(&data[offset..offset + 8]);
    Ok(((raw >> 32) as u32, raw as u32))
}

#[inline]
fn write_halves<B: ByteOrder>(dst: &mut [u8], hi: u32, lo: u32, offset: usize) -> usize {
    B::write_u64(&mut dst[offset..offset + 8], (u64::from(hi) << 32) | u64::from(lo));
    offset + 8
}

#[inline]
fn read_raw<B: ByteOrder>(data: &[u8], offset: usize) -> Result<u64> {
    ensure_readable(data, offset, 8)?;
    Ok(B::read_u64(&data[offset..offset + 8]))
}

/// Split a safe native value into two's-complement high/low halves
///
/// Negative values are built as `!(|n| - 1)` on each half, which is the
/// two's-complement pattern without needing 64-bit wrapping arithmetic.
fn native_halves(num: i64) -> Result<(u32, u32)> {
    let negative = num < 0;
    let mut magnitude = num.unsigned_abs();

    if magnitude > MAX_SAFE_INTEGER as u64 {
        return Err(CodecError::bounds("Number exceeds 2^53-1"));
    }

    if negative {
        magnitude -= 1;
    }

    let lo = magnitude % HALF;
    let hi = (magnitude - lo) / HALF;
    let (mut hi, mut lo) = (hi as u32, lo as u32);

    if negative {
        hi = !hi;
        lo = !lo;
    }

    Ok((hi, lo))
}

/// Read an unsigned 64-bit integer as a native value
///
/// With `force53` the high half is masked to its low 21 bits first, keeping
/// only the bottom 53 bits of the encoded value.
///
/// # Errors
///
/// `BoundsViolation` if the value exceeds 2^53-1, `TruncatedInput` if fewer
/// than 8 bytes are available.
pub fn read_u64n<B: ByteOrder>(data: &[u8], offset: usize, force53: bool) -> Result<u64> {
    let (mut hi, lo) = read_halves::<B>(data, offset)?;

    if force53 {
        hi &= HI_53_MASK;
    }

    if hi & HI_UNSAFE_BITS != 0 {
        tracing::trace!(offset, hi, "rejecting unsafe native u64 read");
        return Err(CodecError::bounds("Number exceeds 2^53-1"));
    }

    Ok(u64::from(hi) * HALF + u64::from(lo))
}

/// Read a signed 64-bit integer as a native value
///
/// Negative encodings are recovered as `-(hi * 2^32 + lo + 1)` after
/// complementing both halves. `force53` masks the (complemented) high half
/// to 21 bits, preserving the sign.
pub fn read_i64n<B: ByteOrder>(data: &[u8], offset: usize, force53: bool) -> Result<i64> {
    let (mut hi, mut lo) = read_halves::<B>(data, offset)?;
    let negative = hi & 0x8000_0000 != 0;

    if negative {
        hi = !hi;
        lo = !lo;
    }

    if force53 {
        hi &= HI_53_MASK;
    }

    if hi & HI_UNSAFE_BITS != 0 {
        tracing::trace!(offset, hi, negative, "rejecting unsafe native i64 read");
        return Err(CodecError::bounds("Number exceeds 2^53-1"));
    }

    let magnitude = u64::from(hi) * HALF + u64::from(lo);

    if !negative {
        return Ok(magnitude as i64);
    }

    // -(2^53) has a safe bit pattern but an unsafe magnitude
    let magnitude = magnitude + 1;
    if magnitude > MAX_SAFE_INTEGER as u64 {
        return Err(CodecError::bounds("Number exceeds 2^53-1"));
    }

    Ok(-(magnitude as i64))
}

/// Write a native value as a signed 64-bit integer, returning the new offset
///
/// # Errors
///
/// `BoundsViolation` if `|num| > 2^53-1`, `InsufficientCapacity` if `dst`
/// has fewer than 8 bytes after `offset`. Nothing is written on failure.
pub fn write_i64n<B: ByteOrder>(dst: &mut [u8], num: i64, offset: usize) -> Result<usize> {
    ensure_writable(dst, offset, 8)?;
    let (hi, lo) = native_halves(num)?;
    Ok(write_halves::<B>(dst, hi, lo, offset))
}

/// Write a native value as an unsigned 64-bit integer
pub fn write_u64n<B: ByteOrder>(dst: &mut [u8], num: u64, offset: usize) -> Result<usize> {
    if num > MAX_SAFE_INTEGER as u64 {
        return Err(CodecError::bounds("Number exceeds 2^53-1"));
    }
    write_i64n::<B>(dst, num as i64, offset)
}

/// Read an unsigned 64-bit integer into arbitrary precision
pub fn read_u64_big<B: ByteOrder>(data: &[u8], offset: usize) -> Result<BigInt> {
    Ok(BigInt::from(read_raw::<B>(data, offset)?))
}

/// Read a signed 64-bit integer into arbitrary precision
///
/// When the sign bit is set the raw word is inverted, incremented and
/// negated to recover the magnitude.
pub fn read_i64_big<B: ByteOrder>(data: &[u8], offset: usize) -> Result<BigInt> {
    let raw = read_raw::<B>(data, offset)?;

    if raw & (1 << 63) == 0 {
        return Ok(BigInt::from(raw));
    }

    let magnitude = (!raw).wrapping_add(1);
    Ok(-BigInt::from(magnitude))
}

/// Two's-complement 64-bit word for `num`
///
/// Signed values must lie in `[-2^63, 2^63-1]`, unsigned ones in
/// `[0, 2^64-1]`.
fn big_to_raw(num: &BigInt, signed: bool) -> Result<u64> {
    if num.is_negative() {
        if !signed {
            return Err(CodecError::bounds("Negative value for unsigned 64-bit field"));
        }
        let magnitude = num
            .magnitude()
            .to_u64()
            .filter(|m| *m <= 1 << 63)
            .ok_or_else(|| CodecError::bounds("Number below -2^63"))?;
        return Ok((!magnitude).wrapping_add(1));
    }

    let limit = if signed { i64::MAX as u64 } else { u64::MAX };
    num.to_u64()
        .filter(|v| *v <= limit)
        .ok_or_else(|| CodecError::bounds("Number exceeds 64-bit range"))
}

fn write_big<B: ByteOrder>(
    dst: &mut [u8],
    num: &BigInt,
    offset: usize,
    signed: bool,
) -> Result<usize> {
    ensure_writable(dst, offset, 8)?;
    let raw = big_to_raw(num, signed)?;
    B::write_u64(&mut dst[offset..offset + 8], raw);
    Ok(offset + 8)
}

/// Write an arbitrary-precision value as a signed 64-bit integer
pub fn write_i64_big<B: ByteOrder>(dst: &mut [u8], num: &BigInt, offset: usize) -> Result<usize> {
    write_big::<B>(dst, num, offset, true)
}

/// Write an arbitrary-precision value as an unsigned 64-bit integer
pub fn write_u64_big<B: ByteOrder>(dst: &mut [u8], num: &BigInt, offset: usize) -> Result<usize> {
    write_big::<B>(dst, num, offset, false)
}

/// Read an unsigned 64-bit integer, native when safe and `Big` otherwise
pub fn read_u64<B: ByteOrder>(data: &[u8], offset: usize) -> Result<Number> {
    match read_u64n::<B>(data, offset, false) {
        Ok(n) => Ok(Number::Native(n as i64)),
        Err(CodecError::BoundsViolation(_)) => Ok(Number::Big(read_u64_big::<B>(data, offset)?)),
        Err(e) => Err(e),
    }
}

/// Read a signed 64-bit integer, native when safe and `Big` otherwise
pub fn read_i64<B: ByteOrder>(data: &[u8], offset: usize) -> Result<Number> {
    match read_i64n::<B>(data, offset, false) {
        Ok(n) => Ok(Number::Native(n)),
        Err(CodecError::BoundsViolation(_)) => Ok(Number::Big(read_i64_big::<B>(data, offset)?)),
        Err(e) => Err(e),
    }
}

/// Write a [`Number`] as an unsigned 64-bit integer through the matching path
pub fn write_u64<B: ByteOrder>(dst: &mut [u8], num: &Number, offset: usize) -> Result<usize> {
    match num {
        Number::Native(n) => {
            if *n < 0 {
                return Err(CodecError::bounds("Negative value for unsigned 64-bit field"));
            }
            write_u64n::<B>(dst, *n as u64, offset)
        }
        Number::Big(n) => write_u64_big::<B>(dst, n, offset),
    }
}

/// Write a [`Number`] as a signed 64-bit integer through the matching path
pub fn write_i64<B: ByteOrder>(dst: &mut [u8], num: &Number, offset: usize) -> Result<usize> {
    match num {
        Number::Native(n) => write_i64n::<B>(dst, *n, offset),
        Number::Big(n) => write_i64_big::<B>(dst, n, offset),
    }
}
