//! Storage VarInt ("type 2") encoding/decoding
//!
//! This is the variable-length integer used by Bitcoin Core's on-disk
//! formats (`CVarInt`), unrelated to the wire CompactSize prefixes.
//!
//! Each byte carries 7 value bits; the high bit marks that another byte
//! follows. Chunks are emitted most significant first, and every continued
//! chunk is offset by one, so no value has two encodings and dense suffixes
//! save a byte over plain base-128:
//!
//! ```text
//! decode: acc = acc * 128 + (b & 0x7f); if b & 0x80 { acc += 1 }
//! encode: emit n & 0x7f; while n > 0x7f { n = (n >> 7) - 1; emit n & 0x7f | 0x80 }
//! ```
//!
//! Decoding starts on a native accumulator and moves to `BigInt` once the
//! accumulator reaches [`VARINT2_PROMOTE_THRESHOLD`]. Native-only reads keep
//! the u64 accumulator instead and fail once it passes 2^53-1.

use crate::constants::{
    MAX_SAFE_INTEGER, VARINT2_MAX_BITS, VARINT2_MAX_U64_SIZE, VARINT2_PROMOTE_THRESHOLD,
};
use crate::error::{ensure_readable, ensure_writable, CodecError, Result};
use crate::types::Number;
use num_bigint::{BigInt, BigUint};
use num_traits::ToPrimitive;
use smallvec::SmallVec;

type Chunks = SmallVec<[u8; 16]>;

/// One decode step on the native accumulator
#[inline]
fn step_native(acc: u64, byte: u8) -> u64 {
    let acc = acc * 0x80 + u64::from(byte & 0x7f);
    if byte & 0x80 != 0 {
        acc + 1
    } else {
        acc
    }
}

/// Decode step on the native accumulator that reports u64 overflow
#[inline]
fn step_checked(acc: u64, byte: u8) -> Option<u64> {
    acc.checked_mul(0x80)
        .and_then(|n| n.checked_add(u64::from(byte & 0x7f)))
        .and_then(|n| n.checked_add(u64::from(byte >> 7)))
}

/// One decode step on the arbitrary-precision accumulator
#[inline]
fn step_big(acc: &mut BigInt, byte: u8) {
    *acc <<= 7u32;
    *acc += u32::from(byte & 0x7f);
    if byte & 0x80 != 0 {
        *acc += 1u32;
    }
}

/// Read a storage VarInt at `offset`
///
/// Returns the value and the number of bytes consumed. With `big` set the
/// value is always returned as `Number::Big` and may grow past 64 bits;
/// without it, a value that needs promotion is a bounds violation.
///
/// # Errors
///
/// - `TruncatedInput` if the data ends before a terminating byte
/// - `BoundsViolation` if `big` is false and the value exceeds 2^53-1
/// - `MalformedEncoding` if the value grows past 256 bits unterminated
pub fn read_varint2(data: &[u8], offset: usize, big: bool) -> Result<(Number, usize)> {
    read_varint2_with_limit(data, offset, big, VARINT2_MAX_BITS)
}

/// [`read_varint2`] with a caller-chosen bit limit for the big accumulator
pub fn read_varint2_with_limit(
    data: &[u8],
    offset: usize,
    big: bool,
    max_bits: u64,
) -> Result<(Number, usize)> {
    let mut num: u64 = 0;
    let mut bnum: Option<BigInt> = None;
    let mut size = 0usize;

    loop {
        ensure_readable(data, offset, size + 1)?;
        let byte = data[offset + size];
        size += 1;

        if big && bnum.is_none() && num >= VARINT2_PROMOTE_THRESHOLD {
            bnum = Some(BigInt::from(num));
            num = 0;
        }

        if let Some(acc) = bnum.as_mut() {
            if acc.bits() > max_bits {
                tracing::debug!(offset, size, max_bits, "unterminated VarInt2");
                return Err(CodecError::malformed(format!(
                    "VarInt2 exceeds {max_bits} bits"
                )));
            }
            step_big(acc, byte);
        } else if big {
            num = step_native(num, byte);
        } else {
            num = step_checked(num, byte)
                .filter(|&n| n <= MAX_SAFE_INTEGER as u64)
                .ok_or_else(|| {
                    tracing::trace!(offset, size, "VarInt2 exceeds native range");
                    CodecError::bounds("VarInt2 exceeds 2^53-1")
                })?;
        }

        if byte & 0x80 == 0 {
            break;
        }
    }

    let value = match bnum {
        Some(acc) => Number::Big(acc),
        None if big => Number::Big(BigInt::from(num)),
        None => Number::Native(num as i64),
    };

    Ok((value, size))
}

/// Read a storage VarInt at `offset` into a u64
///
/// Uses the full 64-bit native range instead of the 53-bit promotion point.
pub fn read_varint2_u64(data: &[u8], offset: usize) -> Result<(u64, usize)> {
    let mut num: u64 = 0;
    let mut size = 0usize;

    loop {
        ensure_readable(data, offset, size + 1)?;
        let byte = data[offset + size];
        size += 1;

        num = step_checked(num, byte)
            .ok_or_else(|| CodecError::bounds("VarInt2 exceeds 2^64-1"))?;

        if byte & 0x80 == 0 {
            return Ok((num, size));
        }
    }
}

/// Decode a storage VarInt from the start of `data`
pub fn decode_varint2(data: &[u8]) -> Result<(u64, usize)> {
    read_varint2_u64(data, 0)
}

/// Chunks of `n` in emission-reversed order (least significant first)
fn chunks_u64(mut n: u64) -> Chunks {
    let mut tmp = Chunks::new();
    loop {
        let flag = if tmp.is_empty() { 0x00 } else { 0x80 };
        tmp.push((n & 0x7f) as u8 | flag);
        if n <= 0x7f {
            break;
        }
        n = (n >> 7) - 1;
    }
    tmp
}

fn chunks_big(n: &BigUint) -> Chunks {
    let mut n = n.clone();
    let mut tmp = Chunks::new();
    loop {
        let low = n.iter_u64_digits().next().unwrap_or(0);
        let flag = if tmp.is_empty() { 0x00 } else { 0x80 };
        tmp.push((low & 0x7f) as u8 | flag);
        if n.bits() <= 7 {
            break;
        }
        n >>= 7u32;
        n -= 1u32;
    }
    tmp
}

fn chunks_number(value: &Number) -> Result<Chunks> {
    match value {
        Number::Native(n) => {
            let n = u64::try_from(*n).map_err(|_| CodecError::bounds("Negative VarInt2 value"))?;
            Ok(chunks_u64(n))
        }
        Number::Big(n) => {
            let magnitude = n
                .to_biguint()
                .ok_or_else(|| CodecError::bounds("Negative VarInt2 value"))?;
            match magnitude.to_u64() {
                Some(small) => Ok(chunks_u64(small)),
                None => Ok(chunks_big(&magnitude)),
            }
        }
    }
}

fn emit(dst: &mut [u8], chunks: &Chunks, offset: usize) -> Result<usize> {
    ensure_writable(dst, offset, chunks.len())?;
    for (slot, byte) in dst[offset..offset + chunks.len()]
        .iter_mut()
        .zip(chunks.iter().rev())
    {
        *slot = *byte;
    }
    Ok(offset + chunks.len())
}

/// Write `value` as a storage VarInt at `offset`, returning the new offset
///
/// # Errors
///
/// `BoundsViolation` for negative values, `InsufficientCapacity` if `dst`
/// cannot hold the encoding (nothing is written).
pub fn write_varint2(dst: &mut [u8], value: &Number, offset: usize) -> Result<usize> {
    let chunks = chunks_number(value)?;
    emit(dst, &chunks, offset)
}

/// Write a u64 as a storage VarInt at `offset`
pub fn write_varint2_u64(dst: &mut [u8], value: u64, offset: usize) -> Result<usize> {
    emit(dst, &chunks_u64(value), offset)
}

/// Encode a u64 as a storage VarInt
///
/// ```
/// use blvm_codec::serialization::varint2::encode_varint2;
///
/// assert_eq!(encode_varint2(0x7f), vec![0x7f]);
/// assert_eq!(encode_varint2(0x80), vec![0x80, 0x00]);
/// assert_eq!(encode_varint2(0x1234), vec![0xa3, 0x34]);
/// ```
pub fn encode_varint2(value: u64) -> Vec<u8> {
    chunks_u64(value).into_iter().rev().collect()
}

/// Number of bytes `value` occupies as a storage VarInt
pub fn varint2_size_u64(mut value: u64) -> usize {
    let mut size = 0;
    loop {
        size += 1;
        if value <= 0x7f {
            break;
        }
        value = (value >> 7) - 1;
    }
    debug_assert!(size <= VARINT2_MAX_U64_SIZE);
    size
}

/// Number of bytes `value` occupies as a storage VarInt
pub fn varint2_size(value: &Number) -> Result<usize> {
    match value {
        Number::Native(n) => u64::try_from(*n)
            .map(varint2_size_u64)
            .map_err(|_| CodecError::bounds("Negative VarInt2 value")),
        Number::Big(_) => chunks_number(value).map(|c| c.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    // Vectors from Bitcoin Core's serialize_tests (varints_bitpattern)
    const VECTORS: &[(u64, &str)] = &[
        (0, "00"),
        (0x7f, "7f"),
        (0x80, "8000"),
        (0x1234, "a334"),
        (0xffff, "82fe7f"),
        (0x123456, "c7e756"),
        (0x80123456, "86ffc7e756"),
        (0xffffffff, "8efefefe7f"),
        (0x7fffffffffffffff, "fefefefefefefefe7f"),
        (0xffffffffffffffff, "80fefefefefefefefe7f"),
    ];

    #[test]
    fn test_known_bit_patterns() {
        for (value, hex_str) in VECTORS {
            let expected = hex::decode(hex_str).unwrap();
            assert_eq!(encode_varint2(*value), expected, "encode {value:#x}");
            assert_eq!(varint2_size_u64(*value), expected.len());
            assert_eq!(
                decode_varint2(&expected),
                Ok((*value, expected.len())),
                "decode {value:#x}"
            );
        }
    }

    #[test]
    fn test_number_read_native_and_big() {
        let data = hex::decode("a334").unwrap();
        let (value, size) = read_varint2(&data, 0, false).unwrap();
        assert!(value.is_native());
        assert_eq!((value, size), (Number::Native(0x1234), 2));

        let (value, _) = read_varint2(&data, 0, true).unwrap();
        assert!(value.is_big());
        assert_eq!(value, Number::Native(0x1234));
    }

    #[test]
    fn test_promotion_requires_big() {
        let data = encode_varint2(u64::MAX);
        assert_eq!(
            read_varint2(&data, 0, false).unwrap_err().kind(),
            ErrorKind::Bounds
        );
        let (value, size) = read_varint2(&data, 0, true).unwrap();
        assert_eq!(value, Number::from(u64::MAX));
        assert_eq!(size, 10);
    }

    #[test]
    fn test_promotion_keeps_low_bits() {
        // The accumulator before the final byte sits exactly at the promotion point
        let value = (VARINT2_PROMOTE_THRESHOLD + 1) * 0x80 + 0x55;
        let data = encode_varint2(value);
        let (decoded, _) = read_varint2(&data, 0, true).unwrap();
        assert_eq!(decoded, Number::from(value));
        assert_eq!(decode_varint2(&data), Ok((value, data.len())));
    }

    #[test]
    fn test_max_safe_integer_native() {
        let data = encode_varint2(MAX_SAFE_INTEGER as u64);
        let (native, size) = read_varint2(&data, 0, false).unwrap();
        assert!(native.is_native());
        assert_eq!(native, Number::Native(MAX_SAFE_INTEGER));
        assert_eq!(size, data.len());
        let (big, _) = read_varint2(&data, 0, true).unwrap();
        assert_eq!(big, Number::Native(MAX_SAFE_INTEGER));
    }

    #[test]
    fn test_native_read_covers_top_of_safe_range() {
        let max = MAX_SAFE_INTEGER as u64;
        for value in (max - 300)..=max {
            let data = encode_varint2(value);
            assert_eq!(
                read_varint2(&data, 0, false),
                Ok((Number::Native(value as i64), data.len())),
                "{value:#x}"
            );
        }

        let data = encode_varint2(max + 1);
        assert_eq!(
            read_varint2(&data, 0, false).unwrap_err().kind(),
            ErrorKind::Bounds
        );
    }

    #[test]
    fn test_wider_than_64_bits() {
        let value = BigInt::from(1u8) << 200u32;
        let num = Number::Big(value.clone());
        let size = varint2_size(&num).unwrap();
        let mut buf = vec![0u8; size];
        assert_eq!(write_varint2(&mut buf, &num, 0), Ok(size));
        let (decoded, consumed) = read_varint2(&buf, 0, true).unwrap();
        assert_eq!(decoded, num);
        assert_eq!(consumed, size);
        assert!(decode_varint2(&buf).is_err());
    }

    #[test]
    fn test_unterminated_rejected() {
        let data = vec![0xffu8; 64];
        assert_eq!(
            read_varint2(&data, 0, true).unwrap_err().kind(),
            ErrorKind::Malformed
        );
        let data = vec![0x80u8; 3];
        assert_eq!(
            read_varint2(&data, 0, true).unwrap_err().kind(),
            ErrorKind::Truncated
        );
    }

    #[test]
    fn test_negative_rejected() {
        let mut buf = [0u8; 4];
        assert!(write_varint2(&mut buf, &Number::Native(-1), 0).is_err());
        assert!(varint2_size(&Number::Big(BigInt::from(-1))).is_err());
    }

    #[test]
    fn test_offset_write_and_capacity() {
        let mut buf = [0u8; 4];
        assert_eq!(write_varint2_u64(&mut buf, 0xffff, 1), Ok(4));
        assert_eq!(&buf[1..], &[0x82, 0xfe, 0x7f]);
        assert_eq!(read_varint2_u64(&buf, 1), Ok((0xffff, 3)));
        assert!(write_varint2_u64(&mut buf, 0xffff, 2).is_err());
        assert_eq!(buf[2], 0xfe);
    }

    proptest! {
        #[test]
        fn prop_varint2_round_trip(value in any::<u64>()) {
            let encoded = encode_varint2(value);
            prop_assert_eq!(encoded.len(), varint2_size_u64(value));
            prop_assert_eq!(decode_varint2(&encoded), Ok((value, encoded.len())));

            let num = Number::from(value);
            prop_assert_eq!(varint2_size(&num).unwrap(), encoded.len());
            let (decoded, size) = read_varint2(&encoded, 0, true).unwrap();
            prop_assert_eq!(decoded, num);
            prop_assert_eq!(size, encoded.len());
        }

        #[test]
        fn prop_varint2_big_round_trip(bytes in prop::collection::vec(any::<u8>(), 0..24)) {
            let value = Number::Big(BigInt::from_bytes_le(num_bigint::Sign::Plus, &bytes));
            let size = varint2_size(&value).unwrap();
            let mut buf = vec![0u8; size];
            write_varint2(&mut buf, &value, 0).unwrap();
            let (decoded, consumed) = read_varint2(&buf, 0, true).unwrap();
            prop_assert_eq!(decoded, value);
            prop_assert_eq!(consumed, size);
        }
    }
}
