//! Fixed 64-bit serialization verification tests
//!
//! Output values and lock-time style fields are 8-byte integers. Bitcoin's
//! wire format is little-endian; some storage keys are big-endian so they
//! sort numerically. Both orders must agree with the std encoders for every
//! value either path accepts.
//!
//! Consensus-critical: Endianness differences = network incompatibility

use blvm_codec::amount::to_btc_string;
use blvm_codec::constants::MAX_SAFE_INTEGER;
use blvm_codec::serialization::fixed64::{
    read_i64, read_i64_big, read_i64n, read_u64, read_u64_big, read_u64n, write_i64,
    write_i64_big, write_i64n, write_u64, write_u64_big, write_u64n,
};
use blvm_codec::serialization::{BigEndian, ByteReader, ByteWriter, LittleEndian};
use blvm_codec::{CodecError, ErrorKind, Number};
use num_bigint::BigInt;

/// A 50 BTC coinbase output value as it appears on the wire
#[test]
fn test_output_value_little_endian() {
    let wire = [0x00, 0xf2, 0x05, 0x2a, 0x01, 0x00, 0x00, 0x00];
    let value = read_u64::<LittleEndian>(&wire, 0).unwrap();
    assert_eq!(value, Number::Native(5_000_000_000));
    assert_eq!(to_btc_string(5_000_000_000).unwrap(), "50.0");

    let mut out = [0u8; 8];
    write_u64::<LittleEndian>(&mut out, &value, 0).unwrap();
    assert_eq!(out, wire);
}

#[test]
fn test_big_endian_matches_std() {
    let mut out = [0u8; 8];
    write_u64n::<BigEndian>(&mut out, 0x0102_0304_0506, 0).unwrap();
    assert_eq!(out, 0x0102_0304_0506u64.to_be_bytes());

    write_i64n::<BigEndian>(&mut out, -2, 0).unwrap();
    assert_eq!(out, (-2i64).to_be_bytes());
    assert_eq!(read_i64n::<BigEndian>(&out, 0, false), Ok(-2));
}

#[test]
fn test_native_rejects_beyond_53_bits() {
    let two_53 = 1u64 << 53;
    let mut out = [0u8; 8];
    let err = write_u64n::<LittleEndian>(&mut out, two_53, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Bounds);
    assert_eq!(out, [0u8; 8]);

    let wire = two_53.to_le_bytes();
    assert_eq!(
        read_u64n::<LittleEndian>(&wire, 0, false).unwrap_err().kind(),
        ErrorKind::Bounds
    );
    // force53 keeps only the low 53 bits
    assert_eq!(read_u64n::<LittleEndian>(&wire, 0, true), Ok(0));
    let wire = u64::MAX.to_le_bytes();
    assert_eq!(
        read_u64n::<LittleEndian>(&wire, 0, true),
        Ok(MAX_SAFE_INTEGER as u64)
    );
}

/// 2^53 goes through the arbitrary-precision path and back exactly
#[test]
fn test_big_path_covers_two_pow_53() {
    let two_53 = BigInt::from(1u64 << 53);
    let mut out = [0u8; 8];
    assert_eq!(write_u64_big::<LittleEndian>(&mut out, &two_53, 0), Ok(8));
    assert_eq!(read_u64_big::<LittleEndian>(&out, 0), Ok(two_53.clone()));
    assert_eq!(read_u64::<LittleEndian>(&out, 0), Ok(Number::Big(two_53)));
}

#[test]
fn test_signed_extremes() {
    let mut out = [0u8; 8];
    for value in [i64::MIN, i64::MIN + 1, -1, 0, i64::MAX] {
        let big = BigInt::from(value);
        write_i64_big::<BigEndian>(&mut out, &big, 0).unwrap();
        assert_eq!(out, value.to_be_bytes());
        assert_eq!(read_i64_big::<BigEndian>(&out, 0), Ok(big));
        assert_eq!(read_i64::<BigEndian>(&out, 0).unwrap(), Number::from(value));
    }

    let too_small = BigInt::from(i64::MIN) - 1;
    assert!(write_i64_big::<LittleEndian>(&mut out, &too_small, 0).is_err());
    let too_big = BigInt::from(u64::MAX) + 1;
    assert!(write_u64_big::<LittleEndian>(&mut out, &too_big, 0).is_err());
}

#[test]
fn test_number_dispatch() {
    let mut out = [0u8; 16];
    let end = write_i64::<LittleEndian>(&mut out, &Number::Native(-7), 0).unwrap();
    let end = write_i64::<LittleEndian>(&mut out, &Number::from(i64::MIN), end).unwrap();
    assert_eq!(end, 16);
    assert_eq!(read_i64::<LittleEndian>(&out, 0), Ok(Number::Native(-7)));
    assert_eq!(read_i64::<LittleEndian>(&out, 8), Ok(Number::from(i64::MIN)));

    assert!(matches!(
        read_u64::<LittleEndian>(&out, 12),
        Err(CodecError::TruncatedInput {
            needed: 8,
            available: 4
        })
    ));
}

/// Cursor types compose the little-endian codecs without partial effects
#[test]
fn test_cursor_round_trip() {
    let mut writer = ByteWriter::new();
    writer.write_u32(0x0102_0304);
    writer.write_u64(&Number::from(u64::MAX)).unwrap();
    writer.write_i64(&Number::Native(-1)).unwrap();
    writer.write_varint(0xfd).unwrap();
    writer.write_varint2(0x1234).unwrap();
    assert!(writer.write_u64(&Number::Native(-1)).is_err());

    let bytes = writer.into_inner();
    assert_eq!(&bytes[..4], &[4, 3, 2, 1]);

    let mut reader = ByteReader::new(&bytes);
    assert_eq!(reader.read_u32(), Ok(0x0102_0304));
    assert_eq!(reader.read_u64(), Ok(Number::from(u64::MAX)));
    assert_eq!(reader.read_i64(), Ok(Number::Native(-1)));
    assert_eq!(reader.read_varint(), Ok(0xfd));
    assert_eq!(reader.read_varint2(), Ok(0x1234));
    assert!(reader.is_exhausted());
}
