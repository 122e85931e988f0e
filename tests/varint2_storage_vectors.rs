//! Storage VarInt (Bitcoin Core `VARINT`) vectors
//!
//! The chainstate database and undo files use Core's denser base-128
//! encoding. These vectors come from Core's serialize tests and must match
//! byte-for-byte or a node cannot read its own database after an upgrade.


use blvm_codec::constants::MAX_SAFE_INTEGER;
use blvm_codec::serialization::varint2::{
    decode_varint2, encode_varint2, read_varint2, varint2_size, write_varint2,
};
use blvm_codec::{ErrorKind, Number};
use num_bigint::BigInt;
use test_helpers::bytes;

const CORE_VECTORS: &[(u64, &str)] = &[
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
fn test_core_vectors_encode() {
    for (value, wire) in CORE_VECTORS {
        assert_eq!(encode_varint2(*value), bytes(wire), "encoding of {value:#x}");
    }
}

#[test]
fn test_core_vectors_decode() {
    for (value, wire) in CORE_VECTORS {
        let data = bytes(wire);
        assert_eq!(decode_varint2(&data), Ok((*value, data.len())));

        // Arbitrary-precision path agrees numerically
        let (big, size) = read_varint2(&data, 0, true).unwrap();
        assert_eq!(big, Number::from(*value));
        assert_eq!(size, data.len());
    }
}

/// Values past 2^53-1 need the caller to opt into arbitrary precision
#[test]
fn test_native_read_refuses_promotion() {
    let data = encode_varint2(1 << 60);
    let err = read_varint2(&data, 0, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Bounds);

    let (value, _) = read_varint2(&data, 0, true).unwrap();
    assert_eq!(value, Number::from(1u64 << 60));

    // The last 128 safe values pass the promotion point before their final byte
    for value in [MAX_SAFE_INTEGER - 127, MAX_SAFE_INTEGER] {
        let data = encode_varint2(value as u64);
        assert_eq!(
            read_varint2(&data, 0, false),
            Ok((Number::Native(value), data.len()))
        );
    }
}

/// 128-bit values round-trip through the Number API
#[test]
fn test_wide_values_round_trip() {
    let wide = (BigInt::from(1u8) << 127usize) + BigInt::from(12345u32);
    let value = Number::Big(wide.clone());
    let size = varint2_size(&value).unwrap();

    let mut dst = vec![0u8; size + 2];
    assert_eq!(write_varint2(&mut dst, &value, 2), Ok(size + 2));
    let (decoded, consumed) = read_varint2(&dst, 2, true).unwrap();
    assert_eq!(decoded.into_bigint(), wide);
    assert_eq!(consumed, size);
}

#[test]
fn test_unterminated_and_oversized() {
    // Every byte has the continuation bit set
    let err = decode_varint2(&[0x80, 0x80, 0x80]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Truncated);

    let endless = [0xffu8; 64];
    let err = read_varint2(&endless, 0, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);
}

#[test]
fn test_negative_rejected_on_write() {
    let mut dst = [0u8; 16];
    let err = write_varint2(&mut dst, &Number::Native(-1), 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Bounds);
    assert_eq!(dst, [0u8; 16]);
}
