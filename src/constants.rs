//! Numeric bounds and consensus constants used by the codecs

/// Largest magnitude the native fast paths accept: 2^53 - 1
pub const MAX_SAFE_INTEGER: i64 = 0x1f_ffff_ffff_ffff;

/// Largest magnitude safe for adding two native values: 2^52 - 1
///
/// `(MAX_SAFE_INTEGER - 1) / 2`
pub const MAX_SAFE_ADDITION: i64 = 0xf_ffff_ffff_ffff;

/// Mask applied to the high 32-bit half by a forced 53-bit read
pub const HI_53_MASK: u32 = 0x001f_ffff;

/// Bits of the high 32-bit half that must be clear for a safe native value
pub const HI_UNSAFE_BITS: u32 = 0xffe0_0000;

/// Once the native VarInt2 accumulator reaches this value the next
/// `acc * 128 + 127 + 1` step could exceed 2^53, so decoding promotes
pub const VARINT2_PROMOTE_THRESHOLD: u64 = 0x3fff_ffff_ffff;

/// Upper bound on the bit length of a VarInt2 accumulator before it is
/// considered unterminated
pub const VARINT2_MAX_BITS: u64 = 256;

/// Longest VarInt2 encoding of a u64 value
pub const VARINT2_MAX_U64_SIZE: usize = 10;

/// Satoshis per BTC
pub const SATOSHIS_PER_BTC: i64 = 100_000_000;

/// Maximum money supply: 21,000,000 BTC in satoshis
pub const MAX_MONEY: i64 = 21_000_000 * SATOSHIS_PER_BTC;

/// Number of fractional digits in a BTC decimal string
pub const BTC_DECIMALS: usize = 8;

/// Longest digit string `to_btc_string` accepts (MAX_SAFE_INTEGER has 16)
pub const MAX_AMOUNT_DIGITS: usize = 16;

/// Integer part of MAX_SAFE_INTEGER expressed in BTC
pub const MAX_SAFE_BTC_HI: u64 = 90_071_992;

/// Fractional part (in satoshis) of MAX_SAFE_INTEGER expressed in BTC
pub const MAX_SAFE_BTC_LO: u64 = 54_740_991;

/// Mainnet proof-of-work limit (minimum difficulty)
pub const MAX_TARGET: u32 = 0x1d00ffff;

/// Regtest proof-of-work limit
pub const REGTEST_MAX_TARGET: u32 = 0x207fffff;

/// Sign bit of a compact target word
pub const COMPACT_SIGN_BIT: u32 = 0x0080_0000;

/// Mantissa mask of a compact target word
pub const COMPACT_MANTISSA_MASK: u32 = 0x007f_ffff;

/// Largest target bit length a compact word may decode to without overflow
pub const MAX_TARGET_BITS: u64 = 256;
