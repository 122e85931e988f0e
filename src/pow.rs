//! Proof of Work target encoding
//!
//! Block headers carry their target in "compact" form: a 32-bit word with a
//! one-byte exponent, a sign bit and a 23-bit mantissa,
//! `target = mantissa * 256^(exponent - 3)`. The conversion logic follows
//! btcd's port of Bitcoin Core's `SetCompact`/`GetCompact`, including the
//! renormalization step when the mantissa would collide with the sign bit.

use crate::constants::{COMPACT_MANTISSA_MASK, COMPACT_SIGN_BIT, MAX_TARGET_BITS};
use crate::error::{CodecError, Result};
use num_bigint::{BigInt, Sign};
use num_traits::{Signed, ToPrimitive, Zero};

/// A proof-of-work target in either of its two forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Compact(u32),
    Expanded(BigInt),
}

impl Target {
    pub fn expand(&self) -> BigInt {
        match self {
            Target::Compact(bits) => from_compact(*bits),
            Target::Expanded(target) => target.clone(),
        }
    }
}

impl From<u32> for Target {
    fn from(bits: u32) -> Self {
        Target::Compact(bits)
    }
}

impl From<BigInt> for Target {
    fn from(target: BigInt) -> Self {
        Target::Expanded(target)
    }
}

impl From<&BigInt> for Target {
    fn from(target: &BigInt) -> Self {
        Target::Expanded(target.clone())
    }
}

/// ExpandTarget: ℕ32 → ℤ
///
/// Decode a compact word. A zero mantissa always yields zero, whatever the
/// exponent and sign bit say. Exponents up to 3 shift the mantissa right,
/// discarding the low bytes.
///
/// ```
/// use blvm_codec::pow::from_compact;
/// use num_bigint::BigInt;
///
/// assert_eq!(from_compact(0x05009234), BigInt::from(0x92340000u32));
/// assert_eq!(from_compact(0x04923456), BigInt::from(-0x12345600i64));
/// assert_eq!(from_compact(0), BigInt::from(0));
/// ```
pub fn from_compact(compact: u32) -> BigInt {
    if compact == 0 {
        return BigInt::zero();
    }

    let exponent = compact >> 24;
    let negative = compact & COMPACT_SIGN_BIT != 0;
    let mut mantissa = compact & COMPACT_MANTISSA_MASK;

    let num = if exponent <= 3 {
        mantissa >>= 8 * (3 - exponent);
        BigInt::from(mantissa)
    } else {
        BigInt::from(mantissa) << (8 * (exponent - 3)) as usize
    };

    if negative {
        -num
    } else {
        num
    }
}

/// Move a mantissa off the sign bit by giving up its low byte
///
/// A mantissa with 0x800000 set would decode as negative, so it is shifted
/// right one byte and the exponent bumped to compensate.
#[inline]
pub fn renormalize(mantissa: u32, exponent: u32) -> (u32, u32) {
    if mantissa & COMPACT_SIGN_BIT != 0 {
        (mantissa >> 8, exponent + 1)
    } else {
        (mantissa, exponent)
    }
}

/// CompressTarget: ℤ → ℕ32
///
/// Encode a target into compact form. Precision below the top three bytes is
/// dropped, so `from_compact(to_compact(x))` may be smaller than `x`, but
/// `to_compact(from_compact(c)) == c` for every `c` this function produced.
///
/// # Errors
///
/// `BoundsViolation` if the magnitude is too long for a one-byte exponent.
pub fn to_compact(num: &BigInt) -> Result<u32> {
    if num.is_zero() {
        return Ok(0);
    }

    let magnitude = num.magnitude();
    let exponent = u32::try_from((magnitude.bits() + 7) / 8)
        .map_err(|_| CodecError::bounds("Target too large for compact form"))?;

    let top = if exponent <= 3 {
        magnitude.to_u32().map(|m| m << (8 * (3 - exponent)))
    } else {
        (magnitude >> (8 * (exponent - 3)) as usize).to_u32()
    };
    let mantissa =
        top.ok_or_else(|| CodecError::bounds("Compact mantissa exceeds three bytes"))?;

    let (mantissa, exponent) = renormalize(mantissa, exponent);

    if exponent > 0xff {
        return Err(CodecError::bounds("Target too large for compact form"));
    }

    let mut compact = (exponent << 24) | mantissa;

    if num.is_negative() {
        compact |= COMPACT_SIGN_BIT;
    }

    Ok(compact)
}

/// Decode a compact word under consensus rules
///
/// Mirrors Bitcoin Core's `SetCompact` overflow and sign flags: negative,
/// zero and overflowing targets are rejected.
pub fn decode_compact_checked(bits: u32) -> Result<BigInt> {
    let exponent = bits >> 24;
    let mantissa = bits & COMPACT_MANTISSA_MASK;

    if mantissa != 0 && bits & COMPACT_SIGN_BIT != 0 {
        return Err(CodecError::InvalidProofOfWork(
            format!("Negative target {bits:#010x}").into(),
        ));
    }

    let overflow = mantissa != 0
        && (exponent > 34
            || (mantissa > 0xff && exponent > 33)
            || (mantissa > 0xffff && exponent > 32));
    if overflow {
        return Err(CodecError::InvalidProofOfWork(
            format!("Target {bits:#010x} overflows 256 bits").into(),
        ));
    }

    let target = from_compact(bits);
    if target.is_zero() {
        return Err(CodecError::InvalidProofOfWork(
            format!("Zero target {bits:#010x}").into(),
        ));
    }

    debug_assert!(target.bits() <= MAX_TARGET_BITS);
    Ok(target)
}

/// TestTarget: 𝕊 × Target → {true, false}
///
/// Interpret `hash` as a little-endian unsigned integer and accept it iff it
/// does not exceed the target. Zero and negative targets fail closed.
///
/// ```
/// use blvm_codec::pow::test_target;
///
/// assert!(test_target(&[0u8; 32], 0x207fffff));
/// assert!(!test_target(&[0u8; 32], 0));
/// ```
pub fn test_target(hash: &[u8], target: impl Into<Target>) -> bool {
    let target = target.into().expand();

    if target.is_negative() || target.is_zero() {
        tracing::trace!(%target, "target fails closed");
        return false;
    }

    BigInt::from_bytes_le(Sign::Plus, hash) <= target
}

/// [`test_target`] against a header's `bits` field
#[inline]
pub fn test_compact_target(hash: &[u8], bits: u32) -> bool {
    test_target(hash, Target::Compact(bits))
}

/// CheckProofOfWork: ℍ × ℕ32 × ℕ32 → {true, false}
///
/// Full header check: `bits` must decode to a valid target no easier than
/// `pow_limit`, and `hash` must meet it.
///
/// # Errors
///
/// `InvalidProofOfWork` if `bits` is negative, zero, overflowing or above
/// the limit. A well-formed target the hash misses yields `Ok(false)`.
pub fn check_proof_of_work(hash: &[u8], bits: u32, pow_limit: u32) -> Result<bool> {
    let target = decode_compact_checked(bits)?;

    if target > from_compact(pow_limit) {
        tracing::debug!(bits, pow_limit, "target above proof-of-work limit");
        return Err(CodecError::InvalidProofOfWork(
            format!("Target {bits:#010x} above limit {pow_limit:#010x}").into(),
        ));
    }

    Ok(test_target(hash, Target::Expanded(target)))
}

/// 32-byte little-endian form of a non-negative target
pub fn target_to_bytes(target: &BigInt) -> Result<[u8; 32]> {
    let (sign, bytes) = target.to_bytes_le();
    if sign == Sign::Minus || bytes.len() > 32 {
        return Err(CodecError::bounds("Target does not fit 256 bits"));
    }
    let mut out = [0u8; 32];
    out[..bytes.len()].copy_from_slice(&bytes);
    Ok(out)
}
