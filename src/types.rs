//! Core numeric types shared by the codecs

use crate::constants::MAX_SAFE_INTEGER;
use crate::error::{CodecError, Result};
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;

/// 256-bit hash in internal (little-endian) byte order
pub type Hash = [u8; 32];

/// A 64-bit (or wider) integer in one of its two representations
///
/// `Native` holds values whose magnitude is at most [`MAX_SAFE_INTEGER`];
/// codecs that produce it guarantee that bound. `Big` is the
/// arbitrary-precision fallback. Equality and ordering are numeric, so
/// `Native(5) == Big(5)`.
#[derive(Debug, Clone)]
pub enum Number {
    Native(i64),
    Big(BigInt),
}

impl Number {
    /// Native value, failing if the magnitude exceeds the safe range
    pub fn native(value: i64) -> Result<Self> {
        if !is_safe_integer(value) {
            return Err(CodecError::bounds("Number exceeds 2^53-1"));
        }
        Ok(Number::Native(value))
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Number::Native(_))
    }

    pub fn is_big(&self) -> bool {
        matches!(self, Number::Big(_))
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Number::Native(n) => *n < 0,
            Number::Big(n) => n.is_negative(),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Native(n) => *n == 0,
            Number::Big(n) => n.is_zero(),
        }
    }

    /// Bit length of the magnitude
    pub fn bit_length(&self) -> u64 {
        match self {
            Number::Native(n) => u64::from(64 - n.unsigned_abs().leading_zeros()),
            Number::Big(n) => n.bits(),
        }
    }

    pub fn to_bigint(&self) -> BigInt {
        match self {
            Number::Native(n) => BigInt::from(*n),
            Number::Big(n) => n.clone(),
        }
    }

    pub fn into_bigint(self) -> BigInt {
        match self {
            Number::Native(n) => BigInt::from(n),
            Number::Big(n) => n,
        }
    }

    pub fn to_u64(&self) -> Option<u64> {
        match self {
            Number::Native(n) => u64::try_from(*n).ok(),
            Number::Big(n) => n.to_u64(),
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Number::Native(n) => Some(*n),
            Number::Big(n) => n.to_i64(),
        }
    }

    /// Collapse a `Big` holding a safe value into `Native`
    pub fn normalize(self) -> Self {
        match self {
            Number::Big(n) => match n.to_i64() {
                Some(v) if is_safe_integer(v) => Number::Native(v),
                _ => Number::Big(n),
            },
            native => native,
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        if is_safe_integer(value) {
            Number::Native(value)
        } else {
            Number::Big(BigInt::from(value))
        }
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        if value <= MAX_SAFE_INTEGER as u64 {
            Number::Native(value as i64)
        } else {
            Number::Big(BigInt::from(value))
        }
    }
}

impl From<u32> for Number {
    fn from(value: u32) -> Self {
        Number::Native(i64::from(value))
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Native(i64::from(value))
    }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number::Big(value)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Number::Native(a), Number::Native(b)) => a.cmp(b),
            _ => self.to_bigint().cmp(&other.to_bigint()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Native(n) => write!(f, "{n}"),
            Number::Big(n) => write!(f, "{n}"),
        }
    }
}

/// Magnitude fits the native fast path
#[inline]
pub fn is_safe_integer(value: i64) -> bool {
    value.unsigned_abs() <= MAX_SAFE_INTEGER as u64
}

#[inline]
pub fn is_int32(value: i64) -> bool {
    value.unsigned_abs() <= 0x7fff_ffff
}

#[inline]
pub fn is_uint32(value: i64) -> bool {
    (0..=0xffff_ffff).contains(&value)
}
