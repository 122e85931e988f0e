//! Satoshi amounts and their decimal BTC form
//!
//! Conversion never goes through floating point. Satoshi counts are split
//! into an integer part and an eight-digit fraction as strings, and parsing
//! rebuilds the count from the two parts. Both directions stay inside the
//! 53-bit safe range so values survive JSON round-trips.

use crate::constants::{
    BTC_DECIMALS, MAX_AMOUNT_DIGITS, MAX_SAFE_BTC_HI, MAX_SAFE_BTC_LO, MAX_SAFE_INTEGER,
    SATOSHIS_PER_BTC,
};
use crate::error::{CodecError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Format a satoshi count as a BTC decimal string
///
/// Trailing fractional zeros are trimmed but at least one fraction digit is
/// kept: `100000000` formats as `"1.0"`.
///
/// ```
/// use blvm_codec::amount::to_btc_string;
///
/// assert_eq!(to_btc_string(100_000_000).unwrap(), "1.0");
/// assert_eq!(to_btc_string(-1).unwrap(), "-0.00000001");
/// ```
pub fn to_btc_string(satoshis: i64) -> Result<String> {
    let negative = satoshis < 0;
    let magnitude = satoshis.unsigned_abs();

    if magnitude > MAX_SAFE_INTEGER as u64 {
        return Err(CodecError::bounds("Number exceeds 2^53-1"));
    }

    let mut digits = magnitude.to_string();
    if digits.len() > MAX_AMOUNT_DIGITS {
        return Err(CodecError::bounds("Number exceeds 2^53-1"));
    }

    if digits.len() <= BTC_DECIMALS {
        digits.insert_str(0, &"0".repeat(BTC_DECIMALS + 1 - digits.len()));
    }

    let (hi, lo) = digits.split_at(digits.len() - BTC_DECIMALS);
    let lo = lo.trim_end_matches('0');
    let lo = if lo.is_empty() { "0" } else { lo };

    let sign = if negative { "-" } else { "" };
    Ok(format!("{sign}{hi}.{lo}"))
}

/// Whether `text` is shaped like a decimal amount
///
/// Accepts an optional `-`, digits, and at most one decimal point followed by
/// digits. Either side of the point may be empty, but not both.
pub fn is_btc_string(text: &str) -> bool {
    let body = text.strip_prefix('-').unwrap_or(text);
    if body.is_empty() || body == "." {
        return false;
    }

    let mut parts = body.splitn(2, '.');
    let hi = parts.next().unwrap_or("");
    let lo = parts.next().unwrap_or("");

    hi.bytes().all(|b| b.is_ascii_digit()) && lo.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a BTC decimal string into satoshis
///
/// Leading integer zeros and trailing fraction zeros are ignored. More than
/// eight fraction digits, or a value past 2^53-1 satoshis, is rejected.
///
/// ```
/// use blvm_codec::amount::from_btc_string;
///
/// assert_eq!(from_btc_string("0.00000001").unwrap(), 1);
/// assert_eq!(from_btc_string("-21").unwrap(), -2_100_000_000);
/// assert!(from_btc_string("1.1.1").is_err());
/// ```
pub fn from_btc_string(text: &str) -> Result<i64> {
    if !is_btc_string(text) {
        tracing::trace!(text, "rejecting non-decimal amount");
        return Err(CodecError::InvalidAmount("Non-BTC value for conversion".into()));
    }

    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let (hi, lo) = body.split_once('.').unwrap_or((body, ""));
    let hi = hi.trim_start_matches('0');
    let lo = lo.trim_end_matches('0');

    if hi.len() > BTC_DECIMALS {
        return Err(CodecError::bounds("Number exceeds 2^53-1"));
    }
    if lo.len() > BTC_DECIMALS {
        return Err(CodecError::InvalidAmount("Too many decimal places".into()));
    }

    let hi = parse_digits(hi);
    let lo = parse_digits(lo) * 10u64.pow((BTC_DECIMALS - lo.len()) as u32);

    if !(hi < MAX_SAFE_BTC_HI || (hi == MAX_SAFE_BTC_HI && lo <= MAX_SAFE_BTC_LO)) {
        return Err(CodecError::bounds("Number exceeds 2^53-1"));
    }

    // Bounded by MAX_SAFE_INTEGER above
    let satoshis = (hi * SATOSHIS_PER_BTC as u64 + lo) as i64;
    Ok(if negative { -satoshis } else { satoshis })
}

/// At most eight ASCII digits, already validated
fn parse_digits(digits: &str) -> u64 {
    digits
        .bytes()
        .fold(0u64, |acc, b| acc * 10 + u64::from(b - b'0'))
}

/// Whether a satoshi count can be formatted
pub fn is_satoshi(value: i64) -> bool {
    to_btc_string(value).is_ok()
}

/// Whether a string parses as a BTC amount
pub fn is_btc(text: &str) -> bool {
    from_btc_string(text).is_ok()
}

/// A satoshi amount that displays and serializes as a BTC decimal string
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Fails if the count is outside the safe range
    pub fn from_sat(satoshis: i64) -> Result<Self> {
        if satoshis.unsigned_abs() > MAX_SAFE_INTEGER as u64 {
            return Err(CodecError::bounds("Number exceeds 2^53-1"));
        }
        Ok(Amount(satoshis))
    }

    pub fn to_sat(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl TryFrom<i64> for Amount {
    type Error = CodecError;

    fn try_from(satoshis: i64) -> Result<Self> {
        Amount::from_sat(satoshis)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Construction keeps the value in range, so formatting cannot fail
        match to_btc_string(self.0) {
            Ok(text) => f.write_str(&text),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl FromStr for Amount {
    type Err = CodecError;

    fn from_str(text: &str) -> Result<Self> {
        from_btc_string(text).map(Amount)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let text = to_btc_string(self.0).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
