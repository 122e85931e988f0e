//! Configuration for blvm-codec
//!
//! The codec free functions take every limit as an argument. This module
//! holds the few operational knobs that the [`crate::ConsensusCodec`] facade
//! applies on top: storage varint width, the network proof-of-work limit,
//! amount sign policy and rejection logging. Settings can be loaded from a
//! JSON file, from environment variables, or built programmatically.

use crate::constants::{MAX_TARGET, VARINT2_MAX_BITS};
use crate::error::{CodecError, Result};
use crate::pow::decode_compact_checked;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// VarInt2 (storage varint) limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Varint2Config {
    /// Largest accumulator accepted before a value is rejected as malformed
    /// Default: 256 bits
    #[serde(default = "default_varint2_max_bits")]
    pub max_bits: u64,
}

fn default_varint2_max_bits() -> u64 {
    VARINT2_MAX_BITS
}

impl Default for Varint2Config {
    fn default() -> Self {
        Self {
            max_bits: VARINT2_MAX_BITS,
        }
    }
}

/// Proof-of-work configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowConfig {
    /// Easiest target the network accepts, in compact form
    /// Default: 0x1d00ffff (mainnet). Regtest uses 0x207fffff.
    #[serde(default = "default_pow_limit_bits")]
    pub pow_limit_bits: u32,
}

fn default_pow_limit_bits() -> u32 {
    MAX_TARGET
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            pow_limit_bits: MAX_TARGET,
        }
    }
}

/// Amount formatting and parsing policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountConfig {
    /// Accept negative amounts (fee deltas, balance changes)
    /// Default: true
    #[serde(default = "default_true")]
    pub allow_negative: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AmountConfig {
    fn default() -> Self {
        Self {
            allow_negative: true,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Log every rejected encoding at debug level
    /// Default: false
    #[serde(default)]
    pub log_rejections: bool,
}

/// Complete codec configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CodecConfig {
    #[serde(default)]
    pub varint2: Varint2Config,

    #[serde(default)]
    pub pow: PowConfig,

    #[serde(default)]
    pub amount: AmountConfig,

    #[serde(default)]
    pub debug: DebugConfig,
}

/// Parse an environment override, ignoring unset or unparseable values
fn env_override<T: std::str::FromStr>(key: &str, target: &mut T) {
    if let Ok(val) = std::env::var(key) {
        match val.trim().parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => tracing::warn!(key, value = %val, "ignoring unparseable config override"),
        }
    }
}

/// Compact bits are usually written in hex
fn env_override_bits(key: &str, target: &mut u32) {
    if let Ok(val) = std::env::var(key) {
        let val = val.trim();
        let parsed = match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => val.parse::<u32>(),
        };
        match parsed {
            Ok(bits) => *target = bits,
            Err(_) => tracing::warn!(key, value = %val, "ignoring unparseable config override"),
        }
    }
}

impl CodecConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: `BLVM_CODEC_<SECTION>_<KEY>`
    ///
    /// Examples:
    /// - `BLVM_CODEC_POW_LIMIT_BITS=0x207fffff`
    /// - `BLVM_CODEC_DEBUG_LOG_REJECTIONS=true`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        env_override("BLVM_CODEC_VARINT2_MAX_BITS", &mut config.varint2.max_bits);
        env_override_bits("BLVM_CODEC_POW_LIMIT_BITS", &mut config.pow.pow_limit_bits);
        env_override(
            "BLVM_CODEC_AMOUNT_ALLOW_NEGATIVE",
            &mut config.amount.allow_negative,
        );
        env_override(
            "BLVM_CODEC_DEBUG_LOG_REJECTIONS",
            &mut config.debug.log_rejections,
        );

        config
    }

    /// Read a JSON config file; missing sections and keys take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CodecError::Config(format!("Failed to read {}: {e}", path.display()).into())
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            CodecError::Config(format!("Failed to parse {}: {e}", path.display()).into())
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| CodecError::Config(format!("Failed to serialize config: {e}").into()))?;
        std::fs::write(path, text).map_err(|e| {
            CodecError::Config(format!("Failed to write {}: {e}", path.display()).into())
        })
    }

    /// Reject settings the codecs cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.varint2.max_bits == 0 || self.varint2.max_bits > VARINT2_MAX_BITS {
            return Err(CodecError::Config(
                format!(
                    "varint2.max_bits must be in 1..={VARINT2_MAX_BITS}, got {}",
                    self.varint2.max_bits
                )
                .into(),
            ));
        }

        decode_compact_checked(self.pow.pow_limit_bits).map_err(|e| {
            CodecError::Config(format!("pow.pow_limit_bits is not a valid target: {e}").into())
        })?;

        Ok(())
    }
}

/// Global codec configuration instance
static GLOBAL_CODEC_CONFIG: std::sync::OnceLock<CodecConfig> = std::sync::OnceLock::new();

/// Initialize global codec configuration
///
/// Fails if the config is invalid or one was already installed.
pub fn init_codec_config(config: CodecConfig) -> Result<()> {
    config.validate()?;
    GLOBAL_CODEC_CONFIG
        .set(config)
        .map_err(|_| CodecError::Config("Codec config already initialized".into()))
}

/// Get global codec configuration
///
/// Returns the global config if initialized, otherwise the environment
/// overrides on top of defaults.
pub fn get_codec_config() -> CodecConfig {
    GLOBAL_CODEC_CONFIG
        .get()
        .cloned()
        .unwrap_or_else(CodecConfig::from_env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::REGTEST_MAX_TARGET;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.varint2.max_bits, 256);
        assert_eq!(config.pow.pow_limit_bits, 0x1d00ffff);
        assert!(config.amount.allow_negative);
        assert!(!config.debug.log_rejections);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: CodecConfig =
            serde_json::from_str(r#"{"pow": {"pow_limit_bits": 545259519}}"#).unwrap();
        assert_eq!(config.pow.pow_limit_bits, REGTEST_MAX_TARGET);
        assert_eq!(config.varint2, Varint2Config::default());

        let empty: CodecConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, CodecConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = CodecConfig::default();
        config.varint2.max_bits = 0;
        assert!(config.validate().is_err());
        config.varint2.max_bits = 257;
        assert!(config.validate().is_err());

        let mut config = CodecConfig::default();
        config.pow.pow_limit_bits = 0;
        assert!(config.validate().is_err());
        config.pow.pow_limit_bits = 0x04923456;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_file_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "blvm-codec-config-{}.json",
            std::process::id()
        ));
        let mut config = CodecConfig::default();
        config.debug.log_rejections = true;
        config.amount.allow_negative = false;

        config.to_json_file(&path).unwrap();
        let loaded = CodecConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = CodecConfig::from_json_file("/nonexistent/blvm-codec.json").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }
}
