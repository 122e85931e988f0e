//! # blvm-codec
//!
//! Consensus-critical numeric and binary codecs for a Bitcoin node.
//!
//! Every higher-level structure a node handles (transactions, block headers,
//! proof-of-work targets, monetary amounts) bottoms out in the integer
//! encodings implemented here. Any divergence from Bitcoin Core's byte
//! layouts splits consensus, so each codec is a small, pure, exhaustively
//! tested function.
//!
//! ## Modules
//!
//! - [`serialization`]: CompactSize VarInt (wire), VarInt2 (storage) and
//!   fixed 64-bit integers in either byte order, plus cursor types
//! - [`pow`]: compact target expansion, compression and hash comparison
//! - [`amount`]: satoshi <-> BTC decimal string conversion without floats
//! - [`ordering`]: byte comparison and sorted-sequence helpers
//! - [`types`]: the [`Number`] dual representation (53-bit native or
//!   arbitrary precision)
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: codecs are deterministic and never read global state
//! 2. **No Partial Effects**: encoders check capacity before writing a byte
//! 3. **Canonical Only**: decoders reject every non-minimal encoding
//! 4. **Configuration at the Edge**: only [`ConsensusCodec`] consults
//!   [`config::CodecConfig`]
//!
//! ## Usage
//!
//! ```rust
//! use blvm_codec::serialization::varint::{decode_varint, encode_varint};
//! use blvm_codec::pow::test_target;
//!
//! let bytes = encode_varint(0xfd);
//! assert_eq!(bytes, vec![0xfd, 0xfd, 0x00]);
//! assert_eq!(decode_varint(&bytes).unwrap(), (0xfd, 3));
//!
//! assert!(test_target(&[0u8; 32], 0x207fffff));
//! ```

pub mod amount;
pub mod config;
pub mod constants;
pub mod error;
pub mod ordering;
pub mod pow;
pub mod serialization;
pub mod types;

pub use amount::Amount;
pub use config::CodecConfig;
pub use error::{CodecError, ErrorKind, Result};
pub use types::Number;

/// Configured entry point for node-facing callers
///
/// Wraps the free codec functions with the limits and policies from a
/// [`CodecConfig`]: the network proof-of-work limit, the VarInt2 bit bound,
/// the negative-amount policy and optional rejection logging.
#[derive(Debug, Clone, Default)]
pub struct ConsensusCodec {
    config: CodecConfig,
}

impl ConsensusCodec {
    /// Codec using the global configuration
    pub fn new() -> Self {
        Self {
            config: config::get_codec_config(),
        }
    }

    pub fn with_config(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Log a failed operation when rejection logging is on
    fn observe<T>(&self, operation: &'static str, result: Result<T>) -> Result<T> {
        if self.config.debug.log_rejections {
            if let Err(e) = &result {
                tracing::debug!(operation, kind = ?e.kind(), error = %e, "codec rejection");
            }
        }
        result
    }

    /// Read a wire VarInt at `offset`
    pub fn read_varint(&self, data: &[u8], offset: usize) -> Result<(u64, usize)> {
        self.observe(
            "read_varint",
            serialization::varint::read_varint(data, offset),
        )
    }

    /// Read a storage VarInt at `offset` under the configured bit limit
    pub fn read_varint2(&self, data: &[u8], offset: usize) -> Result<(Number, usize)> {
        self.observe(
            "read_varint2",
            serialization::varint2::read_varint2_with_limit(
                data,
                offset,
                true,
                self.config.varint2.max_bits,
            ),
        )
    }

    /// Check a header hash against its `bits` and the network limit
    pub fn check_proof_of_work(&self, hash: &types::Hash, bits: u32) -> Result<bool> {
        self.observe(
            "check_proof_of_work",
            pow::check_proof_of_work(hash, bits, self.config.pow.pow_limit_bits),
        )
    }

    /// Expanded network proof-of-work limit
    pub fn pow_limit(&self) -> num_bigint::BigInt {
        pow::from_compact(self.config.pow.pow_limit_bits)
    }

    pub fn format_amount(&self, satoshis: i64) -> Result<String> {
        let result = self
            .check_sign(satoshis)
            .and_then(|()| amount::to_btc_string(satoshis));
        self.observe("format_amount", result)
    }

    pub fn parse_amount(&self, text: &str) -> Result<i64> {
        let result = amount::from_btc_string(text)
            .and_then(|satoshis| self.check_sign(satoshis).map(|()| satoshis));
        self.observe("parse_amount", result)
    }

    fn check_sign(&self, satoshis: i64) -> Result<()> {
        if satoshis < 0 && !self.config.amount.allow_negative {
            return Err(CodecError::InvalidAmount(
                "Negative amounts are disabled".into(),
            ));
        }
        Ok(())
    }
}
