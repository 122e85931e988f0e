//! Error types for codec operations

use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum CodecError {
    /// Magnitude outside the safe-integer or 64-bit range
    #[error("Bounds violation: {0}")]
    BoundsViolation(Cow<'static, str>),

    /// Non-canonical or structurally invalid encoding
    #[error("Malformed encoding: {0}")]
    MalformedEncoding(Cow<'static, str>),

    #[error("Truncated input: needed {needed} bytes, {available} available")]
    TruncatedInput { needed: usize, available: usize },

    #[error("Insufficient capacity: needed {needed} bytes, {available} available")]
    InsufficientCapacity { needed: usize, available: usize },

    #[error("Invalid amount: {0}")]
    InvalidAmount(Cow<'static, str>),

    #[error("Invalid proof of work: {0}")]
    InvalidProofOfWork(Cow<'static, str>),

    #[error("Configuration error: {0}")]
    Config(Cow<'static, str>),
}

/// Coarse classification of a [`CodecError`]
///
/// Peer-facing layers use this to decide whether a failure is the remote
/// side's fault (malformed/truncated data) or a local programming error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Bounds,
    Malformed,
    Truncated,
    Capacity,
    Config,
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::BoundsViolation(_) => ErrorKind::Bounds,
            CodecError::MalformedEncoding(_)
            | CodecError::InvalidAmount(_)
            | CodecError::InvalidProofOfWork(_) => ErrorKind::Malformed,
            CodecError::TruncatedInput { .. } => ErrorKind::Truncated,
            CodecError::InsufficientCapacity { .. } => ErrorKind::Capacity,
            CodecError::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn bounds(msg: impl Into<Cow<'static, str>>) -> Self {
        CodecError::BoundsViolation(msg.into())
    }

    pub(crate) fn malformed(msg: impl Into<Cow<'static, str>>) -> Self {
        CodecError::MalformedEncoding(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Fail with `TruncatedInput` unless `data[offset..offset + len]` exists
#[inline]
pub(crate) fn ensure_readable(data: &[u8], offset: usize, len: usize) -> Result<()> {
    let available = data.len().saturating_sub(offset);
    if available < len {
        return Err(CodecError::TruncatedInput {
            needed: len,
            available,
        });
    }
    Ok(())
}

/// Fail with `InsufficientCapacity` unless `dst[offset..offset + len]` exists
#[inline]
pub(crate) fn ensure_writable(dst: &[u8], offset: usize, len: usize) -> Result<()> {
    let available = dst.len().saturating_sub(offset);
    if available < len {
        return Err(CodecError::InsufficientCapacity {
            needed: len,
            available,
        });
    }
    Ok(())
}
