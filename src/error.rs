//! Error type shared by every fallible operation in this crate.

use thiserror::Error;

/// Errors returned by identifier parsing, generation, and encryption.
///
/// Every error is local to the call that produced it; no generator state is left partially
/// updated, so the same generator can be used again right away.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The timestamp does not fit in the 44-bit `timestamp` field.
    #[error("timestamp exceeds 44-bit range: {0} > {max}", max = crate::MAX_TIMESTAMP)]
    TimestampOutOfRange(u64),

    /// A random source was asked for a bit width outside `1..=32`.
    #[error("bits must be 1-32, got {0}")]
    BitsOutOfRange(u32),

    /// A fixed-width byte field had the wrong length.
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    /// A textual representation could not be parsed.
    #[error("invalid string representation: {0}")]
    InvalidFormat(&'static str),

    /// The underlying random source failed.
    #[error("random source failed: {0}")]
    Entropy(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The monotonic generator ran past the largest representable timestamp.
    #[error("timestamp overflow after incrementing for monotonic generation")]
    TimestampOverflow,

    /// The AES key is not 16, 24, or 32 bytes long.
    #[error("AES key must be 16, 24, or 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    /// The encrypted payload did not authenticate under the key.
    #[error("decryption failed")]
    Authentication,

    /// The cipher failed internally while sealing a payload.
    #[error("encryption failed")]
    Crypto,
}

impl Error {
    /// Wraps any error raised by a random source.
    pub fn entropy(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Entropy(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    /// Formats messages with the offending values
    #[test]
    fn formats_messages_with_the_offending_values() {
        assert_eq!(
            Error::TimestampOutOfRange(1 << 44).to_string(),
            "timestamp exceeds 44-bit range: 17592186044416 > 17592186044415"
        );
        assert_eq!(
            Error::InvalidLength {
                expected: 8,
                got: 3
            }
            .to_string(),
            "invalid length: expected 8 bytes, got 3"
        );
        assert_eq!(
            Error::InvalidKeyLength(20).to_string(),
            "AES key must be 16, 24, or 32 bytes, got 20"
        );
    }

    /// Keeps the source of entropy failures
    #[test]
    fn keeps_the_source_of_entropy_failures() {
        use std::error::Error as _;
        let err = Error::entropy("device unplugged");
        assert_eq!(err.to_string(), "random source failed: device unplugged");
        assert!(err.source().is_some());
    }
}
