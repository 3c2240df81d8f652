//! Compact, time-sortable 64-bit identifiers
//!
//! ```rust
//! let id = nano64::nano64()?;
//! println!("{}", id); // e.g. "18C1F3A5B2E-0F3A9"
//! println!("{:?}", id.to_bytes()); // as 8-byte big-endian array
//! println!("{}", id.timestamp()); // embedded Unix timestamp in milliseconds
//! # Ok::<(), nano64::Error>(())
//! ```
//!
//! A Nano64 is half the size of a ULID or UUID and fits in a single `BIGINT` column. Sorting
//! identifiers as unsigned integers, as big-endian bytes, or as strings gives the same order:
//! by timestamp first and then by the random field.
//!
//! # Field and bit layout
//!
//! This implementation produces identifiers with the following bit layout:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          unix_ts_ms                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      unix_ts_ms       |                random                 |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Where:
//!
//! - The 44-bit `unix_ts_ms` field is dedicated to the Unix timestamp in milliseconds, which
//!   lasts until the year 2527.
//! - The 20-bit `random` field is filled with a cryptographically strong random number, or, for
//!   monotonic generation, incremented by one for each new identifier generated within the same
//!   timestamp.
//!
//! The textual form is 16 uppercase hexadecimal digits with a dash between the timestamp and
//! random fields, e.g. `11F71FB04CB-12345`.
//!
//! # Generation modes
//!
//! - [`nano64()`] and [`MonotonicGenerator`] guarantee strictly increasing identifiers. When the
//!   random field is exhausted within a millisecond, the timestamp is incremented; therefore,
//!   the timestamp may run slightly ahead of the real-time clock. A clock that moves backwards
//!   is ignored until it catches up with the last timestamp issued.
//! - [`nano64_random()`] and [`Generator`] draw a fresh random field for every identifier and
//!   keep no state.
//!
//! # Encrypted identifiers
//!
//! [`EncryptionContext`] hides the embedded timestamp from anyone without the key by sealing
//! the identifier with AES-GCM into a 36-byte payload:
//!
//! ```rust
//! use nano64::EncryptionContext;
//!
//! let ctx = EncryptionContext::new(&[0x42; 32])?;
//! let enc = ctx.generate_encrypted_now()?;
//! println!("{}", enc); // 72 uppercase hexadecimal digits
//! assert_eq!(ctx.decrypt_hex(&enc.to_hex())?, enc.id());
//! # Ok::<(), nano64::Error>(())
//! ```
//!
//! # Crate features
//!
//! Default features:
//!
//! - `global_gen`: Enables the process-wide [`nano64()`] and [`nano64_random()`] entry points.
//!
//! Optional features:
//!
//! - `serde`: Enables serialization and deserialization of [`Nano64`] and [`NullNano64`].
//! - `rusqlite`: Enables SQLite bindings of [`Nano64`] and [`NullNano64`] via `rusqlite`.

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Width of the timestamp field in bits.
pub const TIMESTAMP_BITS: u32 = 44;

/// Width of the random field in bits.
pub const RANDOM_BITS: u32 = 20;

/// Largest value of the timestamp field.
pub const MAX_TIMESTAMP: u64 = (1 << TIMESTAMP_BITS) - 1;

/// Largest value of the random field.
pub const MAX_RANDOM: u32 = (1 << RANDOM_BITS) - 1;

/// Length of the AES-GCM initialization vector in bytes.
pub const IV_LENGTH: usize = 12;

/// Length of the AES-GCM authentication tag in bytes.
pub const TAG_LENGTH: usize = 16;

/// Length of an encrypted payload in bytes.
pub const PAYLOAD_LENGTH: usize = IV_LENGTH + 8 + TAG_LENGTH;

mod error;
pub use error::Error;

mod id;
pub use id::Nano64;

mod null;
pub use null::NullNano64;

pub mod generator;
pub use generator::monotonic::{MonotonicGenerator, MonotonicState};
pub use generator::{Generator, OsRandSource, RandSource, StdSystemTime, TimeSource};

mod encrypted;
pub use encrypted::{EncryptedNano64, EncryptionContext};

mod global_gen;
#[cfg(feature = "global_gen")]
pub use global_gen::{nano64, nano64_random};
