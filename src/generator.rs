//! Nano64 generators and the random number and clock interfaces they consume.

use crate::{Error, Nano64, MAX_TIMESTAMP, RANDOM_BITS};

pub mod monotonic;
pub mod with_rand08;


/// A trait that defines the random number generator interface for Nano64 generators.
///
/// Methods take `&self` so a single source can be shared by concurrent callers; sources with
/// internal state must provide their own synchronization (see [`with_rand08::Adapter`]).
///
/// The trait is also implemented for closures of type `Fn(u32) -> Result<u32, Error>`.
pub trait RandSource {
    /// Returns a random number whose low `bits` bits are significant.
    ///
    /// Implementations should reject `bits` outside `1..=32` with [`Error::BitsOutOfRange`]
    /// and report any failure of the underlying source as [`Error::Entropy`] instead of
    /// blocking or degrading the output.
    fn draw_bits(&self, bits: u32) -> Result<u32, Error>;
}

impl<F: Fn(u32) -> Result<u32, Error>> RandSource for F {
    fn draw_bits(&self, bits: u32) -> Result<u32, Error> {
        self(bits)
    }
}

/// A trait that defines the system clock interface for Nano64 generators.
///
/// The trait is also implemented for closures of type `Fn() -> u64`.
pub trait TimeSource {
    /// Returns the current Unix timestamp in milliseconds.
    fn unix_ts_ms(&self) -> u64;
}

impl<F: Fn() -> u64> TimeSource for F {
    fn unix_ts_ms(&self) -> u64 {
        self()
    }
}

/// The default random number generator, drawing from the operating system's cryptographically
/// secure source.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Default)]
pub struct OsRandSource;

impl RandSource for OsRandSource {
    fn draw_bits(&self, bits: u32) -> Result<u32, Error> {
        use rand::{rngs::OsRng, RngCore};

        check_bits(bits)?;
        let mut buffer = [0u8; 4];
        OsRng.try_fill_bytes(&mut buffer).map_err(|err| {
            tracing::warn!(error = %err, "operating system random source failed");
            Error::entropy(err)
        })?;
        Ok(u32::from_be_bytes(buffer) >> (32 - bits))
    }
}

/// The default [`TimeSource`] that uses [`std::time::SystemTime`].
///
/// A system clock set before the Unix epoch reads as zero.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Default)]
pub struct StdSystemTime;

impl TimeSource for StdSystemTime {
    fn unix_ts_ms(&self) -> u64 {
        use std::time;
        time::SystemTime::now()
            .duration_since(time::UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64)
    }
}

/// Returns an error if `bits` is not a valid width for [`RandSource::draw_bits`].
pub(crate) fn check_bits(bits: u32) -> Result<(), Error> {
    if (1..=32).contains(&bits) {
        Ok(())
    } else {
        Err(Error::BitsOutOfRange(bits))
    }
}

/// Generates a Nano64 from `unix_ts_ms` and 20 fresh bits from `rand_source`.
///
/// Zero is a valid timestamp here. This function keeps no state; identifiers generated within
/// the same millisecond are ordered only by their random fields. Use
/// [`MonotonicGenerator`](monotonic::MonotonicGenerator) for a strictly increasing sequence.
///
/// # Errors
///
/// Returns [`Error::TimestampOutOfRange`] if `unix_ts_ms` does not fit in 44 bits, and passes
/// through any error raised by `rand_source`.
///
/// # Examples
///
/// ```rust
/// use nano64::generator::generate;
///
/// let rand_source = |_bits: u32| -> Result<u32, nano64::Error> { Ok(0x12345) };
/// let x = generate(1234567890123, &rand_source)?;
/// assert_eq!(x.timestamp(), 1234567890123);
/// assert_eq!(x.random(), 0x12345);
/// # Ok::<(), nano64::Error>(())
/// ```
pub fn generate<R: RandSource + ?Sized>(unix_ts_ms: u64, rand_source: &R) -> Result<Nano64, Error> {
    if unix_ts_ms > MAX_TIMESTAMP {
        return Err(Error::TimestampOutOfRange(unix_ts_ms));
    }
    let random = rand_source.draw_bits(RANDOM_BITS)?;
    Ok(Nano64::from_fields(unix_ts_ms, random))
}

/// Represents a stateless Nano64 generator bound to a random number generator and a clock.
///
/// Every identifier gets a freshly drawn random field, so identifiers generated within the same
/// millisecond are not ordered by generation time. Two generator flavors are available:
///
/// | Flavor                                                  | Same-millisecond order | State  |
/// | ------------------------------------------------------- | ---------------------- | ------ |
/// | [`Generator`]                                           | Random                 | None   |
/// | [`MonotonicGenerator`](monotonic::MonotonicGenerator)   | Strictly increasing    | Locked |
///
/// # Examples
///
/// ```rust
/// use nano64::Generator;
///
/// let g = Generator::new();
/// println!("{}", g.generate()?);
///
/// // inject a custom clock
/// let g = Generator::with_sources(nano64::OsRandSource, || 1234567890123u64);
/// assert_eq!(g.generate()?.timestamp(), 1234567890123);
/// # Ok::<(), nano64::Error>(())
/// ```
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Generator<R = OsRandSource, T = StdSystemTime> {
    rand_source: R,
    time_source: T,
}

impl Generator {
    /// Creates a generator that uses the operating system's random source and system clock.
    pub const fn new() -> Self {
        Self::with_sources(OsRandSource, StdSystemTime)
    }
}

impl<R: RandSource, T: TimeSource> Generator<R, T> {
    /// Creates a generator with a random number generator and a clock.
    pub const fn with_sources(rand_source: R, time_source: T) -> Self {
        Self {
            rand_source,
            time_source,
        }
    }

    /// Generates a new Nano64 from the current timestamp.
    pub fn generate(&self) -> Result<Nano64, Error> {
        self.generate_core(self.time_source.unix_ts_ms())
    }

    /// Generates a new Nano64 from the `unix_ts_ms` passed.
    ///
    /// See [`generate`] for the errors returned.
    pub fn generate_core(&self, unix_ts_ms: u64) -> Result<Nano64, Error> {
        generate(unix_ts_ms, &self.rand_source)
    }
}

/// Supports operations as an infinite iterator that produces a new Nano64 for each call of
/// `next()`.
impl<R: RandSource, T: TimeSource> Iterator for Generator<R, T> {
    type Item = Result<Nano64, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.generate())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl<R: RandSource, T: TimeSource> std::iter::FusedIterator for Generator<R, T> {}
