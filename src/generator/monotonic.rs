//! Monotonic Nano64 generation.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{OsRandSource, RandSource, StdSystemTime, TimeSource};
use crate::{Error, Nano64, MAX_RANDOM, MAX_TIMESTAMP, RANDOM_BITS};

/// The last timestamp and random field issued by a monotonic sequence.
///
/// [`advance`](MonotonicState::advance) is the transition function of the sequence: every
/// identifier it returns is strictly greater than the previous one, whatever timestamps are
/// passed in. Exclusive access is expressed by `&mut self`; share a state between threads
/// through [`MonotonicGenerator`] or another lock.
///
/// Independent states produce independent sequences.
///
/// # Examples
///
/// ```rust
/// use nano64::{MonotonicState, OsRandSource};
///
/// let mut state = MonotonicState::new();
/// let a = state.advance(1000, &OsRandSource)?;
/// let b = state.advance(1000, &OsRandSource)?;
/// let c = state.advance(999, &OsRandSource)?;
/// assert!(a < b && b < c);
/// assert_eq!(c.timestamp(), 1000);
/// # Ok::<(), nano64::Error>(())
/// ```
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Default)]
pub struct MonotonicState {
    /// `None` until the first identifier is issued.
    last_timestamp: Option<u64>,
    last_random: u32,
}

impl MonotonicState {
    /// Creates a state that has not issued any identifier.
    pub const fn new() -> Self {
        Self {
            last_timestamp: None,
            last_random: 0,
        }
    }

    /// Creates a state that continues after `last`, e.g. the last identifier persisted by a
    /// previous run.
    pub const fn resume_from(last: Nano64) -> Self {
        Self {
            last_timestamp: Some(last.timestamp()),
            last_random: last.random(),
        }
    }

    /// Returns the last identifier issued, if any.
    pub const fn last(&self) -> Option<Nano64> {
        match self.last_timestamp {
            Some(timestamp) => Some(Nano64::from_fields(timestamp, self.last_random)),
            None => None,
        }
    }

    /// Issues the next identifier for the `unix_ts_ms` requested.
    ///
    /// - If `unix_ts_ms` is later than the last timestamp, the identifier takes `unix_ts_ms`
    ///   and a random field freshly drawn from `rand_source`.
    /// - Otherwise the last timestamp is reused and the last random field is incremented by
    ///   one. When the random field is exhausted, the timestamp is incremented and the random
    ///   field restarts at zero; the timestamp may therefore run ahead of the clock.
    ///
    /// The state is updated only when an identifier is returned.
    ///
    /// # Errors
    ///
    /// - [`Error::TimestampOutOfRange`] if `unix_ts_ms` does not fit in 44 bits.
    /// - [`Error::TimestampOverflow`] if the sequence has used up the largest timestamp.
    /// - Any error raised by `rand_source`.
    pub fn advance<R: RandSource + ?Sized>(
        &mut self,
        unix_ts_ms: u64,
        rand_source: &R,
    ) -> Result<Nano64, Error> {
        if unix_ts_ms > MAX_TIMESTAMP {
            return Err(Error::TimestampOutOfRange(unix_ts_ms));
        }

        let (timestamp, random) = match self.last_timestamp {
            Some(last_timestamp) if unix_ts_ms <= last_timestamp => {
                if unix_ts_ms < last_timestamp {
                    tracing::trace!(
                        requested = unix_ts_ms,
                        last_timestamp,
                        "reusing last timestamp for earlier request"
                    );
                }
                if self.last_random < MAX_RANDOM {
                    (last_timestamp, self.last_random + 1)
                } else if last_timestamp < MAX_TIMESTAMP {
                    // increment timestamp at random field overflow
                    tracing::debug!(
                        last_timestamp,
                        "random field exhausted; advancing timestamp by one millisecond"
                    );
                    (last_timestamp + 1, 0)
                } else {
                    tracing::warn!("monotonic sequence reached the largest timestamp");
                    return Err(Error::TimestampOverflow);
                }
            }
            _ => (
                unix_ts_ms,
                rand_source.draw_bits(RANDOM_BITS)? & MAX_RANDOM,
            ),
        };

        self.last_timestamp = Some(timestamp);
        self.last_random = random;
        Ok(Nano64::from_fields(timestamp, random))
    }
}

/// Represents a Nano64 generator that guarantees the monotonic order of identifiers across all
/// threads sharing it.
///
/// The generator wraps a [`MonotonicState`] in a mutex, so `generate` takes `&self` and the
/// generator can be shared through an `Arc` or a `static`. Each call is a single critical
/// section; concurrent callers observe one total order of identifiers.
///
/// # Examples
///
/// ```rust
/// use nano64::MonotonicGenerator;
/// use std::{sync, thread};
///
/// let g = sync::Arc::new(MonotonicGenerator::new());
/// thread::scope(|s| {
///     for i in 0..4 {
///         let g = sync::Arc::clone(&g);
///         s.spawn(move || {
///             for _ in 0..8 {
///                 println!("{} by thread {}", g.generate().unwrap(), i);
///                 thread::yield_now();
///             }
///         });
///     }
/// });
/// ```
#[derive(Debug, Default)]
pub struct MonotonicGenerator<R = OsRandSource, T = StdSystemTime> {
    state: Mutex<MonotonicState>,

    /// The random number generator used by the generator.
    rand_source: R,

    /// The clock used by the generator.
    time_source: T,
}

impl MonotonicGenerator {
    /// Creates a generator that uses the operating system's random source and system clock.
    pub const fn new() -> Self {
        Self::with_sources(OsRandSource, StdSystemTime)
    }
}

impl<R: RandSource, T: TimeSource> MonotonicGenerator<R, T> {
    /// Creates a generator with a random number generator and a clock.
    pub const fn with_sources(rand_source: R, time_source: T) -> Self {
        Self::with_state(MonotonicState::new(), rand_source, time_source)
    }

    /// Creates a generator that continues from `state`.
    pub const fn with_state(state: MonotonicState, rand_source: R, time_source: T) -> Self {
        Self {
            state: Mutex::new(state),
            rand_source,
            time_source,
        }
    }

    /// Generates a new Nano64 from the current timestamp.
    ///
    /// See [`MonotonicState::advance`] for the description.
    pub fn generate(&self) -> Result<Nano64, Error> {
        self.generate_core(self.time_source.unix_ts_ms())
    }

    /// Generates a new Nano64 from the `unix_ts_ms` passed.
    ///
    /// See [`MonotonicState::advance`] for the description.
    pub fn generate_core(&self, unix_ts_ms: u64) -> Result<Nano64, Error> {
        self.lock_state().advance(unix_ts_ms, &self.rand_source)
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> MonotonicState {
        *self.lock_state()
    }

    /// Forgets the identifiers issued so far; the next identifier starts a new sequence.
    pub fn reset(&self) {
        *self.lock_state() = MonotonicState::new();
    }

    /// Returns the lock handle of the state.
    ///
    /// A poisoned lock is recovered because the state is written only after a transition has
    /// succeeded.
    fn lock_state(&self) -> MutexGuard<'_, MonotonicState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Supports operations as an infinite iterator that produces a new Nano64 for each call of
/// `next()`.
impl<R: RandSource, T: TimeSource> Iterator for MonotonicGenerator<R, T> {
    type Item = Result<Nano64, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.generate())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl<R: RandSource, T: TimeSource> std::iter::FusedIterator for MonotonicGenerator<R, T> {}
