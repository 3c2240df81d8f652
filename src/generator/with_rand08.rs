//! Integration with `rand` (v0.8) crate.

use std::sync::{Mutex, PoisonError};

use super::{check_bits, monotonic::MonotonicGenerator, Generator, RandSource, StdSystemTime};
use crate::Error;
use rand::RngCore;

/// An adapter that implements [`RandSource`] for [`RngCore`] types.
///
/// The wrapped generator is kept behind a mutex so that the adapter can be shared by
/// concurrent callers. Draws use [`RngCore::try_fill_bytes`], so failures of fallible
/// generators are reported as [`Error::Entropy`].
#[derive(Debug, Default)]
pub struct Adapter<T>(Mutex<T>);

impl<T: RngCore> Adapter<T> {
    /// Wraps a random number generator.
    pub const fn new(rng: T) -> Self {
        Self(Mutex::new(rng))
    }

    /// Unwraps the random number generator.
    pub fn into_inner(self) -> T {
        self.0.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: RngCore> RandSource for Adapter<T> {
    fn draw_bits(&self, bits: u32) -> Result<u32, Error> {
        check_bits(bits)?;
        let mut buffer = [0u8; 4];
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_fill_bytes(&mut buffer)
            .map_err(Error::entropy)?;
        Ok(u32::from_be_bytes(buffer) >> (32 - bits))
    }
}

impl<T: RngCore> Generator<Adapter<T>, StdSystemTime> {
    /// Creates a generator object with a specified random number generator that implements
    /// [`RngCore`] from `rand` (v0.8) crate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nano64::Generator;
    ///
    /// let g = Generator::with_rand08(rand::rngs::OsRng);
    /// println!("{}", g.generate()?);
    /// # Ok::<(), nano64::Error>(())
    /// ```
    pub const fn with_rand08(rng: T) -> Self {
        Self::with_sources(Adapter::new(rng), StdSystemTime)
    }
}

impl<T: RngCore> MonotonicGenerator<Adapter<T>, StdSystemTime> {
    /// Creates a monotonic generator object with a specified random number generator that
    /// implements [`RngCore`] from `rand` (v0.8) crate.
    pub const fn with_rand08(rng: T) -> Self {
        Self::with_sources(Adapter::new(rng), StdSystemTime)
    }
}

#[cfg(test)]
mod tests {
    use super::Adapter;
    use crate::{generator::RandSource, Error, Generator, MonotonicGenerator};
    use rand::{rngs::StdRng, RngCore, SeedableRng};

    /// Produces deterministic draws from seeded generator
    #[test]
    fn produces_deterministic_draws_from_seeded_generator() {
        let a = Adapter::new(StdRng::seed_from_u64(42));
        let b = Adapter::new(StdRng::seed_from_u64(42));
        for bits in 1..=32 {
            let x = a.draw_bits(bits).unwrap();
            assert_eq!(x, b.draw_bits(bits).unwrap());
            assert!(u64::from(x) < 1u64 << bits);
        }
    }

    /// Rejects invalid bit widths
    #[test]
    fn rejects_invalid_bit_widths() {
        let a = Adapter::new(StdRng::seed_from_u64(0));
        assert!(matches!(a.draw_bits(0), Err(Error::BitsOutOfRange(0))));
        assert!(matches!(a.draw_bits(33), Err(Error::BitsOutOfRange(33))));
    }

    /// Reports failures of fallible generators
    #[test]
    fn reports_failures_of_fallible_generators() {
        struct BrokenRng;
        impl RngCore for BrokenRng {
            fn next_u32(&mut self) -> u32 {
                unreachable!()
            }
            fn next_u64(&mut self) -> u64 {
                unreachable!()
            }
            fn fill_bytes(&mut self, _: &mut [u8]) {
                unreachable!()
            }
            fn try_fill_bytes(&mut self, _: &mut [u8]) -> Result<(), rand::Error> {
                Err(rand::Error::new("broken"))
            }
        }

        let a = Adapter::new(BrokenRng);
        assert!(matches!(a.draw_bits(20), Err(Error::Entropy(_))));
    }

    /// Builds generators from rand generators
    #[test]
    fn builds_generators_from_rand_generators() {
        let g = Generator::with_rand08(rand::thread_rng());
        g.generate().unwrap();

        let g = MonotonicGenerator::with_rand08(StdRng::seed_from_u64(1));
        let a = g.generate_core(1_000).unwrap();
        let b = g.generate_core(1_000).unwrap();
        assert_eq!(b.random(), a.random() + 1);
    }
}
