//! Default generator and entry point functions.

#![cfg(feature = "global_gen")]
#![cfg_attr(docsrs, doc(cfg(feature = "global_gen")))]

use std::sync;

use crate::generator::{generate, OsRandSource, StdSystemTime, TimeSource};
use crate::{Error, Nano64};
use inner::GlobalGenInner;

/// Returns the lock handle of process-wide global generator, creating one if none exists.
fn lock_global_gen() -> sync::MutexGuard<'static, GlobalGenInner> {
    static G: sync::OnceLock<sync::Mutex<GlobalGenInner>> = sync::OnceLock::new();
    G.get_or_init(Default::default)
        .lock()
        .unwrap_or_else(sync::PoisonError::into_inner)
}

/// Generates a monotonic Nano64 from the current time.
///
/// This function employs a global generator and guarantees the process-wide strictly increasing
/// order of identifiers, including those generated within the same millisecond. On Unix, this
/// function resets the generator when the process ID changes (i.e., upon process forks) to
/// prevent collisions across processes.
///
/// # Errors
///
/// Returns [`Error::Entropy`] if the operating system's random source fails and
/// [`Error::TimestampOverflow`] if the sequence has used up the 44-bit timestamp space.
///
/// # Examples
///
/// ```rust
/// let id = nano64::nano64()?;
/// println!("{}", id); // e.g., "18C1F3A5B2E-0F3A9"
/// println!("{:?}", id.to_bytes()); // as 8-byte big-endian array
///
/// let id_string: String = nano64::nano64()?.to_string();
/// # Ok::<(), nano64::Error>(())
/// ```
pub fn nano64() -> Result<Nano64, Error> {
    let unix_ts_ms = StdSystemTime.unix_ts_ms();
    lock_global_gen().get_mut().advance(unix_ts_ms, &OsRandSource)
}

/// Generates a Nano64 from the current time with a fresh random field.
///
/// Unlike [`nano64`], this function keeps no state; identifiers generated within the same
/// millisecond are ordered only by their random fields and may collide.
///
/// # Examples
///
/// ```rust
/// let id = nano64::nano64_random()?;
/// println!("{}", id); // e.g., "18C1F3A5B2E-7D201"
/// # Ok::<(), nano64::Error>(())
/// ```
pub fn nano64_random() -> Result<Nano64, Error> {
    generate(StdSystemTime.unix_ts_ms(), &OsRandSource)
}

mod inner {
    use crate::MonotonicState;

    /// A thin wrapper to reset the state when the process ID changes (i.e., upon Unix forks).
    #[derive(Debug)]
    pub struct GlobalGenInner {
        #[cfg(unix)]
        pid: u32,
        state: MonotonicState,
    }

    impl Default for GlobalGenInner {
        fn default() -> Self {
            Self {
                #[cfg(unix)]
                pid: std::process::id(),
                state: MonotonicState::new(),
            }
        }
    }

    impl GlobalGenInner {
        /// Returns a mutable reference to the inner [`MonotonicState`], resetting the state on
        /// Unix if the process ID has changed.
        pub fn get_mut(&mut self) -> &mut MonotonicState {
            #[cfg(unix)]
            if self.pid != std::process::id() {
                tracing::debug!(
                    old_pid = self.pid,
                    "process ID changed; resetting global generator"
                );
                *self = Default::default();
            }
            &mut self.state
        }
    }
}
