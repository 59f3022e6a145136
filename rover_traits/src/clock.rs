use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Clock abstraction for pacing and timestamping across the stack.
///
/// - now(): monotonic Instant, for intervals and tick pacing
/// - sleep(): sleeps for the provided duration (implementations may simulate)
/// - epoch_ms(): wall-clock epoch milliseconds, for payload timestamps
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Wall-clock milliseconds since the Unix epoch. Payload timestamps
    /// use this; control decisions never do.
    fn epoch_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }

    /// Milliseconds elapsed since `epoch`, saturating at 0 on underflow.
    fn ms_since(&self, epoch: Instant) -> u64 {
        let dur = self.now().saturating_duration_since(epoch);
        dur.as_millis() as u64
    }
}

/// Default, real-time clock backed by std::time.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if d.is_zero() {
            return;
        }
        thread::sleep(d);
    }
}

/// Deterministic clock for tests, advanced manually.
///
/// now() = origin + offset; sleep(d) advances the offset without actually
/// sleeping; epoch_ms() starts at a fixed base and tracks the offset, so
/// payload timestamps are reproducible.
pub mod test_clock {
    use super::*;
    use std::sync::{Arc, Mutex, PoisonError};

    const EPOCH_BASE_MS: i64 = 1_700_000_000_000;

    #[derive(Debug, Clone)]
    pub struct TestClock {
        origin: Instant,
        offset: Arc<Mutex<Duration>>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset: Arc::new(Mutex::new(Duration::ZERO)),
            }
        }

        /// Advance the clock by the given duration.
        pub fn advance(&self, d: Duration) {
            let mut off = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
            *off = off.saturating_add(d);
        }

        /// Total simulated time elapsed since construction.
        pub fn elapsed(&self) -> Duration {
            *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            self.origin + self.elapsed()
        }

        fn sleep(&self, d: Duration) {
            self.advance(d);
        }

        fn epoch_ms(&self) -> i64 {
            EPOCH_BASE_MS + self.elapsed().as_millis() as i64
        }
    }
}

pub use test_clock::TestClock;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_sleep_advances_without_blocking() {
        let clock = TestClock::new();
        let t0 = clock.now();
        clock.sleep(Duration::from_millis(250));
        assert_eq!(clock.ms_since(t0), 250);
    }

    #[test]
    fn test_clock_epoch_tracks_offset() {
        let clock = TestClock::new();
        let base = clock.epoch_ms();
        clock.advance(Duration::from_millis(40));
        assert_eq!(clock.epoch_ms() - base, 40);
    }
}
