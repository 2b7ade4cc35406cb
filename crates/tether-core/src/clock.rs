use jiff::{SignedDuration, Timestamp};
use parking_lot::Mutex;
use std::sync::Arc;

/// Source of wall-clock time for liveness checks.
///
/// Every expiry decision (cache policy, service boundary check, cleanup
/// cutoff) reads time through this trait so that they all agree on `now`.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current time of the clock
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can hand one clone to
/// the service and keep another to advance time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Moves the clock forward (or backward, for a negative duration).
    pub fn advance(&self, by: SignedDuration) {
        let mut now = self.now.lock();
        *now = *now + by;
    }

    pub fn set(&self, to: Timestamp) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_starts_at_given_time() {
        let base = Timestamp::from_second(0).unwrap();
        let clock = ManualClock::new(base);
        assert_eq!(clock.now(), base);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let base = Timestamp::from_second(1_000).unwrap();
        let clock = ManualClock::new(base);
        let shared = clock.clone();

        clock.advance(SignedDuration::from_secs(30));
        assert_eq!(shared.now(), Timestamp::from_second(1_030).unwrap());

        shared.set(base);
        assert_eq!(clock.now(), base);
    }

    #[test]
    fn arc_clock_delegates() {
        let base = Timestamp::from_second(42).unwrap();
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(base));
        assert_eq!(clock.now(), base);
    }
}
