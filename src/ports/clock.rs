//! Clock abstraction so time-dependent logic stays testable.

use crate::domain::foundation::Timestamp;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock implementation used in production.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Deterministic clock for tests; compiled unconditionally so
/// integration tests can reach it.
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Clock pinned to a fixed instant, adjustable from tests.
    pub struct FixedClock {
        now: Mutex<Timestamp>,
    }

    impl FixedClock {
        pub fn at(now: Timestamp) -> Self {
            Self {
                now: Mutex::new(now),
            }
        }

        pub fn set(&self, now: Timestamp) {
            *self.now.lock().unwrap() = now;
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            *self.now.lock().unwrap()
        }
    }
}
