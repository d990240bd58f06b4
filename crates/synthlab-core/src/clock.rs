//! Clock abstraction for deterministic timestamps.

use chrono::{DateTime, Duration, Utc};

/// Abstraction over system time. Every timestamp written to an order or a
/// token is taken from a `Clock`, never from `Utc::now()` directly.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Time left until `instant`. Negative once `instant` has passed.
    fn remaining_until(&self, instant: DateTime<Utc>) -> Duration {
        instant - self.now()
    }
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
