//! Time abstraction so periodic ticks and simulated durations are
//! testable without waiting on wall-clock seconds.
//!
//! Mirrors the teacher's `TimeProvider` trait: production code gets real
//! sleeps and timestamps, tests get a clock that collapses delays to
//! near-instant while preserving task ordering.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Provides the current time and a way to sleep, abstracted so tests can
/// skip real delays.
#[async_trait]
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Sleep for the given duration (or a fast-forwarded stand-in in tests).
    async fn sleep(&self, duration: Duration);

    /// The current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;

    /// Milliseconds since the Unix epoch, used for ID generation.
    fn epoch_millis(&self) -> u128 {
        self.now().timestamp_millis().max(0) as u128
    }
}

/// Shared handle to a clock implementation.
pub type SharedClock = Arc<dyn Clock>;

/// Real wall-clock time, used in production.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock for tests: collapses every sleep to a minimal yield so state
/// machines exercising multi-second timers (task duration, firmware
/// download/apply waits) run at full speed while still crossing an
/// `.await` point so scheduled tasks interleave.
#[derive(Debug, Clone, Default)]
pub struct TestClock;

#[async_trait]
impl Clock for TestClock {
    async fn sleep(&self, duration: Duration) {
        if duration > Duration::from_millis(1) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        } else {
            tokio::task::yield_now().await;
        }
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Builds a production clock.
#[must_use]
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}

/// Builds a test clock.
#[must_use]
pub fn test_clock() -> SharedClock {
    Arc::new(TestClock)
}
