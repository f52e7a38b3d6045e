//! Tokio-based clock implementation.

use async_trait::async_trait;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::traits::Clock;

/// Production clock implementation using Tokio's time functions.
///
/// This provider uses the real system clock and Tokio's async sleep,
/// making it suitable for production use.
///
/// Tests use [`FakeClock`](crate::testing::FakeClock) instead, which
/// fast-forwards through polling loops and quote expiry.
///
/// # Examples
///
/// ```rust
/// use m0_route::providers::TokioClock;
///
/// let clock = TokioClock::new();
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TokioClock;

impl TokioClock {
    /// Creates a new Tokio clock instance.
    pub fn new() -> Self {
        Self
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn unix_timestamp(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default()
    }
}
