//! Time source for the stepping loop.

use core::future::Future;
use core::time::Duration;
use std::sync::Arc;

use tokio::time::Instant;

/// Something that measures elapsed time and can suspend for a while.
///
/// Shared by reference between the engine and every running request.
pub trait Clock: Send + Sync {
    /// Time since a clock-specific reference point.
    fn elapsed(&self) -> Duration;

    /// Suspend the calling task for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

impl<C: Clock> Clock for Arc<C> {
    fn elapsed(&self) -> Duration {
        (**self).elapsed()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        (**self).sleep(duration)
    }
}

/// Clock backed by the tokio timer.
///
/// Follows tokio's paused test time when the runtime is started paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokioClock {
    created_at: Instant,
}

impl TokioClock {
    /// Create a clock starting now.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self {
            created_at: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Convert seconds to a duration, treating negative or unrepresentable
/// values as zero.
pub(crate) fn seconds(s: f64) -> Duration {
    Duration::try_from_secs_f64(s).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_follows_paused_time() {
        let clock = TokioClock::new();
        clock.sleep(Duration::from_millis(20)).await;
        clock.sleep(Duration::from_millis(30)).await;

        assert_eq!(clock.elapsed(), Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_clock() {
        let clock = Arc::new(TokioClock::new());
        let other = Arc::clone(&clock);
        other.sleep(Duration::from_millis(10)).await;

        assert_eq!(clock.elapsed(), Duration::from_millis(10));
    }

    #[test]
    fn test_seconds_saturates_at_zero() {
        assert_eq!(seconds(0.02), Duration::from_secs_f64(0.02));
        assert_eq!(seconds(-1.0), Duration::ZERO);
        assert_eq!(seconds(f64::NAN), Duration::ZERO);
    }
}
