//! Bounded retry with exponential backoff.
//!
//! [`BackoffController`] runs an async operation up to `max_retries` times,
//! waiting `base_interval * 2^attempt` between attempts. Waiting goes through
//! a [`Delay`] so tests can observe the schedule without real time passing.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::api::SubmissionOutcome;
use crate::logging::EventSink;

/// Default bound on attempts per record.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default multiplier for the exponential delay.
pub const DEFAULT_BASE_INTERVAL: Duration = Duration::from_secs(2);

/// Something that can suspend the calling flow for a while.
pub trait Delay {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Real wall-clock waits on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioDelay;

impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Result of an operation that can be retried.
pub trait Attempt {
    fn succeeded(&self) -> bool;
}

impl Attempt for bool {
    fn succeeded(&self) -> bool {
        *self
    }
}

impl Attempt for SubmissionOutcome {
    fn succeeded(&self) -> bool {
        self.is_success()
    }
}

/// What happened across all attempts for one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryReport<T> {
    pub succeeded: bool,
    /// Number of times the operation was invoked.
    pub attempts: u32,
    /// Result of the final invocation; `None` only when `max_retries` is zero.
    pub last: Option<T>,
}

/// Retry policy plus the capabilities it needs.
pub struct BackoffController<D> {
    max_retries: u32,
    base_interval: Duration,
    delay: D,
    sink: Arc<dyn EventSink>,
}

impl<D: Delay> BackoffController<D> {
    pub fn new(max_retries: u32, base_interval: Duration, delay: D, sink: Arc<dyn EventSink>) -> Self {
        Self {
            max_retries,
            base_interval,
            delay,
            sink,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Wait before the attempt after `attempt` (0-based): `base_interval * 2^attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_interval.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// Runs `operation` until it succeeds or attempts run out.
    /// Exhaustion returns `false`; it is not an error.
    pub async fn retry<F, Fut, T>(&self, operation: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = T>,
        T: Attempt,
    {
        self.retry_with_report(operation).await.succeeded
    }

    /// Like [`retry`](Self::retry), but also reports the attempt count and
    /// the final result.
    pub async fn retry_with_report<F, Fut, T>(&self, mut operation: F) -> RetryReport<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = T>,
        T: Attempt,
    {
        let mut last = None;
        for attempt in 0..self.max_retries {
            let result = operation().await;
            if result.succeeded() {
                return RetryReport {
                    succeeded: true,
                    attempts: attempt + 1,
                    last: Some(result),
                };
            }
            last = Some(result);

            if attempt + 1 < self.max_retries {
                let wait = self.delay_for_attempt(attempt);
                self.sink.info(format!(
                    "Retrying attempt {}/{} in {}s",
                    attempt + 2,
                    self.max_retries,
                    wait.as_secs_f64()
                ));
                self.delay.sleep(wait).await;
            }
        }

        RetryReport {
            succeeded: false,
            attempts: self.max_retries,
            last,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingDelay;
    use super::*;
    use crate::logging::{Level, MemorySink};
    use std::cell::Cell;

    fn controller<'a>(
        max_retries: u32,
        delay: &'a RecordingDelay,
        sink: &Arc<MemorySink>,
    ) -> BackoffController<&'a RecordingDelay> {
        BackoffController::new(max_retries, Duration::from_secs(2), delay, sink.clone())
    }

    #[test]
    fn default_schedule_doubles() {
        let delay = RecordingDelay::default();
        let sink = Arc::new(MemorySink::new());
        let c = controller(DEFAULT_MAX_RETRIES, &delay, &sink);
        let schedule: Vec<u64> = (0..5).map(|a| c.delay_for_attempt(a).as_secs()).collect();
        assert_eq!(schedule, vec![2, 4, 8, 16, 32]);
    }

    #[test]
    fn huge_attempt_saturates() {
        let delay = RecordingDelay::default();
        let sink = Arc::new(MemorySink::new());
        let c = controller(3, &delay, &sink);
        assert_eq!(c.delay_for_attempt(40), Duration::MAX);
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt() {
        let delay = RecordingDelay::default();
        let sink = Arc::new(MemorySink::new());
        let calls = Cell::new(0u32);

        let ok = controller(3, &delay, &sink)
            .retry(|| {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { n == 3 }
            })
            .await;

        assert!(ok);
        assert_eq!(calls.get(), 3);
        assert_eq!(delay.waits(), vec![Duration::from_secs(2), Duration::from_secs(4)]);
    }

    #[tokio::test]
    async fn exhaustion_returns_false_after_n_attempts() {
        let delay = RecordingDelay::default();
        let sink = Arc::new(MemorySink::new());
        let calls = Cell::new(0u32);

        let ok = controller(4, &delay, &sink)
            .retry(|| {
                calls.set(calls.get() + 1);
                async { false }
            })
            .await;

        assert!(!ok);
        assert_eq!(calls.get(), 4);
        assert_eq!(delay.waits().len(), 3);
        assert_eq!(delay.waits().last(), Some(&Duration::from_secs(8)));
        assert_eq!(sink.messages(Level::Info).len(), 3);
    }

    #[tokio::test]
    async fn first_success_does_not_wait() {
        let delay = RecordingDelay::default();
        let sink = Arc::new(MemorySink::new());

        let report = controller(5, &delay, &sink)
            .retry_with_report(|| async { true })
            .await;

        assert!(report.succeeded);
        assert_eq!(report.attempts, 1);
        assert!(delay.waits().is_empty());
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn report_keeps_last_result() {
        let delay = RecordingDelay::default();
        let sink = Arc::new(MemorySink::new());
        let calls = Cell::new(0u32);

        let report = controller(2, &delay, &sink)
            .retry_with_report(|| {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { AttemptNo(n) }
            })
            .await;

        assert!(!report.succeeded);
        assert_eq!(report.attempts, 2);
        assert_eq!(report.last, Some(AttemptNo(2)));
    }

    #[tokio::test]
    async fn zero_retries_never_invokes() {
        let delay = RecordingDelay::default();
        let sink = Arc::new(MemorySink::new());
        let calls = Cell::new(0u32);

        let report = controller(0, &delay, &sink)
            .retry_with_report(|| {
                calls.set(calls.get() + 1);
                async { true }
            })
            .await;

        assert!(!report.succeeded);
        assert_eq!(report.attempts, 0);
        assert_eq!(report.last, None);
        assert_eq!(calls.get(), 0);
    }

    #[tokio::test]
    async fn retry_log_names_the_attempt() {
        let delay = RecordingDelay::default();
        let sink = Arc::new(MemorySink::new());

        controller(2, &delay, &sink).retry(|| async { false }).await;

        assert_eq!(
            sink.messages(Level::Info),
            vec!["Retrying attempt 2/2 in 2s".to_string()]
        );
    }

    #[derive(Debug, PartialEq)]
    struct AttemptNo(u32);

    impl Attempt for AttemptNo {
        fn succeeded(&self) -> bool {
            false
        }
    }
}
