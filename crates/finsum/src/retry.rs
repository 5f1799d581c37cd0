//! Retrying feed wrapper.
//!
//! The upstream feed throttles under load; fetches retry with
//! exponential backoff before the failure becomes fatal. A fetch that
//! exhausts its retries surfaces `FeedUnavailable`, which aborts the run
//! before the cursor advances, so the next invocation safely refetches
//! from the same checkpoint.

use finsum_core::{
    ChangeCursor, ChangeFeed, ChangeRecord, FinsumError, Result, RetryConfig,
};
use std::sync::Arc;
use std::time::Duration;

/// Wraps any [`ChangeFeed`] with blocking retry-with-backoff.
pub struct RetryingFeed<F> {
    inner: Arc<F>,
    config: RetryConfig,
}

impl<F: ChangeFeed> RetryingFeed<F> {
    pub fn new(inner: Arc<F>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

impl<F: ChangeFeed> ChangeFeed for RetryingFeed<F> {
    fn fetch_changes(
        &self,
        scope_id: &str,
        start: &ChangeCursor,
        limit: usize,
    ) -> Result<Vec<ChangeRecord>> {
        let mut delay = Duration::from_millis(self.config.initial_delay_ms);
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.inner.fetch_changes(scope_id, start, limit) {
                Ok(records) => return Ok(records),
                Err(e) => {
                    tracing::warn!(
                        "feed fetch attempt {}/{} failed for scope {}: {}",
                        attempt + 1,
                        self.config.max_retries + 1,
                        scope_id,
                        e
                    );
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        std::thread::sleep(delay);
                        delay *= 2;
                    }
                }
            }
        }

        Err(FinsumError::FeedUnavailable(format!(
            "scope {} after {} attempts: {}",
            scope_id,
            self.config.max_retries + 1,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyFeed {
        calls: AtomicUsize,
        fail_first: usize,
    }

    impl ChangeFeed for FlakyFeed {
        fn fetch_changes(
            &self,
            _scope_id: &str,
            _start: &ChangeCursor,
            _limit: usize,
        ) -> Result<Vec<ChangeRecord>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                Err(FinsumError::Store("throttled".into()))
            } else {
                Ok(Vec::new())
            }
        }
    }

    fn start() -> ChangeCursor {
        ChangeCursor::fallback("list-a", chrono::Duration::minutes(2), chrono::Utc::now())
    }

    fn config() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_delay_ms: 1,
        }
    }

    #[test]
    fn recovers_from_transient_failures() {
        let feed = RetryingFeed::new(
            Arc::new(FlakyFeed {
                calls: AtomicUsize::new(0),
                fail_first: 2,
            }),
            config(),
        );
        assert!(feed.fetch_changes("list-a", &start(), 100).is_ok());
    }

    #[test]
    fn exhaustion_becomes_feed_unavailable() {
        let flaky = Arc::new(FlakyFeed {
            calls: AtomicUsize::new(0),
            fail_first: 10,
        });
        let feed = RetryingFeed::new(flaky.clone(), config());
        let err = feed.fetch_changes("list-a", &start(), 100).unwrap_err();
        assert!(matches!(err, FinsumError::FeedUnavailable(_)));
        // max_retries = 2 means three attempts total.
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }
}
