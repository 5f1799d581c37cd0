use serde::{Deserialize, Serialize};

/// Hard cap on records per feed fetch, imposed by the upstream store.
pub const FETCH_LIMIT_MAX: usize = 2000;

/// Configuration for one change processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Logical process name; keys the run-history checkpoint.
    /// Default: "queue-transaction-processor"
    #[serde(default = "default_process_name")]
    pub process_name: String,

    /// Only source records in this category are aggregated.
    /// Default: "IT"
    #[serde(default = "default_category_filter")]
    pub category_filter: String,

    /// Maximum records per feed fetch, clamped to [`FETCH_LIMIT_MAX`].
    /// Default: 2000
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,

    /// First-run lookback window in seconds, assumed elapsed time between
    /// the triggering change and this run.
    /// Default: 120
    #[serde(default = "default_fallback_lookback_secs")]
    pub fallback_lookback_secs: u64,

    /// Milliseconds the stored cursor is advanced past the last consumed
    /// change.
    /// Default: 1
    #[serde(default = "default_advance_epsilon_ms")]
    pub advance_epsilon_ms: i64,

    /// Retry policy for feed fetches.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_process_name() -> String {
    "queue-transaction-processor".to_string()
}

fn default_category_filter() -> String {
    "IT".to_string()
}

fn default_fetch_limit() -> usize {
    FETCH_LIMIT_MAX
}

fn default_fallback_lookback_secs() -> u64 {
    120
}

fn default_advance_epsilon_ms() -> i64 {
    1
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            process_name: default_process_name(),
            category_filter: default_category_filter(),
            fetch_limit: default_fetch_limit(),
            fallback_lookback_secs: default_fallback_lookback_secs(),
            advance_epsilon_ms: default_advance_epsilon_ms(),
            retry: RetryConfig::default(),
        }
    }
}

impl ProcessorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process_name(mut self, name: impl Into<String>) -> Self {
        self.process_name = name.into();
        self
    }

    pub fn with_category_filter(mut self, category: impl Into<String>) -> Self {
        self.category_filter = category.into();
        self
    }

    pub fn with_fetch_limit(mut self, limit: usize) -> Self {
        self.fetch_limit = limit.min(FETCH_LIMIT_MAX);
        self
    }

    pub fn with_fallback_lookback_secs(mut self, secs: u64) -> Self {
        self.fallback_lookback_secs = secs;
        self
    }

    pub fn with_advance_epsilon_ms(mut self, ms: i64) -> Self {
        self.advance_epsilon_ms = ms;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Retry policy for transient feed failures (server-side throttling).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts after the first failure before giving up.
    /// Default: 3
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Delay before the first retry; doubles per attempt.
    /// Default: 250ms
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    250
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_upstream_constants() {
        let config = ProcessorConfig::default();
        assert_eq!(config.category_filter, "IT");
        assert_eq!(config.fetch_limit, 2000);
        assert_eq!(config.fallback_lookback_secs, 120);
        assert_eq!(config.advance_epsilon_ms, 1);
    }

    #[test]
    fn fetch_limit_is_clamped() {
        let config = ProcessorConfig::new().with_fetch_limit(50_000);
        assert_eq!(config.fetch_limit, FETCH_LIMIT_MAX);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ProcessorConfig =
            serde_json::from_str(r#"{"process_name": "nightly-sync"}"#).unwrap();
        assert_eq!(config.process_name, "nightly-sync");
        assert_eq!(config.retry.max_retries, 3);
    }
}
