//! Retry policies with exponential backoff
//!
//! Every Tag Manager call goes through [`RetryPolicy::execute`]. The policy
//! retries transient failures (network, timeouts, 429, 5xx) up to a fixed
//! attempt ceiling and gives up immediately on anything else.

use log::{debug, info, warn};
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Default attempt ceiling for a single API call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(32),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }
}

/// Types of errors and their retry behavior
#[derive(Debug, Clone, PartialEq)]
pub enum RetryableError {
    /// Network-level errors (connection refused, DNS, reset)
    Network,
    /// HTTP 5xx server errors
    ServerError(u16),
    /// HTTP 429 Too Many Requests
    RateLimited,
    /// HTTP 408 or a client-side timeout
    Timeout,
    /// Non-retryable client errors (4xx except 408, 429)
    ClientError(u16),
    /// Authentication/authorization errors
    AuthError,
    /// Unknown/other errors
    Unknown,
}

impl RetryableError {
    /// Determine if this error type should be retried
    pub fn should_retry(&self) -> bool {
        match self {
            RetryableError::Network
            | RetryableError::ServerError(_)
            | RetryableError::RateLimited
            | RetryableError::Timeout => true,
            RetryableError::ClientError(_) | RetryableError::AuthError | RetryableError::Unknown => {
                false
            }
        }
    }

    /// Classify an HTTP status code into retry behavior
    pub fn from_status_code(status: u16) -> Self {
        match status {
            401 | 403 => RetryableError::AuthError,
            408 => RetryableError::Timeout,
            429 => RetryableError::RateLimited,
            400..=499 => RetryableError::ClientError(status),
            500..=599 => RetryableError::ServerError(status),
            _ => RetryableError::Unknown,
        }
    }

    /// Classify a reqwest error
    pub fn from_reqwest_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            RetryableError::Timeout
        } else if error.is_connect() || error.is_request() {
            RetryableError::Network
        } else if let Some(status) = error.status() {
            Self::from_status_code(status.as_u16())
        } else {
            RetryableError::Unknown
        }
    }
}

/// Errors that know whether they are worth another attempt
pub trait Retryable {
    fn classify(&self) -> RetryableError;
}

impl Retryable for reqwest::Error {
    fn classify(&self) -> RetryableError {
        RetryableError::from_reqwest_error(self)
    }
}

/// Retry policy that implements exponential backoff with jitter
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute a function with retry logic
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        self.execute_observed(operation, |_, _, _| {}).await
    }

    /// Execute with retry logic, reporting every scheduled retry to `on_retry`
    /// as `(failed_attempt, error, delay)`
    pub async fn execute_observed<F, Fut, T, E, R>(
        &self,
        mut operation: F,
        mut on_retry: R,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
        R: FnMut(u32, &E, Duration),
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!("Executing operation (attempt {}/{})", attempt, max_attempts);

            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        info!("Operation succeeded after {} attempts", attempt);
                    }
                    return Ok(result);
                }
                Err(error) => {
                    let should_retry = error.classify().should_retry();

                    if !should_retry || attempt >= max_attempts {
                        warn!(
                            "Operation failed permanently on attempt {} (should_retry: {}): {}",
                            attempt, should_retry, error
                        );
                        return Err(error);
                    }

                    let delay = self.calculate_delay(attempt);
                    warn!("Operation failed on attempt {} (retryable): {}", attempt, error);
                    on_retry(attempt, &error, delay);

                    debug!("Waiting {:?} before retry", delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Calculate exponential backoff delay with optional jitter
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_ms = (self.config.base_delay.as_millis() as f64)
            * self.config.backoff_multiplier.powi(exponent);

        let mut delay = if delay_ms.is_finite() {
            Duration::from_millis(delay_ms as u64)
        } else {
            self.config.max_delay
        };

        if delay > self.config.max_delay {
            delay = self.config.max_delay;
        }

        if self.config.jitter {
            let jitter_factor = rand::rng().random_range(0.5..=1.5);
            let jittered_ms = (delay.as_millis() as f64 * jitter_factor) as u64;
            delay = Duration::from_millis(jittered_ms);
        }

        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug)]
    struct FakeError(RetryableError);

    impl Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "fake error: {:?}", self.0)
        }
    }

    impl Retryable for FakeError {
        fn classify(&self) -> RetryableError {
            self.0.clone()
        }
    }

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[test]
    fn test_retryable_error_classification() {
        assert!(RetryableError::Network.should_retry());
        assert!(RetryableError::ServerError(500).should_retry());
        assert!(RetryableError::RateLimited.should_retry());
        assert!(RetryableError::Timeout.should_retry());

        assert!(!RetryableError::ClientError(400).should_retry());
        assert!(!RetryableError::AuthError.should_retry());
        assert!(!RetryableError::Unknown.should_retry());
    }

    #[test]
    fn test_status_code_classification() {
        assert_eq!(RetryableError::from_status_code(401), RetryableError::AuthError);
        assert_eq!(RetryableError::from_status_code(408), RetryableError::Timeout);
        assert_eq!(RetryableError::from_status_code(429), RetryableError::RateLimited);
        assert_eq!(RetryableError::from_status_code(404), RetryableError::ClientError(404));
        assert_eq!(RetryableError::from_status_code(503), RetryableError::ServerError(503));
    }

    #[test]
    fn test_default_ceiling_is_twenty_attempts() {
        assert_eq!(RetryConfig::default().max_attempts, 20);
    }

    #[test]
    fn test_delay_calculation() {
        let policy = RetryPolicy::new(RetryConfig {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: false,
        });

        assert_eq!(policy.calculate_delay(1), Duration::from_millis(100));
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(200));
        assert_eq!(policy.calculate_delay(3), Duration::from_millis(400));
        assert_eq!(policy.calculate_delay(4), Duration::from_millis(800));
    }

    #[test]
    fn test_max_delay_cap() {
        let policy = RetryPolicy::new(RetryConfig {
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: false,
        });

        assert_eq!(policy.calculate_delay(5), Duration::from_secs(5));
        assert_eq!(policy.calculate_delay(20), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_retries_transient_error_then_succeeds() {
        let policy = RetryPolicy::new(fast_config(5));
        let calls = Cell::new(0);
        let retries = Cell::new(0);

        let result = policy
            .execute_observed(
                || {
                    calls.set(calls.get() + 1);
                    let n = calls.get();
                    async move {
                        if n < 3 {
                            Err(FakeError(RetryableError::ServerError(503)))
                        } else {
                            Ok("created")
                        }
                    }
                },
                |_, _, _| retries.set(retries.get() + 1),
            )
            .await;

        assert_eq!(result.unwrap(), "created");
        assert_eq!(calls.get(), 3);
        assert_eq!(retries.get(), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let policy = RetryPolicy::new(fast_config(5));
        let calls = Cell::new(0);

        let result: Result<(), _> = policy
            .execute(|| {
                calls.set(calls.get() + 1);
                async { Err(FakeError(RetryableError::ClientError(400))) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_at_attempt_ceiling() {
        let policy = RetryPolicy::new(fast_config(4));
        let calls = Cell::new(0);

        let result: Result<(), _> = policy
            .execute(|| {
                calls.set(calls.get() + 1);
                async { Err(FakeError(RetryableError::RateLimited)) }
            })
            .await;

        assert!(matches!(result, Err(FakeError(RetryableError::RateLimited))));
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let policy = RetryPolicy::new(fast_config(0));
        let calls = Cell::new(0);

        let _: Result<(), _> = policy
            .execute(|| {
                calls.set(calls.get() + 1);
                async { Err(FakeError(RetryableError::Network)) }
            })
            .await;

        assert_eq!(calls.get(), 1);
    }
}
