//! Retry, rate limiting and request logging
//!
//! Wraps every Tag Manager request made by [`crate::api::TagManagerClient`].

pub mod config;
pub mod logging;
pub mod rate_limiter;
pub mod retry;

pub use config::{LogLevel, MonitoringConfig, RateLimitConfig, ResilienceConfig};
pub use logging::{ApiLogger, OperationContext, OperationMetrics};
pub use rate_limiter::{RateLimiter, RateLimiterStats};
pub use retry::{DEFAULT_MAX_ATTEMPTS, RetryConfig, RetryPolicy, Retryable, RetryableError};
