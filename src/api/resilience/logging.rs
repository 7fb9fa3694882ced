//! Structured logging with correlation tracking for Tag Manager API calls
//!
//! Every request gets a correlation id; start, retries and completion are
//! emitted as single-line JSON through the `log` facade.

use super::config::{LogLevel, MonitoringConfig};
use log::{debug, error, info, warn};
use serde_json::{Value, json};
use std::time::{Duration, Instant};

/// Structured logger for API operations with correlation tracking
#[derive(Debug, Clone)]
pub struct ApiLogger {
    config: MonitoringConfig,
}

/// Context for a single API operation
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub correlation_id: String,
    /// "list", "create"
    pub operation_type: String,
    /// Parent path the call is scoped to, plus the collection
    pub resource: String,
    pub start_time: Instant,
}

/// Outcome of a finished API operation
#[derive(Debug, Clone)]
pub struct OperationMetrics {
    pub duration: Duration,
    pub retry_attempts: u32,
    pub success: bool,
    pub status_code: Option<u16>,
    pub error_message: Option<String>,
}

impl ApiLogger {
    pub fn new(config: MonitoringConfig) -> Self {
        Self { config }
    }

    /// Start tracking a new operation
    pub fn start_operation(&self, operation_type: &str, resource: &str) -> OperationContext {
        let correlation_id = if self.config.correlation_ids {
            uuid::Uuid::new_v4().to_string()
        } else {
            String::new()
        };

        let context = OperationContext {
            correlation_id,
            operation_type: operation_type.to_string(),
            resource: resource.to_string(),
            start_time: Instant::now(),
        };

        if self.config.request_logging && self.should_log(LogLevel::Debug) {
            debug!(
                "API Operation Started: {}",
                self.event(&context, "operation_started", json!({}))
            );
        }

        context
    }

    /// Log a scheduled retry
    pub fn log_retry(&self, context: &OperationContext, attempt: u32, error: &str, delay: Duration) {
        if !self.should_log(LogLevel::Warn) {
            return;
        }

        let log_data = self.event(
            context,
            "retry_attempt",
            json!({
                "attempt": attempt,
                "error": error,
                "delay_ms": delay.as_millis(),
            }),
        );
        warn!("Retry Attempt: {}", log_data);
    }

    /// Complete an operation and log its outcome
    pub fn complete_operation(&self, context: &OperationContext, metrics: &OperationMetrics) {
        if !self.config.request_logging {
            return;
        }

        let log_data = self.event(
            context,
            "operation_completed",
            json!({
                "duration_ms": metrics.duration.as_millis(),
                "retry_attempts": metrics.retry_attempts,
                "success": metrics.success,
                "status_code": metrics.status_code,
                "error_message": metrics.error_message,
            }),
        );

        if metrics.success {
            if self.should_log(LogLevel::Debug) {
                debug!("API Operation Completed: {}", log_data);
            }
        } else if self.should_log(LogLevel::Error) {
            error!("API Operation Failed: {}", log_data);
        }
    }

    /// Log a rate limiter delay that exceeded a second
    pub fn log_throttled(&self, context: &OperationContext, waited: Duration) {
        if self.should_log(LogLevel::Info) {
            info!(
                "Throttled: {}",
                self.event(context, "rate_limited", json!({ "waited_ms": waited.as_millis() }))
            );
        }
    }

    fn event(&self, context: &OperationContext, event: &str, extra: Value) -> Value {
        let mut data = json!({
            "event": event,
            "correlation_id": context.correlation_id,
            "operation_type": context.operation_type,
            "resource": context.resource,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        if let (Some(target), Value::Object(fields)) = (data.as_object_mut(), extra) {
            target.extend(fields);
        }
        data
    }

    fn should_log(&self, level: LogLevel) -> bool {
        level <= self.config.log_level
    }
}

impl OperationContext {
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn create_metrics(
        &self,
        success: bool,
        retry_attempts: u32,
        status_code: Option<u16>,
        error_message: Option<String>,
    ) -> OperationMetrics {
        OperationMetrics {
            duration: self.elapsed(),
            retry_attempts,
            success,
            status_code,
            error_message,
        }
    }
}
