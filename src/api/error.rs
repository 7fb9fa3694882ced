use super::resilience::{Retryable, RetryableError};
use serde_json::Value;
use thiserror::Error;

/// Failure of a single Tag Manager API call
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API answered with a non-success status
    #[error("{method} {url} returned {status}: {message}")]
    Http {
        status: u16,
        method: String,
        url: String,
        message: String,
    },

    /// The request never produced a response
    #[error("{method} {url} failed: {source}")]
    Network {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not what the API documents
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    /// Workspace lookup failed earlier, so there is no parent path to call
    #[error("no workspace resolved for accounts/{account_id}/containers/{container_id}")]
    MissingWorkspace {
        account_id: String,
        container_id: String,
    },
}

impl ApiError {
    /// Build an `Http` error, pulling the message out of Google's error envelope
    /// (`{"error": {"code": .., "message": ..}}`) when there is one.
    pub fn from_response(status: u16, method: &str, url: &str, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.trim().to_string());

        ApiError::Http {
            status,
            method: method.to_string(),
            url: url.to_string(),
            message,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl Retryable for ApiError {
    fn classify(&self) -> RetryableError {
        match self {
            ApiError::Http { status, .. } => RetryableError::from_status_code(*status),
            ApiError::Network { source, .. } => match RetryableError::from_reqwest_error(source) {
                // a body that broke off mid-stream is still worth another try
                RetryableError::Unknown => RetryableError::Network,
                other => other,
            },
            ApiError::Decode { .. } | ApiError::MissingWorkspace { .. } => RetryableError::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_error_envelope_message() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        let error = ApiError::from_response(429, "POST", "https://x/tags", body);

        assert_eq!(error.status(), Some(429));
        assert!(error.to_string().contains("Quota exceeded"));
        assert!(error.classify().should_retry());
    }

    #[test]
    fn test_plain_body_is_kept() {
        let error = ApiError::from_response(502, "GET", "https://x", "Bad Gateway\n");
        match &error {
            ApiError::Http { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(error.classify().should_retry());
    }

    #[test]
    fn test_client_errors_are_not_retried() {
        assert!(!ApiError::from_response(400, "POST", "u", "{}").classify().should_retry());
        assert!(!ApiError::from_response(403, "POST", "u", "{}").classify().should_retry());
        let missing = ApiError::MissingWorkspace {
            account_id: "1".into(),
            container_id: "2".into(),
        };
        assert!(!missing.classify().should_retry());
    }
}
