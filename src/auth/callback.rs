//! Loopback listener that receives Google's redirect after consent
//!
//! The server answers on the redirect URL's path only, hands the first
//! `code` (or `error`) it sees to the waiting caller, and then shuts down.

use super::error::AuthError;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use log::{debug, info, warn};
use reqwest::Url;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const SUCCESS_MESSAGE: &str = "Authentication successful! Please return to the console.";

/// Where the redirect URL says the browser will come back to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackTarget {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl CallbackTarget {
    pub fn parse(redirect_url: &str) -> Result<Self, AuthError> {
        let invalid = |message: &str| AuthError::InvalidRedirect {
            url: redirect_url.to_string(),
            message: message.to_string(),
        };

        let url = Url::parse(redirect_url).map_err(|e| invalid(&e.to_string()))?;
        if url.scheme() != "http" {
            return Err(invalid("only http loopback redirects can be served locally"));
        }
        let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| invalid("missing port"))?;

        Ok(Self {
            host: host.trim_matches(|c: char| c == '[' || c == ']').to_string(),
            port,
            path: url.path().to_string(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

impl CallbackQuery {
    /// `None` when the request carries neither a code nor an error, e.g. a
    /// stray favicon-style hit on the callback path.
    pub fn outcome(self) -> Option<Result<String, AuthError>> {
        match (self.code, self.error) {
            (_, Some(error)) => Some(Err(AuthError::Denied(error))),
            (Some(code), None) if !code.is_empty() => Some(Ok(code)),
            _ => None,
        }
    }
}

type ResultSender = Arc<Mutex<Option<oneshot::Sender<Result<String, AuthError>>>>>;

pub struct CallbackServer {
    local_addr: SocketAddr,
    result_rx: oneshot::Receiver<Result<String, AuthError>>,
    shutdown_tx: oneshot::Sender<()>,
    server: JoinHandle<std::io::Result<()>>,
}

impl CallbackServer {
    /// Start listening on the host, port and path of `redirect_url`
    pub async fn bind(redirect_url: &str) -> Result<Self, AuthError> {
        let target = CallbackTarget::parse(redirect_url)?;
        Self::bind_target(&target).await
    }

    pub async fn bind_target(target: &CallbackTarget) -> Result<Self, AuthError> {
        let listener = TcpListener::bind((target.host.as_str(), target.port))
            .await
            .map_err(|e| {
                AuthError::Callback(format!("cannot listen on {}:{}: {}", target.host, target.port, e))
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| AuthError::Callback(e.to_string()))?;

        let (result_tx, result_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let sender: ResultSender = Arc::new(Mutex::new(Some(result_tx)));

        let app = Router::new()
            .route(&target.path, get(handle_callback))
            .with_state(sender);

        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!("Waiting for OAuth callback on http://{}{}", local_addr, target.path);
        Ok(Self {
            local_addr,
            result_rx,
            shutdown_tx,
            server,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the browser to come back, then stop the server
    pub async fn wait(self) -> Result<String, AuthError> {
        let result = self
            .result_rx
            .await
            .map_err(|_| AuthError::Callback("server stopped before a code arrived".to_string()));

        let _ = self.shutdown_tx.send(());
        match self.server.await {
            Ok(Ok(())) => debug!("OAuth callback server stopped"),
            Ok(Err(e)) => warn!("OAuth callback server error: {}", e),
            Err(e) => warn!("OAuth callback server task failed: {}", e),
        }

        result?
    }
}

async fn handle_callback(
    State(sender): State<ResultSender>,
    Query(query): Query<CallbackQuery>,
) -> (StatusCode, String) {
    let Some(outcome) = query.outcome() else {
        return (
            StatusCode::BAD_REQUEST,
            "Missing authorization code".to_string(),
        );
    };

    let response = match &outcome {
        Ok(_) => (StatusCode::OK, SUCCESS_MESSAGE.to_string()),
        Err(e) => (StatusCode::OK, format!("Authentication failed: {}", e)),
    };

    let sender = sender
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take();
    match sender {
        Some(tx) => {
            let _ = tx.send(outcome);
        }
        None => debug!("Ignoring repeated OAuth callback"),
    }

    response
}
