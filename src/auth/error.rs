use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0} environment variable not set")]
    MissingEnv(&'static str),

    #[error("invalid redirect URL '{url}': {message}")]
    InvalidRedirect { url: String, message: String },

    /// The loopback listener could not be started or stopped unexpectedly
    #[error("OAuth callback server failed: {0}")]
    Callback(String),

    /// Google redirected back with `?error=...`
    #[error("authorization was denied: {0}")]
    Denied(String),

    #[error("token request failed: {0}")]
    TokenRequest(#[from] reqwest::Error),

    #[error("token endpoint returned {status}: {message}")]
    TokenRejected { status: u16, message: String },

    #[error("no access token in token response")]
    MissingAccessToken,
}
