use super::error::AuthError;
use log::info;

pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:3000/oauth2callback";

/// OAuth client registration for an installed application
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl OAuthCredentials {
    /// Read `CLIENT_ID`, `CLIENT_SECRET` and `REDIRECT_URL` from the
    /// environment. Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<OAuthCredentials, AuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<OAuthCredentials, AuthError> {
        info!("Importing OAuth client from environment variables");

        let client_id = lookup("CLIENT_ID")
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::MissingEnv("CLIENT_ID"))?;
        let client_secret = lookup("CLIENT_SECRET")
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::MissingEnv("CLIENT_SECRET"))?;
        let redirect_url = lookup("REDIRECT_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_REDIRECT_URL.to_string());

        Ok(OAuthCredentials {
            client_id,
            client_secret,
            redirect_url,
        })
    }
}
