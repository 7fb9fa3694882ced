use super::credentials::OAuthCredentials;
use super::error::AuthError;
use crate::api::constants::scopes;
use serde_json::Value;
use std::time::{Duration, SystemTime};

pub const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub access_token: String,
    pub expires_at: SystemTime,
    pub refresh_token: Option<String>,
}

/// Google's OAuth2 authorization-code flow for installed apps
pub struct GoogleAuthClient {
    credentials: OAuthCredentials,
    http_client: reqwest::Client,
    token_url: String,
}

impl GoogleAuthClient {
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            http_client: reqwest::Client::new(),
            token_url: TOKEN_URL.to_string(),
        }
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    pub fn credentials(&self) -> &OAuthCredentials {
        &self.credentials
    }

    /// Consent page URL asking for offline access to the Tag Manager scopes
    pub fn authorize_url(&self) -> String {
        let scope = scopes::ALL.join(" ");
        format!(
            "{}?access_type=offline&response_type=code&client_id={}&redirect_uri={}&scope={}",
            AUTHORIZE_URL,
            urlencoding::encode(&self.credentials.client_id),
            urlencoding::encode(&self.credentials.redirect_url),
            urlencoding::encode(&scope),
        )
    }

    /// Trade the callback's authorization code for tokens
    pub async fn exchange_code(&self, code: &str) -> Result<TokenInfo, AuthError> {
        log::info!("Exchanging authorization code for tokens");

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", &self.credentials.client_id),
                ("client_secret", &self.credentials.client_secret),
                ("redirect_uri", &self.credentials.redirect_url),
            ])
            .send()
            .await?;

        let status = response.status();
        log::debug!("Token request status: {}", status);

        if !status.is_success() {
            let body = response.text().await?;
            return Err(AuthError::TokenRejected {
                status: status.as_u16(),
                message: token_error_message(&body),
            });
        }

        let token_data: Value = response.json().await?;
        parse_token_response(&token_data)
    }
}

fn parse_token_response(token_data: &Value) -> Result<TokenInfo, AuthError> {
    let access_token = token_data
        .get("access_token")
        .and_then(Value::as_str)
        .ok_or(AuthError::MissingAccessToken)?;

    // Google documents one hour when expires_in is left out
    let expires_in = token_data
        .get("expires_in")
        .and_then(Value::as_u64)
        .unwrap_or(3600);

    Ok(TokenInfo {
        access_token: access_token.to_string(),
        expires_at: SystemTime::now() + Duration::from_secs(expires_in),
        refresh_token: token_data
            .get("refresh_token")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

/// `error_description`, then `error`, then the raw body
fn token_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error_description")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
