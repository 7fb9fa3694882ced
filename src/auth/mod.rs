//! OAuth2 consent flow for the Tag Manager API
//!
//! The consent URL is opened in the default browser (and printed, for
//! headless machines), Google redirects back to a local listener with an
//! authorization code, and the code is exchanged for an access token.

pub mod callback;
pub mod client;
pub mod credentials;
pub mod error;

pub use callback::CallbackServer;
pub use client::{GoogleAuthClient, TokenInfo};
pub use credentials::OAuthCredentials;
pub use error::AuthError;

use colored::*;

/// Run the full browser flow and return a fresh access token
pub async fn authenticate(credentials: OAuthCredentials) -> Result<TokenInfo, AuthError> {
    let client = GoogleAuthClient::new(credentials);

    // listen before printing the URL so a fast redirect cannot be missed
    let server = CallbackServer::bind(&client.credentials().redirect_url).await?;

    let url = client.authorize_url();
    println!("{}", "Authorize this app by visiting this URL:".bold());
    println!("{}", url.cyan());
    open_consent_page(&url, webbrowser::open);

    let code = server.wait().await?;
    let token = client.exchange_code(&code).await?;

    log::info!("Successfully authenticated with Google");
    Ok(token)
}

/// Hand the consent URL to `open`; a failure only means the user has to
/// copy the printed URL themselves.
fn open_consent_page<F>(url: &str, open: F) -> bool
where
    F: FnOnce(&str) -> std::io::Result<()>,
{
    match open(url) {
        Ok(()) => {
            log::debug!("Opened consent page in the default browser");
            true
        }
        Err(e) => {
            log::warn!("Could not open a browser ({}), open the URL above manually", e);
            false
        }
    }
}
