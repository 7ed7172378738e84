//! OAuth2 authorization-code flow against the TickTick authorization server.
//!
//! # Overview
//! 1. [`Authenticator::authorize`] builds the authorization URL with a fresh
//!    state token, starts a local listener on the redirect URL, hands the
//!    URL to the caller once the listener is up, and resolves with the
//!    authorization code carried by the single redirect it accepts.
//! 2. [`Authenticator::get_token`] exchanges the code for an [`OAuthToken`].
//!
//! The exchange follows the build/parse split of the REST client, so it can
//! be tested without a network.
//!
//! There is no built-in timeout: wrap `authorize` in `tokio::time::timeout`
//! if the user may never come back. The listener is torn down either way.

mod callback;
mod types;

use std::fmt;

use tracing::{info, warn};
use url::form_urlencoded;
use uuid::Uuid;

use crate::client::decode;
use crate::error::{ApiError, AuthError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, CONTENT_TYPE, FORM_URLENCODED};
use crate::transport::Transport;

use callback::{CallbackListener, RedirectTarget};

pub use types::{ErrorResponse, OAuthErrorCode, OAuthToken, Scope, TokenType};

/// Root of the authorization server.
pub const DEFAULT_AUTH_URL: &str = "https://ticktick.com";

/// Registered application credentials.
#[derive(Clone)]
pub struct ApplicationConfig {
    /// Must be a plain `http://` URL reachable on this machine.
    pub redirect_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ApplicationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationConfig")
            .field("redirect_url", &self.redirect_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Authenticator {
    config: ApplicationConfig,
    root_url: String,
}

impl Authenticator {
    pub fn new(config: ApplicationConfig) -> Self {
        Self::with_root_url(config, DEFAULT_AUTH_URL)
    }

    /// Point the flow at another authorization server (tests, proxies).
    pub fn with_root_url(config: ApplicationConfig, root_url: &str) -> Self {
        Self {
            config,
            root_url: root_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn config(&self) -> &ApplicationConfig {
        &self.config
    }

    /// Authorization URL for `scopes` and the given state token.
    ///
    /// Parameters are concatenated verbatim and scopes are joined with a
    /// literal `%20`, which is what the authorization server expects.
    pub fn authorization_url(&self, scopes: &[Scope], state: &str) -> String {
        let scope = types::join_scopes(scopes, "%20");
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("scope", scope.as_str()),
            ("state", state),
            ("redirect_uri", self.config.redirect_url.as_str()),
            ("response_type", "code"),
        ]
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
        format!("{}/oauth/authorize?{params}", self.root_url)
    }

    /// Run the browser leg of the flow and return the authorization code.
    ///
    /// `request_user_authorization` receives the authorization URL once the
    /// redirect listener accepts connections; it is expected to send the
    /// user there (e.g. open a browser). Exactly one redirect is processed.
    pub async fn authorize<F>(
        &self,
        scopes: &[Scope],
        request_user_authorization: F,
    ) -> Result<String, AuthError>
    where
        F: FnOnce(&str),
    {
        let state = Uuid::new_v4().to_string();
        let url = self.authorization_url(scopes, &state);
        let target = RedirectTarget::parse(&self.config.redirect_url)?;

        let listener = CallbackListener::bind(&target, &state).await?;
        info!(addr = %listener.local_addr(), "waiting for authorization redirect");
        request_user_authorization(&url);

        let code = listener.wait().await?;
        info!("authorization code received");
        Ok(code)
    }

    /// Form-encoded token request exchanging `code` for an access token.
    pub fn build_token_request(&self, code: &str, scopes: &[Scope]) -> HttpRequest {
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.config.client_id)
            .append_pair("client_secret", &self.config.client_secret)
            .append_pair("code", code)
            .append_pair("grant_type", "authorization_code")
            .append_pair("scope", &types::join_scopes(scopes, " "))
            .append_pair("redirect_uri", &self.config.redirect_url)
            .finish();
        HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/oauth/token", self.root_url),
            headers: vec![(CONTENT_TYPE.to_string(), FORM_URLENCODED.to_string())],
            body: Some(body),
        }
    }

    pub fn parse_token(&self, response: HttpResponse) -> Result<OAuthToken, ApiError> {
        if !response.is_success() {
            if let Ok(envelope) = serde_json::from_str::<ErrorResponse>(&response.body) {
                warn!(
                    status = response.status,
                    error = ?envelope.error,
                    description = envelope.error_description.as_deref().unwrap_or(""),
                    "token request rejected"
                );
            }
        }
        decode(response)
    }

    /// Exchange an authorization code for a token over `transport`.
    pub fn get_token<T: Transport>(
        &self,
        transport: &T,
        code: &str,
        scopes: &[Scope],
    ) -> Result<OAuthToken, ApiError> {
        let response = transport.execute(self.build_token_request(code, scopes))?;
        self.parse_token(response)
    }
}
