//! Authenticator implementation
//!
//! Handles applying bearer authentication to requests and managing
//! token acquisition and refresh.

use super::types::{AuthConfig, CachedToken, TokenResponse};
use crate::error::{Error, Result};
use reqwest::{Client, RequestBuilder};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Authenticator handles applying authentication to HTTP requests
#[derive(Clone)]
pub struct Authenticator {
    /// Auth configuration
    config: AuthConfig,
    /// Cached token for the OAuth2 flows
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    /// HTTP client for token requests
    http_client: Client,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Create an authenticator with a custom HTTP client
    pub fn with_client(config: AuthConfig, http_client: Client) -> Self {
        Self {
            config,
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
        }
    }

    /// Apply authentication to a request builder
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        match &self.config {
            AuthConfig::None => Ok(req),

            AuthConfig::Bearer { token } => Ok(req.bearer_auth(token)),

            AuthConfig::ClientCredentials { .. } | AuthConfig::Password { .. } => {
                let token = self.get_or_refresh_token().await?;
                Ok(req.bearer_auth(token))
            }
        }
    }

    /// Drop any cached token, forcing a fresh fetch on the next request
    pub async fn invalidate(&self) {
        *self.cached_token.write().await = None;
    }

    /// Get a valid token, refreshing if necessary
    async fn get_or_refresh_token(&self) -> Result<String> {
        // Check if we have a valid cached token
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        // Need to refresh - acquire write lock
        let mut cached = self.cached_token.write().await;

        // Double-check after acquiring write lock (another task might have refreshed)
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let new_token = self.fetch_new_token().await?;
        let token_str = new_token.token.clone();
        *cached = Some(new_token);

        Ok(token_str)
    }

    /// Fetch a new token based on the configured flow
    async fn fetch_new_token(&self) -> Result<CachedToken> {
        match &self.config {
            AuthConfig::ClientCredentials {
                token_url,
                client_id,
                client_secret,
                audience,
            } => {
                debug!("fetching access token (client-credentials) from {token_url}");
                // The geoDB auth service takes the client-credentials
                // request as a JSON body.
                let payload = json!({
                    "client_id": client_id,
                    "client_secret": client_secret,
                    "audience": audience,
                    "grant_type": "client_credentials",
                });
                let response = self
                    .http_client
                    .post(token_url)
                    .json(&payload)
                    .send()
                    .await
                    .map_err(Error::Http)?;
                parse_token_response(response).await
            }

            AuthConfig::Password {
                token_url,
                client_id,
                client_secret,
                audience,
                username,
                password,
            } => {
                debug!("fetching access token (password grant) from {token_url}");
                // The password grant goes out form-urlencoded.
                let form = [
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("username", username.as_str()),
                    ("password", password.as_str()),
                    ("audience", audience.as_str()),
                    ("grant_type", "password"),
                ];
                let response = self
                    .http_client
                    .post(token_url)
                    .form(&form)
                    .send()
                    .await
                    .map_err(Error::Http)?;
                parse_token_response(response).await
            }

            _ => Err(Error::auth(
                "token refresh not supported for this auth type",
            )),
        }
    }
}

async fn parse_token_response(response: reqwest::Response) -> Result<CachedToken> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::token_refresh(format!(
            "token request failed with status {status}: {body}"
        )));
    }

    let token_response: TokenResponse = response.json().await.map_err(Error::Http)?;
    token_response.into_cached_token().ok_or_else(|| {
        Error::token_refresh("the authorization request did not return an access token")
    })
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("config", &auth_kind(&self.config))
            .finish_non_exhaustive()
    }
}

fn auth_kind(config: &AuthConfig) -> &'static str {
    match config {
        AuthConfig::None => "none",
        AuthConfig::Bearer { .. } => "bearer",
        AuthConfig::ClientCredentials { .. } => "client-credentials",
        AuthConfig::Password { .. } => "password",
    }
}
