//! Auth configuration types

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Authentication configuration
#[derive(Debug, Clone, Default)]
pub enum AuthConfig {
    /// No authentication (anonymous PostgREST access)
    #[default]
    None,

    /// Pre-acquired bearer token
    Bearer {
        /// The access token
        token: String,
    },

    /// OAuth2 client-credentials flow against the auth domain
    ClientCredentials {
        /// Token endpoint URL
        token_url: String,
        /// Client ID
        client_id: String,
        /// Client secret
        client_secret: String,
        /// Token audience
        audience: String,
    },

    /// Resource-owner password flow against the auth domain
    Password {
        /// Token endpoint URL
        token_url: String,
        /// Client ID
        client_id: String,
        /// Client secret
        client_secret: String,
        /// Token audience
        audience: String,
        /// Username
        username: String,
        /// Password
        password: String,
    },
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false, // No expiration = never expires
        }
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    pub(crate) fn into_cached_token(self) -> Option<CachedToken> {
        let token = self.access_token?;
        Some(match self.expires_in {
            Some(seconds) => CachedToken::expires_in(token, seconds),
            None => CachedToken::new(token, None),
        })
    }
}
