//! Client configuration
//!
//! [`GeoDbConfig`] carries everything needed to talk to a geoDB service:
//! the PostgREST endpoint, the default database, the auth settings and the
//! HTTP tuning knobs. Values can come from a builder, from `GEODB_*`
//! environment variables, or from a dotenv file (lowest to highest
//! precedence: defaults, dotenv/env, explicit builder values).

use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::types::{BackoffType, OptionStringExt};
use std::env;
use std::time::Duration;

/// Default OAuth2 token path on the auth domain
pub const DEFAULT_TOKEN_PATH: &str = "/oauth/token";

/// Configuration for [`GeoDbClient`](crate::client::GeoDbClient)
#[derive(Debug, Clone)]
pub struct GeoDbConfig {
    /// Base URL of the PostgREST service
    pub server_url: String,
    /// Optional port appended to the server URL
    pub server_port: Option<u16>,
    /// Default database (falls back to `whoami` when absent)
    pub database: Option<String>,
    /// Authentication settings
    pub auth: AuthConfig,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of transport retries
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// User agent string
    pub user_agent: String,
}

impl Default for GeoDbConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            server_port: None,
            database: None,
            auth: AuthConfig::default(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            user_agent: format!("geodb-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl GeoDbConfig {
    /// Create a new config builder
    pub fn builder() -> GeoDbConfigBuilder {
        GeoDbConfigBuilder::default()
    }

    /// Build a configuration from `GEODB_*` environment variables,
    /// loading a `.env` file first when one is found.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env_vars()
    }

    /// Build a configuration from a specific dotenv file plus the
    /// process environment.
    pub fn from_dotenv(path: &str) -> Result<Self> {
        dotenvy::from_filename(path).ok();
        Self::from_env_vars()
    }

    fn from_env_vars() -> Result<Self> {
        let server_url =
            env_opt("GEODB_API_SERVER_URL").ok_or_else(|| Error::missing_field("server_url"))?;

        let server_port = match env_opt("GEODB_API_SERVER_PORT") {
            Some(raw) => Some(
                raw.parse::<u16>()
                    .map_err(|_| Error::config(format!("invalid server port '{raw}'")))?,
            ),
            None => None,
        };

        Ok(Self {
            server_url,
            server_port,
            database: env_opt("GEODB_DATABASE"),
            auth: auth_from_env()?,
            ..Self::default()
        })
    }

    /// Full endpoint URL, validated and with the port applied
    pub fn endpoint(&self) -> Result<String> {
        let base = self.server_url.trim_end_matches('/');
        let endpoint = match self.server_port {
            Some(port) => format!("{base}:{port}"),
            None => base.to_string(),
        };
        // Fail early on a malformed endpoint rather than on the first request.
        url::Url::parse(&endpoint)?;
        Ok(endpoint)
    }
}

/// Read the auth settings from the environment
fn auth_from_env() -> Result<AuthConfig> {
    // A pre-acquired access token short-circuits any flow configuration.
    if let Some(token) = env_opt("GEODB_AUTH_ACCESS_TOKEN") {
        return Ok(AuthConfig::Bearer { token });
    }

    let mode = env_opt("GEODB_AUTH_MODE");
    let Some(mode) = mode else {
        return Ok(AuthConfig::None);
    };

    let domain = env_opt("GEODB_AUTH_DOMAIN")
        .ok_or_else(|| Error::missing_field("GEODB_AUTH_DOMAIN"))?;
    let token_url = env_opt("GEODB_AUTH_ACCESS_TOKEN_URI").unwrap_or_else(|| {
        format!("{}{}", domain.trim_end_matches('/'), DEFAULT_TOKEN_PATH)
    });
    let client_id =
        env_opt("GEODB_AUTH_CLIENT_ID").ok_or_else(|| Error::missing_field("GEODB_AUTH_CLIENT_ID"))?;
    let client_secret = env_opt("GEODB_AUTH_CLIENT_SECRET")
        .ok_or_else(|| Error::missing_field("GEODB_AUTH_CLIENT_SECRET"))?;
    let audience =
        env_opt("GEODB_AUTH_AUD").ok_or_else(|| Error::missing_field("GEODB_AUTH_AUD"))?;

    match mode.as_str() {
        "client-credentials" => Ok(AuthConfig::ClientCredentials {
            token_url,
            client_id,
            client_secret,
            audience,
        }),
        "password" => Ok(AuthConfig::Password {
            token_url,
            client_id,
            client_secret,
            audience,
            username: env_opt("GEODB_AUTH_USERNAME")
                .ok_or_else(|| Error::missing_field("GEODB_AUTH_USERNAME"))?,
            password: env_opt("GEODB_AUTH_PASSWORD")
                .ok_or_else(|| Error::missing_field("GEODB_AUTH_PASSWORD"))?,
        }),
        "interactive" => Err(Error::config(
            "the interactive auth mode is not supported by this client",
        )),
        other => Err(Error::config(format!(
            "auth mode can only be 'password' or 'client-credentials', got '{other}'"
        ))),
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().none_if_empty()
}

/// Builder for [`GeoDbConfig`]
#[derive(Default)]
pub struct GeoDbConfigBuilder {
    config: GeoDbConfig,
}

impl GeoDbConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into();
        self
    }

    /// Set the server port
    pub fn server_port(mut self, port: u16) -> Self {
        self.config.server_port = Some(port);
        self
    }

    /// Set the default database
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.database = Some(database.into());
        self
    }

    /// Set the auth configuration
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.config.auth = auth;
        self
    }

    /// Use a pre-acquired bearer token
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.auth = AuthConfig::Bearer {
            token: token.into(),
        };
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> GeoDbConfig {
        self.config
    }
}
