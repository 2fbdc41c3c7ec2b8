//! PostgREST transport
//!
//! A thin HTTP client over the geoDB PostgREST endpoint:
//! - common headers (`Prefer: return=representation`, JSON content type)
//! - bearer authentication via the [`Authenticator`]
//! - bounded retries with configurable backoff for transport-level failures
//! - non-success statuses surfaced as [`Error::HttpStatus`] with the
//!   response body, matching what the database reports

use crate::auth::Authenticator;
use crate::config::GeoDbConfig;
use crate::error::{is_retryable_status, Error, Result};
use crate::types::BackoffType;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client bound to a geoDB endpoint
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    endpoint: String,
    authenticator: Authenticator,
    timeout: Duration,
    max_retries: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    backoff_type: BackoffType,
}

impl HttpClient {
    /// Create a client from a validated configuration
    pub fn from_config(config: &GeoDbConfig) -> Result<Self> {
        let endpoint = config.endpoint()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(Error::Http)?;

        let authenticator = Authenticator::with_client(config.auth.clone(), client.clone());

        Ok(Self {
            client,
            endpoint,
            authenticator,
            timeout: config.timeout,
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            backoff_type: config.backoff_type,
        })
    }

    /// The endpoint this client talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The authenticator used for bearer auth
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Value> {
        self.request(Method::GET, path, None, &[]).await
    }

    /// Make a POST request with a JSON payload
    pub async fn post(&self, path: &str, payload: &Value) -> Result<Value> {
        self.request(Method::POST, path, Some(payload), &[]).await
    }

    /// Make a POST request with extra headers overriding the common set
    pub async fn post_with_headers(
        &self,
        path: &str,
        payload: &Value,
        headers: &[(&str, &str)],
    ) -> Result<Value> {
        self.request(Method::POST, path, Some(payload), headers)
            .await
    }

    /// Make a PATCH request with a JSON payload
    pub async fn patch(&self, path: &str, payload: &Value) -> Result<Value> {
        self.request(Method::PATCH, path, Some(payload), &[]).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.request(Method::DELETE, path, None, &[]).await
    }

    /// Make a generic request against the endpoint
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
        headers: &[(&str, &str)],
    ) -> Result<Value> {
        let url = self.build_url(path);

        let mut last_error = None;
        let mut attempt = 0;

        while attempt <= self.max_retries {
            let mut req = self
                .client
                .request(method.clone(), &url)
                .header("Prefer", "return=representation");

            for (key, value) in headers {
                req = req.header(*key, *value);
            }

            if let Some(body) = payload {
                req = req.json(body);
            }

            req = self.authenticator.apply(req).await?;

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if is_retryable_status(status.as_u16()) && attempt < self.max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "request failed with {}, attempt {}/{}, retrying in {:?}",
                            status.as_u16(),
                            attempt + 1,
                            self.max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        last_error = Some(Error::HttpStatus {
                            status: status.as_u16(),
                            body: String::new(),
                        });
                        continue;
                    }

                    // Surface what the database reported, verbatim.
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        return Err(Error::HttpStatus {
                            status: status.as_u16(),
                            body,
                        });
                    }

                    debug!("request succeeded: {} {}", method, url);
                    return parse_body(response).await;
                }
                Err(e) => {
                    if e.is_timeout() {
                        if attempt < self.max_retries {
                            let delay = self.calculate_backoff(attempt);
                            warn!(
                                "request timeout, attempt {}/{}, retrying in {:?}",
                                attempt + 1,
                                self.max_retries + 1,
                                delay
                            );
                            tokio::time::sleep(delay).await;
                            attempt += 1;
                            last_error = Some(Error::Timeout {
                                timeout_ms: self.timeout.as_millis() as u64,
                            });
                            continue;
                        }
                        return Err(Error::Timeout {
                            timeout_ms: self.timeout.as_millis() as u64,
                        });
                    }

                    if e.is_connect() && attempt < self.max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "connection error, attempt {}/{}, retrying in {:?}",
                            attempt + 1,
                            self.max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        last_error = Some(Error::Http(e));
                        continue;
                    }

                    return Err(Error::Http(e));
                }
            }
        }

        // Exhausted all retries
        Err(last_error.unwrap_or(Error::MaxRetriesExceeded {
            max_retries: self.max_retries,
        }))
    }

    /// Build full URL from an API path
    fn build_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.endpoint, path)
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.backoff_type {
            BackoffType::Constant => self.initial_backoff,
            BackoffType::Linear => self.initial_backoff * (attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.initial_backoff * factor
            }
        };

        std::cmp::min(delay, self.max_backoff)
    }
}

/// Parse a successful response body as JSON.
///
/// PostgREST answers some write operations (DELETE in particular) with
/// 204 or an empty body; those come back as `Value::Null`.
async fn parse_body(response: reqwest::Response) -> Result<Value> {
    if response.status() == StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }
    let text = response.text().await.map_err(Error::Http)?;
    if text.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("endpoint", &self.endpoint)
            .field("max_retries", &self.max_retries)
            .field("backoff_type", &self.backoff_type)
            .finish_non_exhaustive()
    }
}
