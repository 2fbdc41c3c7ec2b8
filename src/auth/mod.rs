//! Authentication module
//!
//! Supports: pre-acquired bearer tokens, OAuth2 client-credentials and
//! resource-owner password flows, with in-memory token caching.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, CachedToken};
