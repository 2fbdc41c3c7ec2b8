// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]

//! # geoDB Client
//!
//! Rust client for a geospatial database service exposed through a
//! PostgREST API backed by PostgreSQL/PostGIS.
//!
//! ## Features
//!
//! - **Collections**: create, drop, rename, copy and publish
//!   geometry-bearing tables
//! - **CRUD**: bounded reads with opaque PostgREST filters, chunked
//!   inserts, updates and deletes by query
//! - **Paginated iteration**: lazy offset/limit paging over collections
//!   of unknown size
//! - **Geometry decoding**: hex-encoded (E)WKB from the wire into
//!   [`geo_types::Geometry`], EWKT back out on insert
//! - **Auth**: static bearer tokens, OAuth2 client-credentials and
//!   password flows with cached expiry
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use geodb_client::{GeoDbClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Configured through GEODB_* environment variables
//!     let client = GeoDbClient::from_env()?;
//!
//!     // One bounded read
//!     let rows = client
//!         .get_collection("land_use", Some("raba_id=eq.1410"), None)
//!         .await?;
//!
//!     // Page through a large collection
//!     let mut iterator = client
//!         .iterate_collection("land_use", Some("order=id"), 1000, None)
//!         .await?;
//!     let mut pages = iterator.pages();
//!     while let Some(page) = pages.try_next().await? {
//!         for row in &page {
//!             // Process rows
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          GeoDbClient                            │
//! │  collections CRUD    management RPCs    iterate_collection()    │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │   HTTP    │   Paginate    │  Decode   │   Config    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Bearer   │ GET/POST  │ PageFetcher   │ (E)WKB in │ Builder     │
//! │ OAuth2   │ Retry     │ Offset/limit  │ EWKT out  │ GEODB_* env │
//! │ Password │ Backoff   │ Stream        │ RowSet    │ dotenv      │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: Add docs before 1.0 release

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Client configuration
pub mod config;

/// Authentication flows and token caching
pub mod auth;

/// HTTP transport with retry and backoff
pub mod http;

/// Page payload conversion, including geometry decoding
pub mod decode;

/// Paginated collection iteration
pub mod pagination;

/// High-level geoDB operations
pub mod client;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use client::{
    BboxQuery, CollectionDef, CollectionReader, GeoDbClient, InsertOptions, PgQuery,
};
pub use config::GeoDbConfig;
pub use decode::{Row, RowSet};
pub use pagination::{CollectionIterator, PageFetcher, PageRequest};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
