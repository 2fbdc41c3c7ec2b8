//! HTTP transport module
//!
//! Thin PostgREST client with bearer auth, common headers and bounded
//! retry with backoff for transport-level failures.

mod client;

pub use client::HttpClient;
