//! Common types used throughout the geoDB client
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for transport retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Bounding Box Comparison Mode
// ============================================================================

/// How geometries are matched against a bounding box in
/// [`get_collection_by_bbox`](crate::client::GeoDbClient::get_collection_by_bbox)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BboxMode {
    /// The bounding box contains the geometry
    #[default]
    Contains,
    /// The geometry lies within the bounding box
    Within,
}

impl BboxMode {
    /// Wire value expected by the `geodb_get_by_bbox` stored procedure
    pub fn as_str(self) -> &'static str {
        match self {
            BboxMode::Contains => "contains",
            BboxMode::Within => "within",
        }
    }
}

// ============================================================================
// Filter Combinator
// ============================================================================

/// Operator combining the bbox condition with an additional `where` clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterOp {
    /// Both conditions must hold
    #[default]
    And,
    /// Either condition may hold
    Or,
}

impl FilterOp {
    /// Wire value expected by the stored procedures
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::And => "AND",
            FilterOp::Or => "OR",
        }
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}
