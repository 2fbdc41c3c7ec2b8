//! Pagination types and the page-fetch contract

use crate::decode::RowSet;
use crate::error::Result;
use async_trait::async_trait;

/// One bounded read against a collection.
///
/// Assembled fresh for every step of a [`CollectionIterator`]
/// (crate::pagination::CollectionIterator) and immutable once issued;
/// the base query string travels through unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    query: Option<String>,
    limit: u32,
    offset: u64,
}

impl PageRequest {
    /// Create a page request
    pub fn new(query: Option<String>, limit: u32, offset: u64) -> Self {
        Self {
            query,
            limit,
            offset,
        }
    }

    /// The opaque base filter/order expression, passed through verbatim
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Maximum number of rows to return
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows to skip
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// Contract for running one bounded remote read.
///
/// Implementations are bound to a specific collection (and any fixed
/// parameters such as the database or an ordering clause) at construction
/// time. A fetch must be read-only and repeatable: calling it again with a
/// different offset must not mutate server state. Geometry columns arrive
/// already decoded inside the [`RowSet`]; errors surface as-is and the
/// iterator never retries or reinterprets them.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Execute one bounded read and return its rows (at most
    /// `request.limit()` of them)
    async fn fetch_page(&self, request: &PageRequest) -> Result<RowSet>;
}
