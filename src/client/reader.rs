//! Page fetcher bound to one collection

use crate::client::GeoDbClient;
use crate::decode::RowSet;
use crate::error::Result;
use crate::pagination::{PageFetcher, PageRequest};
use async_trait::async_trait;

/// [`PageFetcher`] over one collection of one database.
///
/// The collection, database and base query are fixed at construction,
/// so every page of a pass reads the same relation with the same filter
/// and only the window moves. Obtained from
/// [`GeoDbClient::iterate_collection`].
#[derive(Debug, Clone)]
pub struct CollectionReader {
    client: GeoDbClient,
    dataset: String,
}

impl CollectionReader {
    pub(super) fn new(client: GeoDbClient, dataset: String) -> Self {
        Self { client, dataset }
    }

    /// The namespaced `{database}_{collection}` name this reader reads
    pub fn dataset(&self) -> &str {
        &self.dataset
    }
}

#[async_trait]
impl PageFetcher for CollectionReader {
    async fn fetch_page(&self, request: &PageRequest) -> Result<RowSet> {
        let mut query = String::new();
        if let Some(base) = request.query() {
            query.push_str(base);
            query.push('&');
        }
        query.push_str(&format!(
            "limit={}&offset={}",
            request.limit(),
            request.offset()
        ));
        self.client.fetch_rows(&self.dataset, Some(&query)).await
    }
}
