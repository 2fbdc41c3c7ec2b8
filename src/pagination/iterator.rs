//! Paginated iteration over a collection
//!
//! Drives a [`PageFetcher`] through consecutive offset/limit windows and
//! yields one [`RowSet`] per fetched page. Exhaustion is detected lazily:
//! the iterator keeps stepping until a page comes back empty (or the
//! configured stop page has been passed), so the collection is never
//! counted up front.

use crate::decode::RowSet;
use crate::error::Result;
use crate::pagination::types::{PageFetcher, PageRequest};
use futures::stream::{self, Stream};

/// Rows per page when none is configured
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Lazy page-by-page reader over a collection.
///
/// The iterator owns a cursor (the current page number) and nothing else:
/// no rows are cached, no total is tracked. Each step issues exactly one
/// fetch with `offset = page * page_size` and `limit = page_size`, advances
/// the cursor, and yields the page. A pass ends when a page comes back
/// empty or, if a stop page is set, once that page (inclusive) has been
/// fetched. Collecting the stream again restarts from the start page and
/// re-fetches everything.
#[derive(Debug)]
pub struct CollectionIterator<F> {
    fetcher: F,
    query: Option<String>,
    page_size: u32,
    start_page: u64,
    stop_page: Option<u64>,
    current_page: u64,
}

impl<F: PageFetcher> CollectionIterator<F> {
    /// Create an iterator over the full collection, starting at page 0.
    ///
    /// A `page_size` of 0 falls back to [`DEFAULT_PAGE_SIZE`].
    pub fn new(fetcher: F, query: Option<String>, page_size: u32) -> Self {
        let page_size = normalize_page_size(page_size);
        Self {
            fetcher,
            query,
            page_size,
            start_page: 0,
            stop_page: None,
            current_page: 0,
        }
    }

    /// Restrict the iterator to the page window `[start, stop]`.
    ///
    /// The stop page is inclusive, so `start == stop` yields exactly one
    /// page. `None` leaves the pass unbounded. The cursor moves back to
    /// the new start page.
    pub fn with_bounds(mut self, start_page: u64, stop_page: Option<u64>) -> Self {
        self.start_page = start_page;
        self.stop_page = stop_page;
        self.current_page = start_page;
        self
    }

    /// The fetcher this iterator drives
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Rows per page
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Change the page size; 0 falls back to [`DEFAULT_PAGE_SIZE`]
    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = normalize_page_size(page_size);
    }

    /// First page of a pass
    pub fn start_page(&self) -> u64 {
        self.start_page
    }

    /// Change the first page of a pass
    pub fn set_start_page(&mut self, start_page: u64) {
        self.start_page = start_page;
    }

    /// Last page of a pass (inclusive), if bounded
    pub fn stop_page(&self) -> Option<u64> {
        self.stop_page
    }

    /// Change the last page of a pass (inclusive); `None` means unbounded
    pub fn set_stop_page(&mut self, stop_page: Option<u64>) {
        self.stop_page = stop_page;
    }

    /// The page the next fetch would read
    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    /// Move the cursor back to the start page
    pub fn reset(&mut self) {
        self.current_page = self.start_page;
    }

    /// Fetch the next page, or `None` once the pass is over.
    ///
    /// The cursor advances as soon as a fetch is attempted, so an `Err`
    /// page is consumed like any other: calling again continues with the
    /// following page rather than retrying the failed one.
    pub async fn next_page(&mut self) -> Option<Result<RowSet>> {
        let page = self.current_page;
        if let Some(stop) = self.stop_page {
            if page > stop {
                return None;
            }
        }
        self.current_page += 1;

        let request = PageRequest::new(
            self.query.clone(),
            self.page_size,
            page * u64::from(self.page_size),
        );
        match self.fetcher.fetch_page(&request).await {
            Ok(rows) if rows.is_empty() => None,
            Ok(rows) => Some(Ok(rows)),
            Err(e) => Some(Err(e)),
        }
    }

    /// Stream all pages of one pass.
    ///
    /// Entering the stream resets the cursor to the start page, so every
    /// pass re-fetches from the beginning. Dropping the stream early
    /// leaves the remaining pages unfetched.
    pub fn pages(&mut self) -> impl Stream<Item = Result<RowSet>> + '_ {
        self.reset();
        stream::unfold(self, |iterator| async move {
            iterator
                .next_page()
                .await
                .map(|page| (page, iterator))
        })
    }
}

fn normalize_page_size(page_size: u32) -> u32 {
    if page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size
    }
}
