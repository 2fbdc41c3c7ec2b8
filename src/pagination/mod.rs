//! Paginated collection iteration
//!
//! Offset/limit paging over a PostgREST collection: a [`PageFetcher`]
//! runs one bounded read at a time and the [`CollectionIterator`] walks
//! the pages lazily until the server answers with an empty one.

mod iterator;
mod types;

pub use iterator::{CollectionIterator, DEFAULT_PAGE_SIZE};
pub use types::{PageFetcher, PageRequest};
