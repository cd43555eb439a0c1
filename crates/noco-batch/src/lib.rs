//! Pagination and batch splitting.
//!
//! Both engines turn one unbounded logical operation into a bounded,
//! strictly sequential series of collaborator calls and reassemble the
//! results in order:
//!
//! - [`paginate`] reads up to `limit` items, `max_page_size` at a time.
//! - [`batch`] writes a list in chunks of `max_batch_size`, one result per item.

pub mod batch;
pub mod error;
pub mod paginate;
pub mod traits;

pub use batch::{batch, batch_with, chunk_count, chunks, Chunk};
pub use error::{BatchError, PagingError};
pub use paginate::{paginate, paginate_source};
pub use traits::{BatchExecutor, BatchKind, Page, PageSource};
