//! Synchronous client for the NocoDB v2 records API.
//!
//! [`RecordsClient`] wraps a [`Transport`] and exposes single-record calls,
//! paginated reads and chunked bulk writes. [`Table`] binds a table id and
//! [`QueryBuilder`] composes filters and sorts fluently.

pub mod error;
pub mod http_client;
pub mod query;
pub mod records;
pub mod table;

#[cfg(test)]
pub mod test_utils;

pub use error::{ClientError, Result};
pub use http_client::{ApiRequest, ClientConfig, HttpTransport, Method, Transport};
pub use query::QueryBuilder;
pub use records::{Record, RecordId, RecordQuery, RecordsClient, DEFAULT_LIMIT};
pub use table::Table;
