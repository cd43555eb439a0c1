use miette::Diagnostic;
use noco_batch::{BatchError, PagingError};
use noco_config::ConfigError;
use noco_query::QueryError;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ClientError {
    #[error("Invalid URL: {url}")]
    #[diagnostic(code(noco_client::invalid_url))]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    #[diagnostic(
        code(noco_client::network),
        help("Check that the service is reachable or try again later")
    )]
    Network(#[from] Box<ureq::Error>),

    #[error("HTTP {status}: {url}")]
    #[diagnostic(code(noco_client::http_error))]
    Http { status: u16, url: String },

    #[error("{code}: {message}")]
    #[diagnostic(code(noco_client::api))]
    Api { code: String, message: String },

    #[error("Record not found: {message}")]
    #[diagnostic(code(noco_client::record_not_found))]
    RecordNotFound { message: String },

    #[error("Invalid response from server: {0}")]
    #[diagnostic(code(noco_client::invalid_response))]
    InvalidResponse(String),

    #[error("{0}")]
    #[diagnostic(code(noco_client::validation))]
    Validation(String),

    #[error("Invalid header: {0}")]
    #[diagnostic(
        code(noco_client::invalid_header),
        help("Header names and values must be valid HTTP tokens")
    )]
    InvalidHeader(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("Fetching records failed at offset {offset}")]
    #[diagnostic(code(noco_client::page_failed))]
    PageFailed {
        offset: usize,
        #[source]
        source: Box<ClientError>,
    },

    #[error("Bulk write failed at chunk {index}")]
    #[diagnostic(
        code(noco_client::chunk_failed),
        help(
            "{} earlier chunk(s) were already written and are not rolled back",
            .completed
        )
    )]
    ChunkFailed {
        index: usize,
        completed: usize,
        #[source]
        source: Box<ClientError>,
    },

    #[error("Chunk {index} returned {actual} id(s) for {expected} record(s)")]
    #[diagnostic(code(noco_client::batch_contract))]
    BatchContract {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Page size must be greater than zero")]
    #[diagnostic(code(noco_client::invalid_page_size))]
    InvalidPageSize,

    #[error("Batch size must be greater than zero")]
    #[diagnostic(code(noco_client::invalid_batch_size))]
    InvalidBatchSize,
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// The error that caused a page or chunk failure, or `self`.
    pub fn root(&self) -> &ClientError {
        match self {
            ClientError::PageFailed { source, .. } | ClientError::ChunkFailed { source, .. } => {
                source.root()
            }
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), ClientError::RecordNotFound { .. })
    }
}

impl From<ureq::Error> for ClientError {
    fn from(e: ureq::Error) -> Self {
        Self::Network(Box::new(e))
    }
}

impl From<PagingError<ClientError>> for ClientError {
    fn from(err: PagingError<ClientError>) -> Self {
        match err {
            PagingError::InvalidPageSize => ClientError::InvalidPageSize,
            PagingError::Page {
                offset,
                source,
                ..
            } => {
                ClientError::PageFailed {
                    offset,
                    source: Box::new(source),
                }
            }
        }
    }
}

impl From<BatchError<ClientError>> for ClientError {
    fn from(err: BatchError<ClientError>) -> Self {
        match err {
            BatchError::InvalidBatchSize => ClientError::InvalidBatchSize,
            BatchError::Chunk {
                index,
                completed,
                source,
            } => {
                ClientError::ChunkFailed {
                    index,
                    completed,
                    source: Box::new(source),
                }
            }
            BatchError::ContractViolation {
                index,
                expected,
                actual,
            } => {
                ClientError::BatchContract {
                    index,
                    expected,
                    actual,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_http() {
        let err = ClientError::Http {
            status: 502,
            url: "http://localhost:8080/api/v2/tables/t/records".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("HTTP 502"));
        assert!(msg.contains("/api/v2/tables/t/records"));
    }

    #[test]
    fn test_client_error_api() {
        let err = ClientError::Api {
            code: "INVALID_FILTER".to_string(),
            message: "bad where".to_string(),
        };
        assert_eq!(err.to_string(), "INVALID_FILTER: bad where");
    }

    #[test]
    fn test_paging_error_conversion() {
        let err: ClientError = PagingError::Page {
            offset: 100,
            limit: 100,
            source: ClientError::RecordNotFound {
                message: "gone".to_string(),
            },
        }
        .into();

        assert!(matches!(err, ClientError::PageFailed { offset: 100, .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_batch_error_conversion() {
        let err: ClientError = BatchError::<ClientError>::ContractViolation {
            index: 2,
            expected: 100,
            actual: 99,
        }
        .into();
        assert!(matches!(
            err,
            ClientError::BatchContract {
                index: 2,
                expected: 100,
                actual: 99
            }
        ));

        let err: ClientError = BatchError::Chunk {
            index: 1,
            completed: 1,
            source: ClientError::Validation("nope".to_string()),
        }
        .into();
        assert!(matches!(err.root(), ClientError::Validation(_)));

        let err: ClientError = BatchError::<ClientError>::InvalidBatchSize.into();
        assert!(matches!(err, ClientError::InvalidBatchSize));
    }

    #[test]
    fn test_query_error_is_transparent() {
        let err: ClientError = QueryError::NoGroupToClose.into();
        assert_eq!(err.to_string(), "No group to close");
    }
}
