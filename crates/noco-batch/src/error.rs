//! Error types for noco-batch.
//!
//! Both errors are generic over the collaborator's own error type, which is
//! carried unchanged as the `source` of the failing page or chunk.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PagingError<E> {
    #[error("Page size must be greater than zero")]
    InvalidPageSize,

    #[error("Page request failed at offset {offset} (limit {limit})")]
    Page {
        offset: usize,
        limit: usize,
        #[source]
        source: E,
    },
}

impl<E> PagingError<E> {
    /// Returns the collaborator error, if the failure came from one.
    pub fn into_source(self) -> Option<E> {
        match self {
            PagingError::Page { source, .. } => Some(source),
            PagingError::InvalidPageSize => None,
        }
    }
}

impl<E> Diagnostic for PagingError<E>
where
    E: std::error::Error + 'static,
{
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self {
            PagingError::InvalidPageSize => "noco_batch::invalid_page_size",
            PagingError::Page { .. } => "noco_batch::page",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            PagingError::InvalidPageSize => {
                Some(Box::new("Configure a maximum page size of at least 1"))
            }
            PagingError::Page { .. } => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum BatchError<E> {
    #[error("Batch size must be greater than zero")]
    InvalidBatchSize,

    #[error("Chunk {index} failed after {completed} chunk(s) succeeded")]
    Chunk {
        index: usize,
        completed: usize,
        #[source]
        source: E,
    },

    #[error("Chunk {index} returned {actual} result(s) for {expected} item(s)")]
    ContractViolation {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

impl<E> BatchError<E> {
    /// Index of the chunk that failed, if any.
    pub fn chunk_index(&self) -> Option<usize> {
        match self {
            BatchError::Chunk { index, .. } | BatchError::ContractViolation { index, .. } => {
                Some(*index)
            }
            BatchError::InvalidBatchSize => None,
        }
    }

    pub fn into_source(self) -> Option<E> {
        match self {
            BatchError::Chunk { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl<E> Diagnostic for BatchError<E>
where
    E: std::error::Error + 'static,
{
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self {
            BatchError::InvalidBatchSize => "noco_batch::invalid_batch_size",
            BatchError::Chunk { .. } => "noco_batch::chunk",
            BatchError::ContractViolation { .. } => "noco_batch::contract_violation",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            BatchError::InvalidBatchSize => {
                Some(Box::new("Configure a maximum batch size of at least 1"))
            }
            BatchError::Chunk { completed, .. } => Some(Box::new(format!(
                "{completed} earlier chunk(s) were already committed and are not rolled back"
            ))),
            BatchError::ContractViolation { .. } => Some(Box::new(
                "The batch executor must return exactly one result per item",
            )),
        }
    }
}
