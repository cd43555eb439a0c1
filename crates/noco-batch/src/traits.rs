//! Collaborator seams.
//!
//! The engines never perform I/O themselves. They call a [`PageSource`] for
//! reads and a [`BatchExecutor`] for bulk writes; both are implemented for
//! plain closures of the matching shape.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One page returned by a [`PageSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub is_last_page: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, is_last_page: bool) -> Self {
        Self {
            items,
            is_last_page,
        }
    }

    /// A page after which the server has no more rows.
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, true)
    }

    /// A page with more rows behind it.
    pub fn more(items: Vec<T>) -> Self {
        Self::new(items, false)
    }
}

/// The kind of bulk write a chunk belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchKind::Insert => f.write_str("insert"),
            BatchKind::Update => f.write_str("update"),
            BatchKind::Delete => f.write_str("delete"),
        }
    }
}

pub trait PageSource<T> {
    type Error;

    /// Fetches up to `limit` items starting at `offset`.
    fn fetch_page(&mut self, offset: usize, limit: usize) -> Result<Page<T>, Self::Error>;
}

impl<T, E, F> PageSource<T> for F
where
    F: FnMut(usize, usize) -> Result<Page<T>, E>,
{
    type Error = E;

    fn fetch_page(&mut self, offset: usize, limit: usize) -> Result<Page<T>, E> {
        self(offset, limit)
    }
}

pub trait BatchExecutor<T> {
    type Output;
    type Error;

    /// Executes one chunk and returns one result per input item, in order.
    fn execute_batch(
        &mut self,
        kind: BatchKind,
        chunk: &[T],
    ) -> Result<Vec<Self::Output>, Self::Error>;
}

impl<T, R, E, F> BatchExecutor<T> for F
where
    F: FnMut(BatchKind, &[T]) -> Result<Vec<R>, E>,
{
    type Output = R;
    type Error = E;

    fn execute_batch(&mut self, kind: BatchKind, chunk: &[T]) -> Result<Vec<R>, E> {
        self(kind, chunk)
    }
}
