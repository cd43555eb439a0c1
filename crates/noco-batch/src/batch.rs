//! The batch splitter.
//!
//! Splits an ordered list into contiguous chunks of at most `max_batch_size`
//! items, runs one collaborator call per chunk in order, and concatenates the
//! per-chunk results. Dispatch stops at the first failing chunk; chunks that
//! already succeeded are not rolled back.

use tracing::debug;

use crate::{
    error::BatchError,
    traits::{BatchExecutor, BatchKind},
};

/// One contiguous slice of the caller's input.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a, T> {
    pub index: usize,
    pub items: &'a [T],
}

/// Number of chunks `len` items split into.
pub fn chunk_count(len: usize, max_batch_size: usize) -> usize {
    if max_batch_size == 0 {
        return 0;
    }
    len.div_ceil(max_batch_size)
}

/// Splits `items` into indexed chunks of at most `max_batch_size` items.
pub fn chunks<T>(items: &[T], max_batch_size: usize) -> impl Iterator<Item = Chunk<'_, T>> {
    items
        .chunks(max_batch_size.max(1))
        .enumerate()
        .map(|(index, items)| {
            Chunk {
                index,
                items,
            }
        })
}

/// Runs `execute_batch` over `items` chunk by chunk.
///
/// ```
/// use noco_batch::{batch, BatchKind};
///
/// let ids: Vec<u32> = (1..=5).collect();
/// let results = batch(
///     |_kind: BatchKind, chunk: &[u32]| Ok::<_, std::convert::Infallible>(chunk.iter().map(|id| id * 10).collect()),
///     BatchKind::Delete,
///     &ids,
///     2,
/// )
/// .unwrap();
/// assert_eq!(results, vec![10, 20, 30, 40, 50]);
/// ```
pub fn batch<T, R, E, F>(
    mut execute_batch: F,
    kind: BatchKind,
    items: &[T],
    max_batch_size: usize,
) -> Result<Vec<R>, BatchError<E>>
where
    F: FnMut(BatchKind, &[T]) -> Result<Vec<R>, E>,
{
    batch_with(&mut execute_batch, kind, items, max_batch_size)
}

/// Runs a [`BatchExecutor`] over `items` chunk by chunk.
pub fn batch_with<T, X>(
    executor: &mut X,
    kind: BatchKind,
    items: &[T],
    max_batch_size: usize,
) -> Result<Vec<X::Output>, BatchError<X::Error>>
where
    X: BatchExecutor<T> + ?Sized,
{
    if max_batch_size == 0 {
        return Err(BatchError::InvalidBatchSize);
    }
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let total = chunk_count(items.len(), max_batch_size);
    let mut results = Vec::with_capacity(items.len());

    for chunk in chunks(items, max_batch_size) {
        debug!(
            %kind,
            chunk = chunk.index,
            of = total,
            size = chunk.items.len(),
            "executing batch"
        );

        let chunk_results = executor
            .execute_batch(kind, chunk.items)
            .map_err(|source| {
                BatchError::Chunk {
                    index: chunk.index,
                    completed: chunk.index,
                    source,
                }
            })?;

        if chunk_results.len() != chunk.items.len() {
            return Err(BatchError::ContractViolation {
                index: chunk.index,
                expected: chunk.items.len(),
                actual: chunk_results.len(),
            });
        }

        results.extend(chunk_results);
    }

    Ok(results)
}
