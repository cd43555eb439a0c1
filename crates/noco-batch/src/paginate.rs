//! The pagination engine.
//!
//! Reads `limit` items through repeated page requests of at most
//! `max_page_size` items each. The loop stops as soon as the source reports
//! its last page or returns an empty page, so a server that under-returns
//! can never keep it spinning.

use tracing::{debug, warn};

use crate::{
    error::PagingError,
    traits::{Page, PageSource},
};

/// Position of one pagination run. Never outlives the run.
#[derive(Debug, Clone, Copy)]
struct PageCursor {
    offset: usize,
    remaining: usize,
}

impl PageCursor {
    fn new(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            remaining: limit,
        }
    }

    fn advance(&mut self, fetched: usize) {
        self.offset += fetched;
        self.remaining = self.remaining.saturating_sub(fetched);
    }
}

/// Collects up to `limit` items from a page-fetching closure.
///
/// ```
/// use noco_batch::{paginate, Page};
///
/// let rows: Vec<u32> = (0..10).collect();
/// let result = paginate(
///     |offset: usize, limit: usize| {
///         let end = (offset + limit).min(rows.len());
///         Ok::<_, std::convert::Infallible>(Page::new(rows[offset..end].to_vec(), end == rows.len()))
///     },
///     7,
///     3,
/// )
/// .unwrap();
/// assert_eq!(result, vec![0, 1, 2, 3, 4, 5, 6]);
/// ```
pub fn paginate<T, E, F>(
    mut fetch_page: F,
    limit: usize,
    max_page_size: usize,
) -> Result<Vec<T>, PagingError<E>>
where
    F: FnMut(usize, usize) -> Result<Page<T>, E>,
{
    paginate_source(&mut fetch_page, 0, limit, max_page_size)
}

/// Collects up to `limit` items from a [`PageSource`], starting at `start_offset`.
pub fn paginate_source<T, S>(
    source: &mut S,
    start_offset: usize,
    limit: usize,
    max_page_size: usize,
) -> Result<Vec<T>, PagingError<S::Error>>
where
    S: PageSource<T> + ?Sized,
{
    if max_page_size == 0 {
        return Err(PagingError::InvalidPageSize);
    }

    let mut cursor = PageCursor::new(start_offset, limit);
    let mut items = Vec::with_capacity(limit.min(max_page_size));
    let mut requests = 0usize;

    while cursor.remaining > 0 {
        let batch_size = cursor.remaining.min(max_page_size);
        debug!(offset = cursor.offset, limit = batch_size, "fetching page");

        let page = source
            .fetch_page(cursor.offset, batch_size)
            .map_err(|source| {
                PagingError::Page {
                    offset: cursor.offset,
                    limit: batch_size,
                    source,
                }
            })?;
        requests += 1;

        let fetched = page.items.len();
        if fetched > batch_size {
            warn!(
                requested = batch_size,
                received = fetched,
                "page source returned more items than requested"
            );
        }

        items.extend(page.items);
        cursor.advance(fetched);

        if page.is_last_page || fetched == 0 {
            break;
        }
    }

    items.truncate(limit);
    debug!(requests, items = items.len(), "pagination finished");

    Ok(items)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use thiserror::Error;

    use super::*;

    #[derive(Debug, Error, PartialEq)]
    #[error("server unavailable")]
    struct Unavailable;

    /// A server holding `total` rows, answering every request honestly.
    struct FakeServer {
        total: usize,
        calls: RefCell<Vec<(usize, usize)>>,
    }

    impl FakeServer {
        fn new(total: usize) -> Self {
            Self {
                total,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn fetch(&self, offset: usize, limit: usize) -> Result<Page<usize>, Unavailable> {
            self.calls.borrow_mut().push((offset, limit));
            let end = (offset + limit).min(self.total);
            let items = (offset.min(end)..end).collect();
            Ok(Page::new(items, end >= self.total))
        }

        fn calls(&self) -> Vec<(usize, usize)> {
            self.calls.borrow().clone()
        }
    }

    #[test]
    fn test_returns_exactly_limit_for_any_page_size() {
        for max_page_size in [1, 7, 1000] {
            let server = FakeServer::new(50);
            let result = paginate(|o, l| server.fetch(o, l), 50, max_page_size).unwrap();
            assert_eq!(result, (0..50).collect::<Vec<_>>(), "page size {max_page_size}");

            for (_, limit) in server.calls() {
                assert!(limit > 0 && limit <= max_page_size);
            }
        }
    }

    #[test]
    fn test_minimum_number_of_requests() {
        let server = FakeServer::new(1000);
        let result = paginate(|o, l| server.fetch(o, l), 250, 100).unwrap();
        assert_eq!(result.len(), 250);
        assert_eq!(server.calls(), vec![(0, 100), (100, 100), (200, 50)]);
    }

    #[test]
    fn test_stops_on_last_page() {
        let server = FakeServer::new(30);
        let result = paginate(|o, l| server.fetch(o, l), 100, 25).unwrap();
        assert_eq!(result.len(), 30);
        assert_eq!(server.calls(), vec![(0, 25), (25, 25)]);
    }

    #[test]
    fn test_stops_on_empty_page() {
        let mut calls = 0;
        let result = paginate(
            |_, _| {
                calls += 1;
                Ok::<_, Unavailable>(Page::<u8>::more(vec![]))
            },
            10,
            5,
        )
        .unwrap();
        assert!(result.is_empty());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_under_returning_server_is_followed_by_offset() {
        // the server caps pages at 3 rows regardless of the requested limit
        let mut seen = Vec::new();
        let result = paginate(
            |offset, limit| {
                seen.push((offset, limit));
                let items: Vec<usize> = (offset..offset + 3).collect();
                Ok::<_, Unavailable>(Page::new(items, offset >= 6))
            },
            8,
            5,
        )
        .unwrap();
        assert_eq!(result, (0..8).collect::<Vec<_>>());
        assert_eq!(seen, vec![(0, 5), (3, 5), (6, 2)]);
    }

    #[test]
    fn test_over_fetching_page_is_truncated() {
        let result = paginate(
            |offset, _| Ok::<_, Unavailable>(Page::more((offset..offset + 10).collect())),
            4,
            100,
        )
        .unwrap();
        assert_eq!(result, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_zero_limit_issues_no_request() {
        let server = FakeServer::new(10);
        let result = paginate(|o, l| server.fetch(o, l), 0, 100).unwrap();
        assert!(result.is_empty());
        assert!(server.calls().is_empty());
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let server = FakeServer::new(10);
        let err = paginate(|o, l| server.fetch(o, l), 10, 0).unwrap_err();
        assert!(matches!(err, PagingError::InvalidPageSize));
        assert!(server.calls().is_empty());
    }

    #[test]
    fn test_collaborator_error_carries_page_context() {
        let err = paginate(
            |offset, _| {
                if offset >= 20 {
                    Err(Unavailable)
                } else {
                    Ok(Page::more((offset..offset + 10).collect::<Vec<usize>>()))
                }
            },
            50,
            10,
        )
        .unwrap_err();

        match err {
            PagingError::Page {
                offset,
                limit,
                source,
            } => {
                assert_eq!(offset, 20);
                assert_eq!(limit, 10);
                assert_eq!(source, Unavailable);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_start_offset() {
        let server = FakeServer::new(100);
        let mut source = |o: usize, l: usize| server.fetch(o, l);
        let result = paginate_source(&mut source, 40, 15, 10).unwrap();
        assert_eq!(result, (40..55).collect::<Vec<_>>());
        assert_eq!(server.calls(), vec![(40, 10), (50, 5)]);
    }
}
