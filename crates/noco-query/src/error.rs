//! Error types for noco-query.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while building filter or sort expressions.
///
/// Every variant is raised at the call that caused it; nothing is deferred
/// to `build()` except the unclosed-group check.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Unsupported operator: {0}")]
    #[diagnostic(
        code(noco_query::unsupported_operator),
        help("Supported operators: eq, neq, gt, gte, lt, lte, like, nlike, in, notin, btw, nbtw, null, notnull, isblank, isnotblank, checked, notchecked")
    )]
    UnsupportedOperator(String),

    #[error("No group to close")]
    #[diagnostic(
        code(noco_query::no_group_to_close),
        help("Call group_start() before group_end()")
    )]
    NoGroupToClose,

    #[error("Unclosed groups: {0} group(s) still open")]
    #[diagnostic(
        code(noco_query::unclosed_groups),
        help("Every group_start() needs a matching group_end() before build()")
    )]
    UnclosedGroups(usize),

    #[error("Condition on '{0}' must be joined with and/or/not")]
    #[diagnostic(
        code(noco_query::misplaced_where),
        help("where_() only starts a filter or a group; use and(), or() or not() afterwards")
    )]
    MisplacedWhere(String),

    #[error("Group must be joined with and/or/not")]
    #[diagnostic(
        code(noco_query::misplaced_group),
        help("group_start() only starts a filter or a group; use and_group(), or_group() or not_group() afterwards")
    )]
    MisplacedGroup,

    #[error("Operator '{operator}' on '{field}' expects {expected}")]
    #[diagnostic(code(noco_query::invalid_value))]
    InvalidValue {
        field: String,
        operator: &'static str,
        expected: &'static str,
    },

    #[error("Direction must be 'asc' or 'desc', got '{0}'")]
    #[diagnostic(code(noco_query::invalid_sort_direction))]
    InvalidSortDirection(String),
}

/// Result type alias for noco-query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
