//! Filter and sort expression builders.
//!
//! [`FilterBuilder`] compiles conditions and groups into the service's
//! `where` grammar, e.g. `(Name,eq,John)~and((Age,gt,18)~or(Role,eq,Admin))`.
//! [`SortBuilder`] compiles ordered fields into the `sort` parameter,
//! e.g. `Name,-CreatedAt`.

pub mod error;
pub mod expr;
pub mod filter;
pub mod operator;
pub mod sort;
pub mod value;

pub use error::{QueryError, Result};
pub use expr::{Condition, Direction, Logic, SortField};
pub use filter::{create_filter, FilterBuilder, Token};
pub use operator::{Arity, Operator};
pub use sort::{create_sort, SortBuilder};
pub use value::FilterValue;
