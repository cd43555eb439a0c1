//! The filter builder.
//!
//! A filter is kept as a flat token list (conditions interleaved with group
//! markers) plus a count of currently open groups. Rendering walks the list
//! once; no tree is ever built.
//!
//! # Example
//!
//! ```
//! use noco_query::FilterBuilder;
//!
//! # fn main() -> noco_query::Result<()> {
//! let mut filter = FilterBuilder::new();
//! let rendered = filter
//!     .group_start()?
//!     .where_("Name", "eq", "John")?
//!     .or("Name", "eq", "Jane")?
//!     .group_end()?
//!     .and("Status", "eq", "Active")?
//!     .build()?;
//!
//! assert_eq!(rendered, "((Name,eq,John)~or(Name,eq,Jane))~and(Status,eq,Active)");
//! # Ok(())
//! # }
//! ```

use tracing::trace;

use crate::{
    error::{QueryError, Result},
    expr::{Condition, Logic},
    operator::{Arity, Operator},
    value::FilterValue,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Condition(Condition),
    /// Opens a group, joined to what precedes it by the given logic.
    GroupOpen(Logic),
    GroupClose,
}

#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    tokens: Vec<Token>,
    open_groups: usize,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the filter, or the current group, with a condition.
    ///
    /// Fails with [`QueryError::MisplacedWhere`] if the current scope already
    /// holds a token; later conditions must be joined with [`and`](Self::and),
    /// [`or`](Self::or) or [`not`](Self::not).
    pub fn where_(
        &mut self,
        field: impl Into<String>,
        operator: &str,
        value: impl Into<FilterValue>,
    ) -> Result<&mut Self> {
        let operator = operator.parse()?;
        self.condition(Logic::None, field, operator, value)
    }

    pub fn and(
        &mut self,
        field: impl Into<String>,
        operator: &str,
        value: impl Into<FilterValue>,
    ) -> Result<&mut Self> {
        let operator = operator.parse()?;
        self.condition(Logic::And, field, operator, value)
    }

    pub fn or(
        &mut self,
        field: impl Into<String>,
        operator: &str,
        value: impl Into<FilterValue>,
    ) -> Result<&mut Self> {
        let operator = operator.parse()?;
        self.condition(Logic::Or, field, operator, value)
    }

    pub fn not(
        &mut self,
        field: impl Into<String>,
        operator: &str,
        value: impl Into<FilterValue>,
    ) -> Result<&mut Self> {
        let operator = operator.parse()?;
        self.condition(Logic::Not, field, operator, value)
    }

    /// Appends a condition with an already parsed operator.
    ///
    /// Fails with [`QueryError::InvalidValue`] if the value does not fit the
    /// operator's [`Arity`]: `btw`/`nbtw` take exactly two values, other
    /// valued operators at least one.
    pub fn condition(
        &mut self,
        logic: Logic,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<FilterValue>,
    ) -> Result<&mut Self> {
        let field = field.into();
        if logic == Logic::None && !self.at_scope_start() {
            return Err(QueryError::MisplacedWhere(field));
        }

        let value = value.into();
        let count = value.items().len();
        let expected = match operator.arity() {
            Arity::Unary => None,
            Arity::Single | Arity::List if count == 0 => Some("at least one value"),
            Arity::Pair if count != 2 => Some("exactly two values"),
            _ => None,
        };
        if let Some(expected) = expected {
            return Err(QueryError::InvalidValue {
                field,
                operator: operator.name(),
                expected,
            });
        }

        self.tokens
            .push(Token::Condition(Condition::new(logic, field, operator, value)));
        Ok(self)
    }

    /// Opens a group with no joining logic.
    ///
    /// Like [`where_`](Self::where_), this only starts a scope; fails with
    /// [`QueryError::MisplacedGroup`] once the scope holds a token.
    pub fn group_start(&mut self) -> Result<&mut Self> {
        if !self.at_scope_start() {
            return Err(QueryError::MisplacedGroup);
        }
        Ok(self.open_group(Logic::None))
    }

    /// Opens a group joined with `~and`.
    pub fn and_group(&mut self) -> &mut Self {
        self.open_group(Logic::And)
    }

    /// Opens a group joined with `~or`.
    pub fn or_group(&mut self) -> &mut Self {
        self.open_group(Logic::Or)
    }

    /// Opens a group joined with `~not`.
    pub fn not_group(&mut self) -> &mut Self {
        self.open_group(Logic::Not)
    }

    pub fn group_end(&mut self) -> Result<&mut Self> {
        if self.open_groups == 0 {
            return Err(QueryError::NoGroupToClose);
        }
        self.open_groups -= 1;
        self.tokens.push(Token::GroupClose);
        Ok(self)
    }

    /// Renders the filter string.
    ///
    /// Rendering does not consume the builder; calling `build` twice yields
    /// the same string.
    pub fn build(&self) -> Result<String> {
        if self.open_groups != 0 {
            return Err(QueryError::UnclosedGroups(self.open_groups));
        }

        let mut out = String::new();
        for token in &self.tokens {
            match token {
                Token::Condition(condition) => {
                    out.push_str(condition.logic.prefix());
                    out.push_str(&condition.render());
                }
                Token::GroupOpen(logic) => {
                    out.push_str(logic.prefix());
                    out.push('(');
                }
                Token::GroupClose => out.push(')'),
            }
        }

        trace!(filter = %out, "rendered filter");
        Ok(out)
    }

    pub fn reset(&mut self) -> &mut Self {
        self.tokens.clear();
        self.open_groups = 0;
        self
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of groups currently open.
    pub fn depth(&self) -> usize {
        self.open_groups
    }

    fn open_group(&mut self, logic: Logic) -> &mut Self {
        self.tokens.push(Token::GroupOpen(logic));
        self.open_groups += 1;
        self
    }

    fn at_scope_start(&self) -> bool {
        matches!(self.tokens.last(), None | Some(Token::GroupOpen(_)))
    }
}

/// Creates an empty [`FilterBuilder`].
pub fn create_filter() -> FilterBuilder {
    FilterBuilder::new()
}
