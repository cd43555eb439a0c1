//! Leaf expressions: a single condition or a single sort field.
//!
//! These types only know how to render themselves. Ordering, grouping and
//! validation of whole expressions live in the builders.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::QueryError, operator::Operator, value::FilterValue};

/// How a condition or group joins the expression before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Logic {
    #[default]
    None,
    And,
    Or,
    Not,
}

impl Logic {
    /// The prefix emitted in front of a condition or group.
    pub fn prefix(self) -> &'static str {
        match self {
            Logic::None => "",
            Logic::And => "~and",
            Logic::Or => "~or",
            Logic::Not => "~not",
        }
    }
}

/// A single `(field,op[,value...])` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    /// Absent for unary operators.
    pub value: Option<FilterValue>,
    pub logic: Logic,
}

impl Condition {
    pub fn new(
        logic: Logic,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<FilterValue>,
    ) -> Self {
        let value = value.into();
        let value = if operator.is_unary() || value.is_null() {
            None
        } else {
            Some(value)
        };

        Self {
            field: field.into(),
            operator,
            value,
            logic,
        }
    }

    /// Renders the predicate without its logic prefix.
    pub fn render(&self) -> String {
        let mut out = format!("({},{}", self.field, self.operator.token());
        if let Some(value) = &self.value {
            for item in value.items() {
                out.push(',');
                out.push_str(&item.to_string());
            }
        }
        out.push(')');
        out
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.logic.prefix(), self.render())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl FromStr for Direction {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(QueryError::InvalidSortDirection(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Asc => f.write_str("asc"),
            Direction::Desc => f.write_str("desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub direction: Direction,
}

impl SortField {
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Asc => f.write_str(&self.field),
            Direction::Desc => write!(f, "-{}", self.field),
        }
    }
}
