//! Filter operators and their rendered tokens.
//!
//! The operator name a caller passes is not always the token the service
//! expects on the wire: `isblank`/`isnotblank` go out as `blank`/`notblank`.
//! That mapping is owned by [`Operator::token`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// How many values an operator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// No value, e.g. `(field,null)`.
    Unary,
    /// Exactly one value, e.g. `(field,eq,value)`.
    Single,
    /// Any number of values, e.g. `(field,in,a,b,c)`.
    List,
    /// A lower and upper bound, e.g. `(field,btw,lo,hi)`.
    Pair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Nlike,
    In,
    NotIn,
    Btw,
    Nbtw,
    Null,
    NotNull,
    IsBlank,
    IsNotBlank,
    Checked,
    NotChecked,
}

/// Operator name, operator, wire token.
const OPERATOR_TABLE: &[(&str, Operator, &str)] = &[
    ("eq", Operator::Eq, "eq"),
    ("neq", Operator::Neq, "neq"),
    ("gt", Operator::Gt, "gt"),
    ("gte", Operator::Gte, "gte"),
    ("lt", Operator::Lt, "lt"),
    ("lte", Operator::Lte, "lte"),
    ("like", Operator::Like, "like"),
    ("nlike", Operator::Nlike, "nlike"),
    ("in", Operator::In, "in"),
    ("notin", Operator::NotIn, "notin"),
    ("btw", Operator::Btw, "btw"),
    ("nbtw", Operator::Nbtw, "nbtw"),
    ("null", Operator::Null, "null"),
    ("notnull", Operator::NotNull, "notnull"),
    ("isblank", Operator::IsBlank, "blank"),
    ("isnotblank", Operator::IsNotBlank, "notblank"),
    ("checked", Operator::Checked, "checked"),
    ("notchecked", Operator::NotChecked, "notchecked"),
];

impl Operator {
    /// All supported operators, in table order.
    pub fn all() -> impl Iterator<Item = Operator> {
        OPERATOR_TABLE.iter().map(|(_, op, _)| *op)
    }

    /// The operator's name as callers spell it.
    pub fn name(self) -> &'static str {
        self.entry().0
    }

    /// The token emitted into the filter string.
    pub fn token(self) -> &'static str {
        self.entry().2
    }

    pub fn arity(self) -> Arity {
        match self {
            Operator::Null
            | Operator::NotNull
            | Operator::IsBlank
            | Operator::IsNotBlank
            | Operator::Checked
            | Operator::NotChecked => Arity::Unary,
            Operator::In | Operator::NotIn => Arity::List,
            Operator::Btw | Operator::Nbtw => Arity::Pair,
            _ => Arity::Single,
        }
    }

    pub fn is_unary(self) -> bool {
        self.arity() == Arity::Unary
    }

    fn entry(self) -> &'static (&'static str, Operator, &'static str) {
        OPERATOR_TABLE
            .iter()
            .find(|(_, op, _)| *op == self)
            .unwrap_or_else(|| unreachable!("operator table covers every variant"))
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    /// Parses an operator name.
    ///
    /// Names are matched exactly. The wire tokens `blank` and `notblank` are
    /// accepted as aliases for `isblank` and `isnotblank`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((_, op, _)) = OPERATOR_TABLE.iter().find(|(name, ..)| *name == s) {
            return Ok(*op);
        }
        match s {
            "blank" => Ok(Operator::IsBlank),
            "notblank" => Ok(Operator::IsNotBlank),
            other => Err(QueryError::UnsupportedOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
