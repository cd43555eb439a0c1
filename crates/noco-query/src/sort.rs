//! The sort builder.

use tracing::trace;

use crate::{
    error::Result,
    expr::{Direction, SortField},
};

/// Accumulates sort fields in precedence order.
///
/// ```
/// use noco_query::SortBuilder;
///
/// let mut sort = SortBuilder::new();
/// assert_eq!(sort.asc("Name").desc("Score").build(), "Name,-Score");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SortBuilder {
    fields: Vec<SortField>,
}

impl SortBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field with a textual direction (`asc`/`desc`, any case).
    pub fn add(&mut self, field: impl Into<String>, direction: &str) -> Result<&mut Self> {
        let direction = direction.parse()?;
        Ok(self.push(field, direction))
    }

    pub fn push(&mut self, field: impl Into<String>, direction: Direction) -> &mut Self {
        self.fields.push(SortField::new(field, direction));
        self
    }

    pub fn asc(&mut self, field: impl Into<String>) -> &mut Self {
        self.push(field, Direction::Asc)
    }

    pub fn desc(&mut self, field: impl Into<String>) -> &mut Self {
        self.push(field, Direction::Desc)
    }

    pub fn build(&self) -> String {
        let out = self
            .fields
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        trace!(sort = %out, "rendered sort");
        out
    }

    pub fn reset(&mut self) -> &mut Self {
        self.fields.clear();
        self
    }

    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Creates an empty [`SortBuilder`].
pub fn create_sort() -> SortBuilder {
    SortBuilder::new()
}
