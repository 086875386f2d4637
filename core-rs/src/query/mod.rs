/**
 * query
 * SPARQL request types and the schema-driven query builder
 */

pub mod builder;
pub mod pattern;
mod rows;
pub mod search;

use std::fmt;

pub use builder::{ClassQueryBuilder, CountQuery, UpdatePlan};
pub use pattern::{GroupElement, PatternTerm, TriplePattern, WhereClause};
pub use search::{OrderBy, Page, SearchFilter, SearchOptions};

/// SELECT or ASK query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparqlQuery {
    query: String,
}

impl SparqlQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.query
    }
}

impl fmt::Display for SparqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query)
    }
}

/// SPARQL Update request, possibly several `;`-separated operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparqlUpdate {
    update: String,
}

impl SparqlUpdate {
    pub fn new(update: impl Into<String>) -> Self {
        Self {
            update: update.into(),
        }
    }

    /// Joins operations into one request, applied in order.
    pub fn from_operations(operations: Vec<String>) -> Self {
        Self::new(operations.join(" ;\n"))
    }

    pub fn as_str(&self) -> &str {
        &self.update
    }

    pub fn is_empty(&self) -> bool {
        self.update.trim().is_empty()
    }
}

impl fmt::Display for SparqlUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.update)
    }
}
