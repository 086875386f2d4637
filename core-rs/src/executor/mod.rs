//! Query execution boundary
//!
//! The mapping engine only talks to a triple store through [`QueryExecutor`].
//! [`OxigraphExecutor`] runs queries against an in-process oxigraph store.

pub mod store;

use std::collections::HashMap;
use std::sync::Arc;

use oxigraph::model::{Literal, NamedNode, Term};

use crate::errors::Result;
use crate::query::{SparqlQuery, SparqlUpdate};

pub use store::OxigraphExecutor;

/// One solution of a SELECT query: variable name to bound term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRow {
    bindings: HashMap<String, Term>,
}

impl QueryRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, variable: impl Into<String>, term: Term) {
        self.bindings.insert(variable.into(), term);
    }

    pub fn get(&self, variable: &str) -> Option<&Term> {
        self.bindings.get(variable)
    }

    pub fn named_node(&self, variable: &str) -> Option<&NamedNode> {
        match self.get(variable)? {
            Term::NamedNode(node) => Some(node),
            _ => None,
        }
    }

    pub fn literal(&self, variable: &str) -> Option<&Literal> {
        match self.get(variable)? {
            Term::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    /// Lexical value of an IRI or literal binding.
    pub fn value(&self, variable: &str) -> Option<&str> {
        match self.get(variable)? {
            Term::NamedNode(node) => Some(node.as_str()),
            Term::Literal(literal) => Some(literal.value()),
            _ => None,
        }
    }

    pub fn boolean(&self, variable: &str) -> Option<bool> {
        match self.literal(variable)?.value() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl FromIterator<(String, Term)> for QueryRow {
    fn from_iter<I: IntoIterator<Item = (String, Term)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

/// Runs SPARQL requests against a triple store.
///
/// Implementations may apply a deadline; exceeding it yields
/// `MappingError::Timeout`.
pub trait QueryExecutor: Send + Sync {
    fn select(&self, query: &SparqlQuery) -> Result<Vec<QueryRow>>;

    fn ask(&self, query: &SparqlQuery) -> Result<bool>;

    /// Applies every operation of `update` atomically.
    fn update(&self, update: &SparqlUpdate) -> Result<()>;
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for &E {
    fn select(&self, query: &SparqlQuery) -> Result<Vec<QueryRow>> {
        (**self).select(query)
    }

    fn ask(&self, query: &SparqlQuery) -> Result<bool> {
        (**self).ask(query)
    }

    fn update(&self, update: &SparqlUpdate) -> Result<()> {
        (**self).update(update)
    }
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for Arc<E> {
    fn select(&self, query: &SparqlQuery) -> Result<Vec<QueryRow>> {
        (**self).select(query)
    }

    fn ask(&self, query: &SparqlQuery) -> Result<bool> {
        (**self).ask(query)
    }

    fn update(&self, update: &SparqlUpdate) -> Result<()> {
        (**self).update(update)
    }
}
