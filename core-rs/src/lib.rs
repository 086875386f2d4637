//! # sparql-orm - object to RDF mapping
//!
//! Maps Rust types onto RDF classes and keeps their instances in a SPARQL
//! triple store.
//!
//! ## Key Features
//!
//! - Schema per type, declared once through [`SparqlResource::describe`] and cached
//! - Deterministic SPARQL for select, count, ask, create, update and delete
//! - Filtered, ordered and paged searches with a matching count
//! - Reverse relations and subclass-aware type patterns
//! - Lazy relation lists resolved with a single query
//! - OWL restriction validation with batched existence checks
//!
//! ## Architecture
//!
//! ```text
//! SparqlResource ──describe──▶ Schema ──▶ ClassQueryBuilder ──▶ QueryExecutor ──▶ store
//!                                                                    ▲
//! ResourceModel ──▶ OwlRestrictionValidator ◀── RestrictionStore ────┘
//! ```

pub mod cache;
pub mod config;
pub mod errors;
pub mod executor;
pub mod model;
pub mod ontology;
pub mod proxy;
pub mod query;
pub mod schema;
pub mod service;
pub mod uri;
pub mod validation;
pub mod vocab;

#[cfg(test)]
mod testing;

pub use cache::{CachedRestrictionStore, SchemaCache};
pub use config::MappingConfig;
pub use errors::{MappingError, Result};
pub use executor::{OxigraphExecutor, QueryExecutor, QueryRow};
pub use model::{Assertion, FieldData, FieldValue, Relation, ResourceModel, SparqlResource};
pub use ontology::{
    Cardinalities, ClassRestrictions, InMemoryRestrictionStore, Restriction, RestrictionRange, RestrictionStore,
    SparqlRestrictionStore,
};
pub use proxy::{ProxyKey, SparqlProxyList};
pub use query::{
    ClassQueryBuilder, CountQuery, OrderBy, Page, SearchFilter, SearchOptions, SparqlQuery, SparqlUpdate, UpdatePlan,
};
pub use schema::{analyze, PropertyDirection, PropertyMapping, PropertyRange, Schema, SchemaBuilder};
pub use service::SparqlService;
pub use uri::UriGenerator;
pub use validation::{OwlRestrictionValidator, ValidationContext, ValidationErrorKind, ValidationReport};
