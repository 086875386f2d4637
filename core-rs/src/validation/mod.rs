//! Ontology-driven validation of resources
//!
//! - datatype: literal validators per XSD datatype
//! - context: the violations and the report that accumulates them
//! - validator: per-batch restriction checks with batched existence queries

pub mod context;
pub mod datatype;
pub mod validator;

pub use context::{ValidationContext, ValidationErrorKind, ValidationReport};
pub use validator::OwlRestrictionValidator;
