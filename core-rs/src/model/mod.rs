//! In-memory model side of the mapping: field values, relations and the
//! [`SparqlResource`] trait implemented by mapped types

pub mod resource;
pub mod value;

pub use resource::{Assertion, ResourceModel, SparqlResource};
pub use value::{FieldData, FieldValue, Relation};
