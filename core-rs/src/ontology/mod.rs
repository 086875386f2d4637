/**
 * ontology module
 *
 * - restriction: OWL restrictions and the cardinality rules deriving required/list
 * - store: restriction lookup against a triple store, or from memory
 */

pub mod restriction;
pub mod store;

use std::sync::Arc;

use oxigraph::model::NamedNode;

use crate::errors::Result;

pub use restriction::{Cardinalities, ClassRestrictions, Restriction, RestrictionRange};
pub use store::{InMemoryRestrictionStore, SparqlRestrictionStore};

/// Source of the restrictions a class imposes on its instances.
pub trait RestrictionStore: Send + Sync {
    /// Restrictions declared on `class`, merged with those of its superclasses
    /// when `include_ancestors` is set.
    fn class_restrictions(&self, class: &NamedNode, include_ancestors: bool) -> Result<Arc<ClassRestrictions>>;
}

impl<S: RestrictionStore + ?Sized> RestrictionStore for Arc<S> {
    fn class_restrictions(&self, class: &NamedNode, include_ancestors: bool) -> Result<Arc<ClassRestrictions>> {
        (**self).class_restrictions(class, include_ancestors)
    }
}
