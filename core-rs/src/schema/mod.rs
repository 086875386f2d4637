//! Class schemas: the mapping metadata derived once per model type
//!
//! A [`Schema`] lists, in declaration order, every mapped field of a type with
//! its predicate, range, cardinality and direction. Schemas are built from the
//! registration API in [`builder`] and checked by [`analyzer`].

pub mod analyzer;
pub mod builder;
pub mod shacl;

use oxigraph::model::{NamedNode, Term, Triple};

use crate::errors::{MappingError, Result};
use crate::query::pattern::{PatternTerm, TriplePattern};
use crate::vocab;

pub use analyzer::analyze;
pub use builder::{FieldDeclaration, SchemaBuilder};

/// Orientation of a mapped property relative to the owning instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyDirection {
    /// `owner predicate value`
    Forward,
    /// `value predicate owner`
    Reverse,
}

impl PropertyDirection {
    pub fn is_reverse(self) -> bool {
        self == PropertyDirection::Reverse
    }

    /// Emits the concrete triple linking `owner` and `value`.
    pub fn triple(self, owner: &NamedNode, predicate: &NamedNode, value: Term) -> Result<Triple> {
        match self {
            PropertyDirection::Forward => Ok(Triple::new(owner.clone(), predicate.clone(), value)),
            PropertyDirection::Reverse => match value {
                Term::NamedNode(node) => Ok(Triple::new(node, predicate.clone(), owner.clone())),
                other => Err(MappingError::InvalidFieldValue(format!(
                    "{} cannot be the subject of reverse property {}",
                    other, predicate
                ))),
            },
        }
    }

    /// Emits the graph pattern linking `owner` and `value`.
    pub fn pattern(self, owner: PatternTerm, predicate: &NamedNode, value: PatternTerm) -> TriplePattern {
        match self {
            PropertyDirection::Forward => TriplePattern::new(owner, predicate.clone(), value),
            PropertyDirection::Reverse => TriplePattern::new(value, predicate.clone(), owner),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyRange {
    Datatype(NamedNode),
    Class { rdf_type: NamedNode, type_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMapping {
    pub field: String,
    pub predicate: NamedNode,
    pub range: PropertyRange,
    pub list: bool,
    pub optional: bool,
    pub direction: PropertyDirection,
}

impl PropertyMapping {
    pub fn is_object(&self) -> bool {
        matches!(self.range, PropertyRange::Class { .. })
    }

    pub fn is_data(&self) -> bool {
        !self.is_object()
    }

    /// Query variable bound to this field.
    pub fn variable(&self) -> &str {
        &self.field
    }

    pub fn datatype(&self) -> Option<&NamedNode> {
        match &self.range {
            PropertyRange::Datatype(datatype) => Some(datatype),
            PropertyRange::Class { .. } => None,
        }
    }

    pub fn target_class(&self) -> Option<&NamedNode> {
        match &self.range {
            PropertyRange::Class { rdf_type, .. } => Some(rdf_type),
            PropertyRange::Datatype(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub(crate) type_name: String,
    pub(crate) rdf_type: NamedNode,
    pub(crate) uri_field: String,
    pub(crate) properties: Vec<PropertyMapping>,
    pub(crate) graph: Option<NamedNode>,
    pub(crate) allow_blank_nodes: bool,
    pub(crate) validated: bool,
}

impl Schema {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn rdf_type(&self) -> &NamedNode {
        &self.rdf_type
    }

    pub fn uri_field(&self) -> &str {
        &self.uri_field
    }

    pub fn graph(&self) -> Option<&NamedNode> {
        self.graph.as_ref()
    }

    pub fn allows_blank_nodes(&self) -> bool {
        self.allow_blank_nodes
    }

    /// Whether writes of this type are checked against OWL restrictions.
    pub fn is_validated(&self) -> bool {
        self.validated
    }

    /// All mapped properties in declaration order.
    pub fn properties(&self) -> &[PropertyMapping] {
        &self.properties
    }

    pub fn property(&self, field: &str) -> Option<&PropertyMapping> {
        self.properties.iter().find(|p| p.field == field)
    }

    pub fn data_properties(&self) -> impl Iterator<Item = &PropertyMapping> {
        self.properties.iter().filter(|p| p.is_data() && !p.list)
    }

    pub fn object_properties(&self) -> impl Iterator<Item = &PropertyMapping> {
        self.properties.iter().filter(|p| p.is_object() && !p.list)
    }

    pub fn data_list_properties(&self) -> impl Iterator<Item = &PropertyMapping> {
        self.properties.iter().filter(|p| p.is_data() && p.list)
    }

    pub fn object_list_properties(&self) -> impl Iterator<Item = &PropertyMapping> {
        self.properties.iter().filter(|p| p.is_object() && p.list)
    }

    pub fn scalar_properties(&self) -> impl Iterator<Item = &PropertyMapping> {
        self.properties.iter().filter(|p| !p.list)
    }

    pub fn has_list_properties(&self) -> bool {
        self.properties.iter().any(|p| p.list)
    }

    /// True when `predicate` in `direction` is bound to a field (rdf:type counts as mapped).
    pub fn is_mapped(&self, predicate: &NamedNode, direction: PropertyDirection) -> bool {
        (direction == PropertyDirection::Forward && predicate.as_str() == vocab::RDF_TYPE)
            || self
                .properties
                .iter()
                .any(|p| &p.predicate == predicate && p.direction == direction)
    }

    pub fn to_shacl(&self) -> String {
        shacl::render(self)
    }
}
