/**
 * restriction.rs
 * OWL property restrictions as seen by the validator
 */

use std::collections::BTreeMap;

use oxigraph::model::NamedNode;
use tracing::debug;

use crate::vocab;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RestrictionRange {
    /// Literal datatype (`owl:onDataRange`)
    DataRange(NamedNode),
    /// Target class (`owl:onClass`)
    Class(NamedNode),
}

impl RestrictionRange {
    /// Classifies a `someValuesFrom` / `allValuesFrom` filler.
    pub fn from_filler(filler: NamedNode) -> Self {
        if vocab::is_literal_datatype(filler.as_str()) {
            RestrictionRange::DataRange(filler)
        } else {
            RestrictionRange::Class(filler)
        }
    }

    pub fn iri(&self) -> &NamedNode {
        match self {
            RestrictionRange::DataRange(node) | RestrictionRange::Class(node) => node,
        }
    }
}

/// Cardinality facts found on one `owl:Restriction` node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cardinalities {
    pub exact: Option<u32>,
    pub min: Option<u32>,
    pub max: Option<u32>,
    pub some_values: bool,
}

impl Cardinalities {
    /// `(required, is_list)` implied by these facts.
    pub fn derive(&self) -> (bool, bool) {
        if let Some(n) = self.exact {
            return (n >= 1, n > 1);
        }
        let required = self.min.is_some_and(|n| n >= 1) || self.some_values;
        let is_list = self.max.map_or(true, |n| n > 1);
        (required, is_list)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restriction {
    pub on_property: NamedNode,
    pub required: bool,
    pub is_list: bool,
    pub range: RestrictionRange,
}

impl Restriction {
    pub fn new(on_property: NamedNode, range: RestrictionRange, cardinalities: Cardinalities) -> Self {
        let (required, is_list) = cardinalities.derive();
        Self {
            on_property,
            required,
            is_list,
            range,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn list(mut self) -> Self {
        self.is_list = true;
        self
    }

    /// Required if either is, list only if both are. The range already held
    /// wins; restriction stores insert the nearest class first.
    pub fn merge(&mut self, other: &Restriction) {
        if self.range != other.range {
            debug!(
                property = self.on_property.as_str(),
                kept = self.range.iri().as_str(),
                ignored = other.range.iri().as_str(),
                "conflicting restriction ranges"
            );
        }
        self.required |= other.required;
        self.is_list &= other.is_list;
    }
}

/// Restrictions applicable to one class, keyed by property IRI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRestrictions {
    class: NamedNode,
    by_property: BTreeMap<String, Restriction>,
}

impl ClassRestrictions {
    pub fn new(class: NamedNode) -> Self {
        Self {
            class,
            by_property: BTreeMap::new(),
        }
    }

    pub fn class(&self) -> &NamedNode {
        &self.class
    }

    /// Adds a restriction, merging with one already held for the same property.
    pub fn insert(&mut self, restriction: Restriction) {
        match self.by_property.get_mut(restriction.on_property.as_str()) {
            Some(existing) => existing.merge(&restriction),
            None => {
                self.by_property
                    .insert(restriction.on_property.as_str().to_string(), restriction);
            }
        }
    }

    pub fn get(&self, property: &NamedNode) -> Option<&Restriction> {
        self.by_property.get(property.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Restriction> {
        self.by_property.values()
    }

    pub fn len(&self) -> usize {
        self.by_property.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_property.is_empty()
    }
}
