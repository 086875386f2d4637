/**
 * store.rs
 * Restriction stores: SPARQL-backed and in-memory
 */

use std::collections::HashMap;
use std::sync::Arc;

use oxigraph::model::NamedNode;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::executor::{QueryExecutor, QueryRow};
use crate::ontology::restriction::{Cardinalities, ClassRestrictions, Restriction, RestrictionRange};
use crate::ontology::RestrictionStore;
use crate::query::SparqlQuery;
use crate::vocab;

/// Reads `owl:Restriction` superclasses of a class from the store.
pub struct SparqlRestrictionStore<E> {
    executor: E,
}

impl<E: QueryExecutor> SparqlRestrictionStore<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Rows come nearest class first: `?depth` counts the classes between
    /// `class` and the ancestor holding the restriction, so a subclass
    /// restriction precedes the ones it overrides.
    pub fn restrictions_query(class: &NamedNode, include_ancestors: bool) -> SparqlQuery {
        let (hierarchy, order) = if include_ancestors {
            (
                format!(
                    r#"{{
        SELECT ?ancestor (COUNT(DISTINCT ?step) AS ?depth) WHERE {{
            {class} rdfs:subClassOf* ?step .
            ?step rdfs:subClassOf* ?ancestor .
        }}
        GROUP BY ?ancestor
    }}
    ?ancestor rdfs:subClassOf ?restriction ."#,
                    class = class
                ),
                "?depth STR(?ancestor) ",
            )
        } else {
            (format!("{} rdfs:subClassOf ?restriction .", class), "")
        };

        SparqlQuery::new(format!(
            r#"{prefixes}
SELECT ?restriction ?onProperty ?onClass ?onDataRange ?someValuesFrom ?allValuesFrom
       ?cardinality ?qualifiedCardinality ?minCardinality ?minQualifiedCardinality
       ?maxCardinality ?maxQualifiedCardinality
WHERE {{
    {hierarchy}
    ?restriction a owl:Restriction ;
                 owl:onProperty ?onProperty .
    OPTIONAL {{ ?restriction owl:onClass ?onClass }}
    OPTIONAL {{ ?restriction owl:onDataRange ?onDataRange }}
    OPTIONAL {{ ?restriction owl:someValuesFrom ?someValuesFrom }}
    OPTIONAL {{ ?restriction owl:allValuesFrom ?allValuesFrom }}
    OPTIONAL {{ ?restriction owl:cardinality ?cardinality }}
    OPTIONAL {{ ?restriction owl:qualifiedCardinality ?qualifiedCardinality }}
    OPTIONAL {{ ?restriction owl:minCardinality ?minCardinality }}
    OPTIONAL {{ ?restriction owl:minQualifiedCardinality ?minQualifiedCardinality }}
    OPTIONAL {{ ?restriction owl:maxCardinality ?maxCardinality }}
    OPTIONAL {{ ?restriction owl:maxQualifiedCardinality ?maxQualifiedCardinality }}
}}
ORDER BY {order}STR(?onProperty) STR(?onDataRange) STR(?onClass) STR(?someValuesFrom) STR(?allValuesFrom)"#,
            prefixes = vocab::PREFIXES,
            hierarchy = hierarchy,
            order = order
        ))
    }
}

fn cardinality(row: &QueryRow, plain: &str, qualified: &str) -> std::result::Result<Option<u32>, String> {
    match row.value(qualified).or_else(|| row.value(plain)) {
        Some(value) => value
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|e| format!("invalid cardinality {:?}: {}", value, e)),
        None => Ok(None),
    }
}

/// One restriction from one solution row; `Err` explains why the row is unusable.
fn restriction_from_row(row: &QueryRow) -> std::result::Result<Restriction, String> {
    let on_property = row
        .named_node("onProperty")
        .ok_or_else(|| "owl:onProperty is not an IRI".to_string())?
        .clone();

    let some_values_from = row.named_node("someValuesFrom");
    let range = if let Some(data_range) = row.named_node("onDataRange") {
        RestrictionRange::DataRange(data_range.clone())
    } else if let Some(class) = row.named_node("onClass") {
        RestrictionRange::Class(class.clone())
    } else if let Some(filler) = some_values_from.or_else(|| row.named_node("allValuesFrom")) {
        RestrictionRange::from_filler(filler.clone())
    } else {
        return Err(format!("no range for {}", on_property));
    };

    let cardinalities = Cardinalities {
        exact: cardinality(row, "cardinality", "qualifiedCardinality")?,
        min: cardinality(row, "minCardinality", "minQualifiedCardinality")?,
        max: cardinality(row, "maxCardinality", "maxQualifiedCardinality")?,
        some_values: some_values_from.is_some(),
    };

    Ok(Restriction::new(on_property, range, cardinalities))
}

impl<E: QueryExecutor> RestrictionStore for SparqlRestrictionStore<E> {
    fn class_restrictions(&self, class: &NamedNode, include_ancestors: bool) -> Result<Arc<ClassRestrictions>> {
        let rows = self
            .executor
            .select(&Self::restrictions_query(class, include_ancestors))?;

        let mut restrictions = ClassRestrictions::new(class.clone());
        for row in &rows {
            match restriction_from_row(row) {
                Ok(restriction) => restrictions.insert(restriction),
                Err(reason) => warn!(class = class.as_str(), reason = reason.as_str(), "skipping malformed restriction"),
            }
        }

        debug!(class = class.as_str(), restrictions = restrictions.len(), "loaded class restrictions");
        Ok(Arc::new(restrictions))
    }
}

/// Fixed restriction sets, for callers that already hold the ontology.
///
/// Ancestors are not tracked: `include_ancestors` is ignored.
#[derive(Debug, Default)]
pub struct InMemoryRestrictionStore {
    classes: HashMap<String, Arc<ClassRestrictions>>,
}

impl InMemoryRestrictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, restrictions: ClassRestrictions) {
        self.classes
            .insert(restrictions.class().as_str().to_string(), Arc::new(restrictions));
    }
}

impl RestrictionStore for InMemoryRestrictionStore {
    fn class_restrictions(&self, class: &NamedNode, _include_ancestors: bool) -> Result<Arc<ClassRestrictions>> {
        Ok(self
            .classes
            .get(class.as_str())
            .cloned()
            .unwrap_or_else(|| Arc::new(ClassRestrictions::new(class.clone()))))
    }
}
