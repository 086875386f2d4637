/**
 * rows.rs
 * Query solutions back into model instances
 */

use std::collections::HashMap;

use oxigraph::model::NamedNode;
use tracing::warn;

use crate::errors::{MappingError, Result};
use crate::executor::QueryRow;
use crate::model::{FieldData, FieldValue, Relation, SparqlResource};
use crate::query::builder::{ClassQueryBuilder, PROPERTY_VARIABLE, TYPE_VARIABLE, VALUE_VARIABLE};

impl<'a> ClassQueryBuilder<'a> {
    /// Reads the URI, type and scalar fields bound in `row`.
    pub fn instance_from_row<T: SparqlResource>(&self, row: &QueryRow) -> Result<T> {
        let schema = self.schema();
        let uri = row.named_node(schema.uri_field()).ok_or_else(|| {
            MappingError::Deserialization(format!("no IRI bound to ?{}", schema.uri_field()))
        })?;

        let mut instance = T::default();
        instance.set_uri(uri.clone());
        if let Some(rdf_type) = row.named_node(TYPE_VARIABLE) {
            instance.set_rdf_type(rdf_type.clone());
        }

        for property in schema.scalar_properties() {
            if let Some(term) = row.get(property.variable()) {
                let value = FieldValue::from_term(term, property.is_object())?;
                instance.set_field(&property.field, FieldData::One(value))?;
            }
        }
        Ok(instance)
    }

    /// Groups rows per URI in first-seen order, collecting list values
    /// without duplicates. Rows or instances that fail to map are skipped.
    pub fn instances_from_rows<T: SparqlResource>(&self, rows: &[QueryRow]) -> Vec<T> {
        let schema = self.schema();
        let mut order: Vec<NamedNode> = Vec::new();
        let mut groups: HashMap<NamedNode, (&QueryRow, HashMap<&str, Vec<FieldValue>>)> = HashMap::new();

        for row in rows {
            let Some(uri) = row.named_node(schema.uri_field()) else {
                warn!(type_name = schema.type_name(), "skipping row without IRI subject");
                continue;
            };
            let (_, lists) = groups.entry(uri.clone()).or_insert_with(|| {
                order.push(uri.clone());
                (row, HashMap::new())
            });

            for property in schema.properties().iter().filter(|p| p.list) {
                let Some(term) = row.get(property.variable()) else {
                    continue;
                };
                match FieldValue::from_term(term, property.is_object()) {
                    Ok(value) => {
                        let values = lists.entry(property.variable()).or_default();
                        if !values.contains(&value) {
                            values.push(value);
                        }
                    }
                    Err(e) => warn!(field = property.field.as_str(), error = %e, "skipping list value"),
                }
            }
        }

        let mut instances = Vec::with_capacity(order.len());
        for uri in order {
            let Some((first_row, lists)) = groups.remove(&uri) else {
                continue;
            };
            let mut instance: T = match self.instance_from_row(first_row) {
                Ok(instance) => instance,
                Err(e) => {
                    warn!(uri = uri.as_str(), error = %e, "skipping instance");
                    continue;
                }
            };
            let mut failed = false;
            for (field, values) in lists {
                if let Err(e) = instance.set_field(field, FieldData::Many(values)) {
                    warn!(uri = uri.as_str(), error = %e, "skipping instance");
                    failed = true;
                    break;
                }
            }
            if !failed {
                instances.push(instance);
            }
        }
        instances
    }

    /// Relations from the rows of [`build_relations_select`](Self::build_relations_select).
    pub fn relations_from_rows(&self, rows: &[QueryRow]) -> Vec<Relation> {
        rows.iter()
            .filter_map(|row| {
                let property = row.named_node(PROPERTY_VARIABLE)?.clone();
                let value = row.get(VALUE_VARIABLE)?;
                Relation::from_term(property, value)
            })
            .collect()
    }
}
