/**
 * analyzer.rs
 * Turns field declarations into a checked, immutable Schema
 */

use std::collections::HashSet;

use once_cell::sync::Lazy;
use oxigraph::model::NamedNode;
use regex::Regex;
use tracing::debug;

use crate::errors::{MappingError, Result};
use crate::model::SparqlResource;
use crate::schema::builder::{short_type_name, SchemaBuilder};
use crate::schema::{PropertyDirection, PropertyMapping, PropertyRange, Schema};
use crate::vocab;

static FIELD_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("field name pattern is valid"));

/// Variables the query builder binds itself.
const RESERVED_VARIABLES: &[&str] = &["rdfType", "count", "existing", "property", "value"];

/// Derives the schema of `T` from its declarations.
///
/// Deterministic: two calls return equal schemas.
pub fn analyze<T: SparqlResource>() -> Result<Schema> {
    let mut builder = SchemaBuilder::new(short_type_name::<T>(), T::RDF_TYPE);
    T::describe(&mut builder);
    builder.build()
}

impl SchemaBuilder {
    pub fn build(self) -> Result<Schema> {
        let type_name = self.type_name.as_str();

        let uri_field = match self.uri_fields.as_slice() {
            [] => return Err(MappingError::schema(type_name, "URI field is missing")),
            [single] => single.clone(),
            [first, second, ..] => {
                return Err(MappingError::schema(
                    type_name,
                    format!("URI field declared twice: {} and {}", first, second),
                ))
            }
        };
        check_variable(type_name, &uri_field)?;

        let rdf_type = NamedNode::new(self.rdf_type.as_str())
            .map_err(|e| MappingError::schema(type_name, format!("invalid RDF type {}: {}", self.rdf_type, e)))?;

        let graph = match &self.graph {
            Some(iri) => Some(
                NamedNode::new(iri.as_str())
                    .map_err(|e| MappingError::schema(type_name, format!("invalid graph {}: {}", iri, e)))?,
            ),
            None => None,
        };

        let mut field_names: HashSet<&str> = HashSet::new();
        field_names.insert(uri_field.as_str());
        let mut predicates: HashSet<(String, PropertyDirection)> = HashSet::new();
        let mut properties = Vec::with_capacity(self.fields.len());

        for declaration in &self.fields {
            let field = declaration.field.as_str();
            check_variable(type_name, field)?;
            if !field_names.insert(field) {
                return Err(MappingError::schema(type_name, format!("field {} declared twice", field)));
            }

            let predicate = NamedNode::new(declaration.predicate.as_str()).map_err(|e| {
                MappingError::schema(type_name, format!("invalid predicate for {}: {}", field, e))
            })?;

            let range = match (&declaration.datatype, &declaration.target) {
                (Some(_), Some(_)) => {
                    return Err(MappingError::schema(
                        type_name,
                        format!("field {} is both a data and an object property", field),
                    ))
                }
                (None, None) => {
                    return Err(MappingError::schema(
                        type_name,
                        format!("field {} declares neither a datatype nor a target class", field),
                    ))
                }
                (Some(datatype), None) => PropertyRange::Datatype(NamedNode::new(datatype.as_str()).map_err(|e| {
                    MappingError::schema(type_name, format!("invalid datatype for {}: {}", field, e))
                })?),
                (None, Some((target, target_name))) => PropertyRange::Class {
                    rdf_type: NamedNode::new(target.as_str()).map_err(|e| {
                        MappingError::schema(type_name, format!("invalid target class for {}: {}", field, e))
                    })?,
                    type_name: target_name.clone(),
                },
            };

            let direction = if declaration.reverse {
                PropertyDirection::Reverse
            } else {
                PropertyDirection::Forward
            };

            if direction.is_reverse() {
                if let PropertyRange::Datatype(datatype) = &range {
                    if datatype.as_str() != vocab::XSD_ANY_URI {
                        return Err(MappingError::schema(
                            type_name,
                            format!("reverse field {} must be an object or xsd:anyURI property", field),
                        ));
                    }
                }
            }

            if !predicates.insert((predicate.as_str().to_string(), direction)) {
                return Err(MappingError::schema(
                    type_name,
                    format!("predicate {} is mapped twice in the same direction", predicate),
                ));
            }

            properties.push(PropertyMapping {
                field: field.to_string(),
                predicate,
                range,
                list: declaration.list,
                optional: declaration.optional,
                direction,
            });
        }

        debug!(
            type_name,
            rdf_type = rdf_type.as_str(),
            properties = properties.len(),
            "analyzed schema"
        );

        Ok(Schema {
            type_name: self.type_name.clone(),
            rdf_type,
            uri_field,
            properties,
            graph,
            allow_blank_nodes: self.allow_blank_nodes,
            validated: self.validated,
        })
    }
}

fn check_variable(type_name: &str, field: &str) -> Result<()> {
    if !FIELD_NAME.is_match(field) {
        return Err(MappingError::schema(
            type_name,
            format!("field name {:?} is not a valid query variable", field),
        ));
    }
    if RESERVED_VARIABLES.contains(&field) {
        return Err(MappingError::schema(type_name, format!("field name {} is reserved", field)));
    }
    Ok(())
}
