/**
 * validator.rs
 * OWL restriction validation over a batch of resources
 *
 * Values are compared with the restrictions of their class while the batch is
 * collected; references to other resources are checked afterwards with one
 * existence query per target class.
 */

use std::collections::BTreeMap;

use oxigraph::model::NamedNode;
use tracing::{debug, info};

use crate::errors::Result;
use crate::executor::QueryExecutor;
use crate::model::{Relation, ResourceModel};
use crate::ontology::{ClassRestrictions, RestrictionRange};
use crate::query::SparqlQuery;
use crate::validation::context::{ValidationContext, ValidationErrorKind, ValidationReport};
use crate::validation::datatype;
use crate::vocab;

/// References waiting for the existence check of one class.
struct PendingClass {
    class: NamedNode,
    /// Referenced URI to the violations it causes if it does not exist
    values: BTreeMap<String, Vec<ValidationContext>>,
}

pub struct OwlRestrictionValidator<'a> {
    executor: &'a dyn QueryExecutor,
    label_predicate: NamedNode,
    report: ValidationReport,
    pending: BTreeMap<String, PendingClass>,
    nb_instances: usize,
}

impl<'a> OwlRestrictionValidator<'a> {
    pub fn new(executor: &'a dyn QueryExecutor) -> Self {
        Self {
            executor,
            label_predicate: NamedNode::new_unchecked(vocab::RDFS_LABEL),
            report: ValidationReport::default(),
            pending: BTreeMap::new(),
            nb_instances: 0,
        }
    }

    pub fn with_error_limit(mut self, limit: Option<usize>) -> Self {
        self.report.nb_error_limit = limit;
        self
    }

    pub fn with_label_predicate(mut self, predicate: NamedNode) -> Self {
        self.label_predicate = predicate;
        self
    }

    pub fn nb_error(&self) -> usize {
        self.report.nb_error()
    }

    fn record(&mut self, context: ValidationContext) {
        if self.report.limit_reached() {
            self.report.truncated = true;
            return;
        }
        self.report.errors.push(context);
    }

    /// Checks one resource against the restrictions of its class.
    ///
    /// Valid values become `relations` on the model; a value of the label
    /// predicate also sets its `name`. `xsd:anyURI` values become resource
    /// relations, the same term a mapped IRI field is written as.
    pub fn validate_model(&mut self, restrictions: &ClassRestrictions, model: &mut ResourceModel) {
        let instance = self.nb_instances;
        self.nb_instances += 1;
        if self.report.limit_reached() {
            self.report.truncated = true;
            return;
        }

        let uri = model.uri.as_ref().map(|u| u.as_str().to_string());
        let context = |kind, property: &NamedNode| {
            ValidationContext::new(kind, instance, property.as_str()).with_uri(uri.as_deref())
        };

        let mut relations = Vec::new();
        let mut name = None;

        let grouped = model.values_by_property();
        for (property, values) in &grouped {
            let property: &NamedNode = property;
            let Some(restriction) = restrictions.get(property) else {
                for value in values {
                    self.record(
                        context(ValidationErrorKind::UnknownProperty, property)
                            .with_value(*value)
                            .with_message(format!("property not allowed on {}", restrictions.class())),
                    );
                }
                continue;
            };

            if !restriction.is_list && values.len() > 1 {
                self.record(
                    context(ValidationErrorKind::InvalidValue, property)
                        .with_value(values[1])
                        .with_message("mono-valued property has multiple values"),
                );
            }

            for value in values {
                match &restriction.range {
                    RestrictionRange::DataRange(datatype) if datatype.as_str() == vocab::XSD_ANY_URI => {
                        match NamedNode::new(value.trim()) {
                            Ok(target) => relations.push(Relation::resource(property.clone(), &target)),
                            Err(e) => self.record(
                                context(ValidationErrorKind::InvalidUri, property)
                                    .with_value(*value)
                                    .with_message(e.to_string()),
                            ),
                        }
                    }
                    RestrictionRange::DataRange(datatype) => match datatype::is_valid_literal(datatype.as_str(), value) {
                        Some(true) => {
                            if property == &self.label_predicate && name.is_none() {
                                name = Some(value.to_string());
                            }
                            relations.push(Relation::literal(property.clone(), *value, datatype.clone()));
                        }
                        Some(false) => self.record(
                            context(ValidationErrorKind::InvalidDatatype, property)
                                .with_value(*value)
                                .with_message(format!("not a valid {}", datatype)),
                        ),
                        None => self.record(
                            context(ValidationErrorKind::InvalidDatatype, property)
                                .with_value(*value)
                                .with_message(format!("no validator for datatype {}", datatype)),
                        ),
                    },
                    RestrictionRange::Class(class) => match NamedNode::new(*value) {
                        Ok(target) => {
                            let unknown = context(ValidationErrorKind::InvalidValue, property)
                                .with_value(*value)
                                .with_message(format!("unknown {}", class));
                            self.defer(class, target.as_str(), unknown);
                            relations.push(Relation::resource(property.clone(), &target));
                        }
                        Err(e) => self.record(
                            context(ValidationErrorKind::InvalidUri, property)
                                .with_value(*value)
                                .with_message(e.to_string()),
                        ),
                    },
                }
            }
        }

        for restriction in restrictions.iter().filter(|r| r.required) {
            if !grouped.iter().any(|(p, _)| *p == &restriction.on_property) {
                self.record(
                    context(ValidationErrorKind::MissingRequiredValue, &restriction.on_property)
                        .with_message("required value is missing"),
                );
            }
        }

        model.relations = relations;
        if name.is_some() {
            model.name = name;
        }
    }

    fn defer(&mut self, class: &NamedNode, value: &str, context: ValidationContext) {
        self.pending
            .entry(class.as_str().to_string())
            .or_insert_with(|| PendingClass {
                class: class.clone(),
                values: BTreeMap::new(),
            })
            .values
            .entry(value.to_string())
            .or_default()
            .push(context);
    }

    /// Runs the deferred existence checks and returns the final report.
    ///
    /// Issues at most one query per referenced class. An executor failure
    /// aborts the whole batch.
    pub fn finish(mut self) -> Result<ValidationReport> {
        let pending = std::mem::take(&mut self.pending);
        let mut queries = 0;

        for (_, pending_class) in pending {
            if self.report.limit_reached() {
                self.report.truncated = true;
                break;
            }

            let query = existence_query(&pending_class.class, pending_class.values.keys());
            let rows = self.executor.select(&query)?;
            queries += 1;

            let mut existing = BTreeMap::new();
            for row in &rows {
                if let Some(uri) = row.named_node("uri") {
                    existing.insert(uri.as_str().to_string(), row.boolean("existing").unwrap_or(false));
                }
            }

            for (value, contexts) in pending_class.values {
                if existing.get(&value).copied().unwrap_or(false) {
                    continue;
                }
                debug!(class = pending_class.class.as_str(), value = value.as_str(), "unknown reference");
                for context in contexts {
                    self.record(context);
                }
            }
        }

        info!(
            instances = self.nb_instances,
            existence_queries = queries,
            errors = self.report.nb_error(),
            "validated batch"
        );
        Ok(self.report)
    }
}

/// Tells, for every value, whether it is an instance of `class` or a subclass.
fn existence_query<'v>(class: &NamedNode, values: impl Iterator<Item = &'v String>) -> SparqlQuery {
    let values: Vec<String> = values.map(|v| format!("<{}>", v)).collect();
    SparqlQuery::new(format!(
        "{}SELECT ?uri ?existing WHERE {{\n  VALUES ?uri {{ {} }}\n  BIND(EXISTS {{ {{ ?uri a ?type }} UNION {{ GRAPH ?g {{ ?uri a ?type }} }} ?type rdfs:subClassOf* {} }} AS ?existing)\n}}",
        vocab::PREFIXES,
        values.join(" "),
        class
    ))
}
