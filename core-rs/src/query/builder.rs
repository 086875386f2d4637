/**
 * builder.rs
 * Schema-driven SPARQL generation for one mapped class
 */

use oxigraph::model::{NamedNode, Term, Triple};
use tracing::debug;

use crate::errors::{MappingError, Result};
use crate::executor::QueryRow;
use crate::model::{ResourceModel, SparqlResource};
use crate::query::pattern::{data_block, GroupElement, PatternTerm, TriplePattern, WhereClause};
use crate::query::search::SearchOptions;
use crate::query::{SparqlQuery, SparqlUpdate};
use crate::schema::{PropertyDirection, PropertyMapping, Schema};
use crate::vocab;

pub const TYPE_VARIABLE: &str = "rdfType";
pub const COUNT_VARIABLE: &str = "count";
pub const VALUE_VARIABLE: &str = "value";
pub const PROPERTY_VARIABLE: &str = "property";

pub(crate) fn rdf_type_predicate() -> NamedNode {
    NamedNode::new_unchecked(vocab::RDF_TYPE)
}

/// Builds every query and update of one schema.
///
/// Properties are always emitted in declaration order, so the text generated
/// for a given type is stable.
#[derive(Debug, Clone, Copy)]
pub struct ClassQueryBuilder<'a> {
    schema: &'a Schema,
    allow_blank_nodes: bool,
}

impl<'a> ClassQueryBuilder<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            allow_blank_nodes: schema.allows_blank_nodes(),
        }
    }

    /// Blank-node subjects are kept when either the schema or the caller allows them.
    pub fn allow_blank_nodes(mut self, allow: bool) -> Self {
        self.allow_blank_nodes = self.schema.allows_blank_nodes() || allow;
        self
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    fn uri_var(&self) -> PatternTerm {
        PatternTerm::var(self.schema.uri_field())
    }

    /// `?uri a ?rdfType` with subclass closure on the schema type.
    fn base_clause(&self) -> WhereClause {
        let mut clause = WhereClause::new(self.schema.graph());
        clause.triple(TriplePattern::new(
            self.uri_var(),
            rdf_type_predicate(),
            PatternTerm::var(TYPE_VARIABLE),
        ));
        clause.push_unscoped(GroupElement::Raw(format!(
            "?{} <{}>* {} .",
            TYPE_VARIABLE,
            vocab::RDFS_SUB_CLASS_OF,
            self.schema.rdf_type()
        )));
        if !self.allow_blank_nodes {
            clause.filter(format!("!isBlank(?{})", self.schema.uri_field()));
        }
        clause
    }

    fn property_pattern(&self, property: &PropertyMapping) -> TriplePattern {
        property
            .direction
            .pattern(self.uri_var(), &property.predicate, PatternTerm::var(property.variable()))
    }

    fn add_properties<'p>(
        &self,
        clause: &mut WhereClause,
        properties: impl Iterator<Item = &'p PropertyMapping>,
        lang: Option<&str>,
    ) -> Vec<&'p str> {
        let mut variables = Vec::new();
        for property in properties {
            let pattern = self.property_pattern(property);
            match (property.optional, self.lang_filter(property, lang)) {
                (true, None) => {
                    clause.optional(pattern);
                }
                (true, Some(filter)) => {
                    clause.push(GroupElement::Raw(format!("OPTIONAL {{ {} FILTER({}) }}", pattern, filter)));
                }
                (false, filter) => {
                    clause.triple(pattern);
                    if let Some(filter) = filter {
                        clause.push(GroupElement::Filter(filter));
                    }
                }
            }
            variables.push(property.variable());
        }
        variables
    }

    fn select_text(&self, variables: &[&str], clause: &WhereClause, tail: &str) -> SparqlQuery {
        let mut projection = vec![format!("?{}", self.schema.uri_field()), format!("?{}", TYPE_VARIABLE)];
        projection.extend(variables.iter().map(|v| format!("?{}", v)));

        let text = format!(
            "SELECT DISTINCT {} WHERE {}{}",
            projection.join(" "),
            clause.render(),
            tail
        );
        debug!(type_name = self.schema.type_name(), query = %text, "built select");
        SparqlQuery::new(text)
    }

    /// URI, type and every mapped property; required properties are mandatory
    /// patterns, optional ones sit in OPTIONAL blocks.
    ///
    /// With filters or paging, a subquery selects the matching URIs first and
    /// the outer query loads every value of those instances.
    pub fn build_select(&self, options: &SearchOptions) -> Result<SparqlQuery> {
        let lang = options.lang.as_deref();
        let mut clause = self.base_clause();
        let variables = self.add_properties(&mut clause, self.schema.properties().iter(), lang);
        let order = self.order_text(options, options.is_paged())?;

        if options.needs_subquery() {
            let mut matching = self.base_clause();
            self.add_properties(&mut matching, self.schema.properties().iter(), lang);
            self.apply_filters(&mut matching, &options.filters)?;
            let tail = if options.is_paged() {
                format!("{}{}", order, Self::slice_text(options))
            } else {
                String::new()
            };
            clause.push_unscoped(GroupElement::Raw(format!(
                "{{ SELECT DISTINCT ?{} WHERE {}{} }}",
                self.schema.uri_field(),
                matching.render(),
                tail
            )));
        }
        Ok(self.select_text(&variables, &clause, &order))
    }

    /// Like [`build_select`](Self::build_select) without list properties: one row per instance.
    pub fn build_scalar_select(&self) -> SparqlQuery {
        let mut clause = self.base_clause();
        let variables = self.add_properties(&mut clause, self.schema.scalar_properties(), None);
        self.select_text(&variables, &clause, "")
    }

    pub fn build_select_by_uri(&self, uri: &NamedNode) -> SparqlQuery {
        let mut clause = self.base_clause();
        clause.values(self.schema.uri_field(), vec![Term::NamedNode(uri.clone())]);
        let variables = self.add_properties(&mut clause, self.schema.scalar_properties(), None);
        self.select_text(&variables, &clause, "")
    }

    /// Every listed instance with all its properties, in one query.
    pub fn build_select_by_uris(&self, uris: &[NamedNode]) -> SparqlQuery {
        let mut clause = self.base_clause();
        clause.values(
            self.schema.uri_field(),
            uris.iter().cloned().map(Term::NamedNode).collect(),
        );
        let variables = self.add_properties(&mut clause, self.schema.properties().iter(), None);
        self.select_text(&variables, &clause, "")
    }

    /// Instances of this schema linked to `owner` through `predicate`.
    pub fn build_linked_select(
        &self,
        owner: &NamedNode,
        predicate: &NamedNode,
        direction: PropertyDirection,
    ) -> SparqlQuery {
        let mut clause = self.base_clause();
        clause.triple(direction.pattern(PatternTerm::node(owner), predicate, self.uri_var()));
        let variables = self.add_properties(&mut clause, self.schema.scalar_properties(), None);
        self.select_text(&variables, &clause, &format!("\nORDER BY ?{}", self.schema.uri_field()))
    }

    /// Same pattern and filters as the full select, projecting the distinct
    /// URI count. Ordering and paging are ignored: the count covers all pages.
    pub fn build_count(&self, options: &SearchOptions) -> Result<CountQuery> {
        let mut clause = self.base_clause();
        self.add_properties(&mut clause, self.schema.properties().iter(), options.lang.as_deref());
        self.apply_filters(&mut clause, &options.filters)?;
        let uri = self.schema.uri_field();
        let grouped = self.schema.has_list_properties();
        let tail = if grouped {
            format!("\nGROUP BY ?{}", uri)
        } else {
            String::new()
        };

        let text = format!(
            "SELECT (COUNT(DISTINCT ?{}) AS ?{}) WHERE {}{}",
            uri,
            COUNT_VARIABLE,
            clause.render(),
            tail
        );
        debug!(type_name = self.schema.type_name(), query = %text, "built count");
        Ok(CountQuery {
            query: SparqlQuery::new(text),
            grouped,
        })
    }

    /// True when `uri` is an instance of the schema type (or a subclass).
    pub fn build_ask(&self, uri: &NamedNode) -> SparqlQuery {
        let mut clause = self.base_clause();
        clause.values(self.schema.uri_field(), vec![Term::NamedNode(uri.clone())]);
        SparqlQuery::new(format!("ASK WHERE {}", clause.render()))
    }

    fn instance_uri<'i, T: SparqlResource>(&self, instance: &'i T) -> Result<&'i NamedNode> {
        instance.uri().ok_or_else(|| {
            MappingError::InvalidUri(format!("{} instance has no URI", self.schema.type_name()))
        })
    }

    /// Property triples of `instance`, one per scalar value and one per list element.
    pub fn build_insert<T: SparqlResource>(&self, instance: &T) -> Result<Vec<Triple>> {
        let uri = self.instance_uri(instance)?;
        self.property_triples(uri, instance)
    }

    fn property_triples<T: SparqlResource>(&self, subject: &NamedNode, instance: &T) -> Result<Vec<Triple>> {
        let mut triples = Vec::new();
        for property in self.schema.properties() {
            let data = instance.field(&property.field);
            let values = data.values();

            if values.is_empty() {
                if property.optional {
                    continue;
                }
                return Err(MappingError::RequiredValueMissing {
                    field: property.field.clone(),
                    predicate: property.predicate.as_str().to_string(),
                });
            }
            if !property.list && values.len() > 1 {
                return Err(MappingError::InvalidFieldValue(format!(
                    "field {} is single-valued but holds {} values",
                    property.field,
                    values.len()
                )));
            }

            for value in values {
                let term = value.to_term().ok_or_else(|| MappingError::DanglingObjectReference {
                    field: property.field.clone(),
                })?;
                triples.push(property.direction.triple(subject, &property.predicate, term)?);
            }
        }
        Ok(triples)
    }

    fn create_triples<T: SparqlResource>(&self, instance: &T) -> Result<Vec<Triple>> {
        let uri = self.instance_uri(instance)?;
        let rdf_type = instance.rdf_type().unwrap_or(self.schema.rdf_type());

        let mut triples = vec![Triple::new(uri.clone(), rdf_type_predicate(), rdf_type.clone())];
        triples.extend(self.property_triples(uri, instance)?);
        for relation in instance.relations() {
            triples.push(Triple::new(uri.clone(), relation.property.clone(), relation.to_term()?));
        }
        Ok(triples)
    }

    /// `INSERT DATA` with the type triple, mapped properties and custom relations.
    pub fn build_create<T: SparqlResource>(&self, instance: &T) -> Result<SparqlUpdate> {
        self.build_create_all(std::slice::from_ref(instance))
    }

    pub fn build_create_all<T: SparqlResource>(&self, instances: &[T]) -> Result<SparqlUpdate> {
        let mut triples = Vec::new();
        for instance in instances {
            triples.extend(self.create_triples(instance)?);
        }
        Ok(insert_data(&triples, self.schema.graph()))
    }

    /// Deletes the prior value of every scalar field set on `old` and every
    /// value of list fields, then inserts the properties of `new`.
    pub fn build_update<T: SparqlResource>(&self, old: &T, new: &T) -> Result<UpdatePlan> {
        let uri = self.instance_uri(old)?;
        if let Some(new_uri) = new.uri() {
            if new_uri != uri {
                return Err(MappingError::InvalidFieldValue(format!(
                    "update cannot change the URI from {} to {}",
                    uri, new_uri
                )));
            }
        }

        let mut deletes = Vec::new();
        let mut inserts = Vec::new();
        let mut next_variable = 1;

        for property in self.schema.properties() {
            if property.list || !old.field(&property.field).is_empty() {
                deletes.push(property.direction.pattern(
                    PatternTerm::node(uri),
                    &property.predicate,
                    PatternTerm::var(format!("x{}", next_variable)),
                ));
                next_variable += 1;
            }
        }

        if let (Some(old_type), Some(new_type)) = (old.rdf_type(), new.rdf_type()) {
            if old_type != new_type {
                deletes.push(TriplePattern::new(
                    PatternTerm::node(uri),
                    rdf_type_predicate(),
                    PatternTerm::node(old_type),
                ));
                inserts.push(Triple::new(uri.clone(), rdf_type_predicate(), new_type.clone()));
            }
        }

        for relation in old.relations() {
            deletes.push(TriplePattern::new(
                PatternTerm::node(uri),
                relation.property.clone(),
                PatternTerm::Term(relation.to_term()?),
            ));
        }

        inserts.extend(self.property_triples(uri, new)?);
        for relation in new.relations() {
            inserts.push(Triple::new(uri.clone(), relation.property.clone(), relation.to_term()?));
        }

        Ok(UpdatePlan {
            deletes,
            inserts,
            graph: self.schema.graph().cloned(),
        })
    }

    /// Removes every outgoing triple of `uri` and the incoming triples of reverse fields.
    pub fn build_delete(&self, uri: &NamedNode) -> SparqlUpdate {
        let graph = self.schema.graph();
        let mut operations = Vec::new();

        let mut clause = WhereClause::new(graph);
        clause.push(GroupElement::Raw(format!("{} ?p ?o .", uri)));
        operations.push(format!("DELETE WHERE {}", clause.render()));

        for property in self.schema.properties().iter().filter(|p| p.direction.is_reverse()) {
            let mut clause = WhereClause::new(graph);
            clause.triple(TriplePattern::new(
                PatternTerm::var("s"),
                property.predicate.clone(),
                PatternTerm::node(uri),
            ));
            operations.push(format!("DELETE WHERE {}", clause.render()));
        }

        SparqlUpdate::from_operations(operations)
    }

    /// Outgoing triples of `uri` whose predicate no field maps.
    pub fn build_relations_select(&self, uri: &NamedNode) -> SparqlQuery {
        let mut clause = WhereClause::new(self.schema.graph());
        clause.push(GroupElement::Raw(format!(
            "{} ?{} ?{} .",
            uri, PROPERTY_VARIABLE, VALUE_VARIABLE
        )));

        let mut excluded = vec![format!("<{}>", vocab::RDF_TYPE)];
        excluded.extend(
            self.schema
                .properties()
                .iter()
                .filter(|p| p.direction == PropertyDirection::Forward)
                .map(|p| p.predicate.to_string()),
        );
        clause.filter(format!("?{} NOT IN ({})", PROPERTY_VARIABLE, excluded.join(", ")));

        SparqlQuery::new(format!(
            "SELECT ?{} ?{} WHERE {}",
            PROPERTY_VARIABLE,
            VALUE_VARIABLE,
            clause.render()
        ))
    }

    /// Flattens the forward fields and relations of `instance` into raw assertions.
    pub fn to_resource_model<T: SparqlResource>(&self, instance: &T) -> Result<ResourceModel> {
        let rdf_type = instance.rdf_type().unwrap_or(self.schema.rdf_type()).clone();
        let mut model = ResourceModel::new(rdf_type);
        model.uri = instance.uri().cloned();

        for property in self
            .schema
            .properties()
            .iter()
            .filter(|p| p.direction == PropertyDirection::Forward)
        {
            for value in instance.field(&property.field).values() {
                let lexical = value.lexical().ok_or_else(|| MappingError::DanglingObjectReference {
                    field: property.field.clone(),
                })?;
                model.assert(property.predicate.clone(), lexical);
            }
        }
        for relation in instance.relations() {
            model.assert(relation.property.clone(), relation.value.clone());
        }
        Ok(model)
    }
}

/// COUNT query; grouped per URI when list properties multiply rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountQuery {
    pub query: SparqlQuery,
    pub grouped: bool,
}

impl CountQuery {
    /// Sums `?count` over all rows.
    pub fn total(&self, rows: &[QueryRow]) -> Result<usize> {
        let mut total = 0;
        for row in rows {
            let value = row
                .value(COUNT_VARIABLE)
                .ok_or_else(|| MappingError::Deserialization("count row without ?count".to_string()))?;
            total += value
                .parse::<usize>()
                .map_err(|e| MappingError::Deserialization(format!("invalid count {}: {}", value, e)))?;
        }
        Ok(total)
    }
}

/// Delete patterns and insert triples of one instance update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
    pub deletes: Vec<TriplePattern>,
    pub inserts: Vec<Triple>,
    graph: Option<NamedNode>,
}

impl UpdatePlan {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.inserts.is_empty()
    }

    /// One request: a `DELETE WHERE` per pattern, then a single `INSERT DATA`.
    pub fn to_update(&self) -> SparqlUpdate {
        let graph = self.graph.as_ref();
        let mut operations = Vec::new();
        for pattern in &self.deletes {
            let mut clause = WhereClause::new(graph);
            clause.triple(pattern.clone());
            operations.push(format!("DELETE WHERE {}", clause.render()));
        }
        if !self.inserts.is_empty() {
            operations.push(format!("INSERT DATA {}", data_block(&self.inserts, graph)));
        }
        SparqlUpdate::from_operations(operations)
    }
}

pub fn insert_data(triples: &[Triple], graph: Option<&NamedNode>) -> SparqlUpdate {
    if triples.is_empty() {
        return SparqlUpdate::new("");
    }
    SparqlUpdate::new(format!("INSERT DATA {}", data_block(triples, graph)))
}

/// Values linked to `owner` through `predicate`, for data list proxies.
pub fn build_values_select(
    owner: &NamedNode,
    predicate: &NamedNode,
    direction: PropertyDirection,
    graph: Option<&NamedNode>,
) -> SparqlQuery {
    let mut clause = WhereClause::new(graph);
    clause.triple(direction.pattern(PatternTerm::node(owner), predicate, PatternTerm::var(VALUE_VARIABLE)));
    SparqlQuery::new(format!(
        "SELECT DISTINCT ?{} WHERE {}\nORDER BY ?{}",
        VALUE_VARIABLE,
        clause.render(),
        VALUE_VARIABLE
    ))
}

/// True when `uri` is the subject of any triple, in any graph.
pub fn build_uri_exists(uri: &NamedNode) -> SparqlQuery {
    SparqlQuery::new(format!(
        "ASK {{ {{ {} ?p ?o }} UNION {{ GRAPH ?g {{ {} ?p ?o }} }} }}",
        uri, uri
    ))
}

/// Type triples and validated relations of raw resources.
pub fn build_resource_insert(models: &[ResourceModel], graph: Option<&NamedNode>) -> Result<SparqlUpdate> {
    let mut triples = Vec::new();
    for model in models {
        let uri = model
            .uri
            .as_ref()
            .ok_or_else(|| MappingError::InvalidUri(format!("resource of type {} has no URI", model.rdf_type)))?;
        triples.push(Triple::new(uri.clone(), rdf_type_predicate(), model.rdf_type.clone()));
        for relation in &model.relations {
            triples.push(Triple::new(uri.clone(), relation.property.clone(), relation.to_term()?));
        }
    }
    Ok(insert_data(&triples, graph))
}
