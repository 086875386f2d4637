//! Fixtures shared by the integration and contract tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use oxigraph::model::NamedNode;
use sparql_orm::{
    vocab, FieldData, FieldValue, MappingConfig, MappingError, OxigraphExecutor, QueryExecutor, QueryRow, Relation,
    Result, SchemaBuilder, SparqlQuery, SparqlResource, SparqlService, SparqlUpdate,
};

pub const ONTOLOGY_TTL: &str = include_str!("../fixtures/ontology.ttl");
pub const DATA_TTL: &str = include_str!("../fixtures/data.ttl");

pub const VOCAB: &str = "http://test.opensilex.org/vocab#";
pub const ID: &str = "http://test.opensilex.org/id/";

pub const SPECIES: &str = "http://test.opensilex.org/vocab#Species";
pub const PLANT: &str = "http://test.opensilex.org/vocab#Plant";
pub const TREE: &str = "http://test.opensilex.org/vocab#Tree";
pub const FROM_SPECIES: &str = "http://test.opensilex.org/vocab#fromSpecies";
pub const HAS_SOWING_DATE: &str = "http://test.opensilex.org/vocab#hasSowingDate";
pub const HAS_PARENT: &str = "http://test.opensilex.org/vocab#hasParent";
pub const HAS_HEIGHT: &str = "http://test.opensilex.org/vocab#hasHeight";
pub const HAS_REFERENCE: &str = "http://test.opensilex.org/vocab#hasReference";

pub fn node(iri: &str) -> NamedNode {
    NamedNode::new(iri).unwrap()
}

pub fn id(local: &str) -> NamedNode {
    node(&format!("{}{}", ID, local))
}

pub fn loaded_store() -> OxigraphExecutor {
    let executor = OxigraphExecutor::new().unwrap();
    executor.load_turtle(ONTOLOGY_TTL).unwrap();
    executor.load_turtle(DATA_TTL).unwrap();
    executor
}

pub fn service_with(config: MappingConfig) -> SparqlService<Arc<OxigraphExecutor>> {
    SparqlService::over_store(Arc::new(loaded_store()), config).unwrap()
}

pub fn service() -> SparqlService<Arc<OxigraphExecutor>> {
    service_with(MappingConfig::default())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Species {
    pub uri: Option<NamedNode>,
    pub name: Option<String>,
    pub reference: Option<String>,
}

impl SparqlResource for Species {
    const RDF_TYPE: &'static str = SPECIES;

    fn describe(schema: &mut SchemaBuilder) {
        schema.uri_field("uri");
        schema.property("name", vocab::RDFS_LABEL).datatype(vocab::XSD_STRING);
        schema
            .property("reference", HAS_REFERENCE)
            .datatype(vocab::XSD_ANY_URI)
            .optional();
    }

    fn uri(&self) -> Option<&NamedNode> {
        self.uri.as_ref()
    }

    fn set_uri(&mut self, uri: NamedNode) {
        self.uri = Some(uri);
    }

    fn field(&self, name: &str) -> FieldData {
        match name {
            "name" => FieldData::string(self.name.as_deref()),
            "reference" => self
                .reference
                .as_deref()
                .and_then(|iri| FieldValue::iri(iri).ok())
                .into(),
            _ => FieldData::Empty,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldData) -> Result<()> {
        match name {
            "name" => self.name = value.into_string(),
            "reference" => self.reference = value.into_string(),
            other => return Err(MappingError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    fn uri_hint(&self) -> Option<String> {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Plant {
    pub uri: Option<NamedNode>,
    pub rdf_type: Option<NamedNode>,
    pub name: Option<String>,
    pub species: Option<NamedNode>,
    pub sowing_date: Option<String>,
    pub notes: Vec<String>,
    pub children: Vec<NamedNode>,
    pub relations: Vec<Relation>,
}

impl SparqlResource for Plant {
    const RDF_TYPE: &'static str = PLANT;

    fn describe(schema: &mut SchemaBuilder) {
        schema.uri_field("uri");
        schema.property("name", vocab::RDFS_LABEL).datatype(vocab::XSD_STRING);
        schema.property("species", FROM_SPECIES).object::<Species>();
        schema
            .property("sowingDate", HAS_SOWING_DATE)
            .datatype(vocab::XSD_DATE)
            .optional();
        schema
            .property("notes", vocab::RDFS_COMMENT)
            .datatype(vocab::XSD_STRING)
            .list()
            .optional();
        schema
            .property("children", HAS_PARENT)
            .object::<Plant>()
            .list()
            .optional()
            .reverse();
    }

    fn uri(&self) -> Option<&NamedNode> {
        self.uri.as_ref()
    }

    fn set_uri(&mut self, uri: NamedNode) {
        self.uri = Some(uri);
    }

    fn field(&self, name: &str) -> FieldData {
        match name {
            "name" => FieldData::string(self.name.as_deref()),
            "species" => FieldData::object(self.species.as_ref()),
            "sowingDate" => self
                .sowing_date
                .as_deref()
                .and_then(|date| FieldValue::typed(date, vocab::XSD_DATE).ok())
                .into(),
            "notes" => FieldData::strings(&self.notes),
            "children" => FieldData::objects(&self.children),
            _ => FieldData::Empty,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldData) -> Result<()> {
        match name {
            "name" => self.name = value.into_string(),
            "species" => self.species = value.into_named_node(),
            "sowingDate" => self.sowing_date = value.into_string(),
            "notes" => self.notes = value.into_strings(),
            "children" => self.children = value.into_named_nodes(),
            other => return Err(MappingError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    fn rdf_type(&self) -> Option<&NamedNode> {
        self.rdf_type.as_ref()
    }

    fn set_rdf_type(&mut self, rdf_type: NamedNode) {
        self.rdf_type = Some(rdf_type);
    }

    fn relations(&self) -> &[Relation] {
        &self.relations
    }

    fn relations_mut(&mut self) -> Option<&mut Vec<Relation>> {
        Some(&mut self.relations)
    }

    fn uri_hint(&self) -> Option<String> {
        self.name.clone()
    }
}

pub fn plant(name: &str, species: &str) -> Plant {
    Plant {
        name: Some(name.to_string()),
        species: Some(id(species)),
        ..Plant::default()
    }
}

/// Forwards to an executor, counting requests per kind.
pub struct CountingExecutor<E> {
    pub inner: E,
    selects: AtomicUsize,
    asks: AtomicUsize,
    updates: AtomicUsize,
}

impl<E: QueryExecutor> CountingExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            selects: AtomicUsize::new(0),
            asks: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
        }
    }

    pub fn selects(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }

    pub fn asks(&self) -> usize {
        self.asks.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

impl<E: QueryExecutor> QueryExecutor for CountingExecutor<E> {
    fn select(&self, query: &SparqlQuery) -> Result<Vec<QueryRow>> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        self.inner.select(query)
    }

    fn ask(&self, query: &SparqlQuery) -> Result<bool> {
        self.asks.fetch_add(1, Ordering::SeqCst);
        self.inner.ask(query)
    }

    fn update(&self, update: &SparqlUpdate) -> Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(update)
    }
}
