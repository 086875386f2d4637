//! Shared fixtures for unit tests: two mapped types, a small ontology and a
//! counting executor.

use std::sync::atomic::{AtomicUsize, Ordering};

use oxigraph::model::NamedNode;

use crate::errors::{MappingError, Result};
use crate::executor::{OxigraphExecutor, QueryExecutor, QueryRow};
use crate::model::{FieldData, Relation, SparqlResource};
use crate::query::{SparqlQuery, SparqlUpdate};
use crate::schema::SchemaBuilder;
use crate::vocab;

pub const DATA: &str = "http://example.org/data/";

pub const DEVICE: &str = "http://example.org/vocab#Device";
pub const SENSOR: &str = "http://example.org/vocab#Sensor";
pub const FACILITY: &str = "http://example.org/vocab#Facility";
pub const VARIABLE: &str = "http://example.org/vocab#Variable";
pub const SERIAL_NUMBER: &str = "http://example.org/vocab#serialNumber";
pub const TAG: &str = "http://example.org/vocab#tag";
pub const HOSTED_BY: &str = "http://example.org/vocab#hostedBy";
pub const PART_OF: &str = "http://example.org/vocab#partOf";
pub const MEASURES: &str = "http://example.org/vocab#measures";
pub const WEIGHT: &str = "http://example.org/vocab#weight";

pub const ONTOLOGY_TTL: &str = r#"
@prefix ex: <http://example.org/vocab#> .
@prefix owl: <http://www.w3.org/2002/07/owl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

ex:Facility a owl:Class ;
    rdfs:subClassOf [ a owl:Restriction ; owl:onProperty rdfs:label ;
        owl:qualifiedCardinality "1"^^xsd:nonNegativeInteger ; owl:onDataRange xsd:string ] .

ex:Greenhouse a owl:Class ; rdfs:subClassOf ex:Facility .

ex:Variable a owl:Class ;
    rdfs:subClassOf [ a owl:Restriction ; owl:onProperty rdfs:label ;
        owl:qualifiedCardinality "1"^^xsd:nonNegativeInteger ; owl:onDataRange xsd:string ] .

ex:Device a owl:Class ;
    rdfs:subClassOf
        [ a owl:Restriction ; owl:onProperty rdfs:label ;
          owl:qualifiedCardinality "1"^^xsd:nonNegativeInteger ; owl:onDataRange xsd:string ] ,
        [ a owl:Restriction ; owl:onProperty ex:serialNumber ;
          owl:maxQualifiedCardinality "1"^^xsd:nonNegativeInteger ; owl:onDataRange xsd:string ] ,
        [ a owl:Restriction ; owl:onProperty ex:tag ;
          owl:minQualifiedCardinality "0"^^xsd:nonNegativeInteger ; owl:onDataRange xsd:string ] ,
        [ a owl:Restriction ; owl:onProperty ex:weight ;
          owl:maxQualifiedCardinality "1"^^xsd:nonNegativeInteger ; owl:onDataRange xsd:decimal ] ,
        [ a owl:Restriction ; owl:onProperty ex:hostedBy ;
          owl:maxQualifiedCardinality "1"^^xsd:nonNegativeInteger ; owl:onClass ex:Facility ] .

ex:Sensor a owl:Class ;
    rdfs:subClassOf ex:Device ,
        [ a owl:Restriction ; owl:onProperty ex:measures ; owl:someValuesFrom ex:Variable ] .
"#;

pub const DATA_TTL: &str = r#"
@prefix ex: <http://example.org/vocab#> .
@prefix d: <http://example.org/data/> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .

d:facility1 a ex:Facility ; rdfs:label "Greenhouse A" .
d:greenhouse2 a ex:Greenhouse ; rdfs:label "Greenhouse B" .
d:variable1 a ex:Variable ; rdfs:label "Air temperature" .

d:device1 a ex:Device ; rdfs:label "Logger 1" ; ex:serialNumber "SN-1" ;
    ex:tag "alpha" , "beta" ; ex:hostedBy d:facility1 .
d:device2 a ex:Sensor ; rdfs:label "Sensor 2" ; ex:hostedBy d:greenhouse2 ;
    ex:measures d:variable1 .
d:device3 a ex:Device ; rdfs:label "Logger 3" ; ex:partOf d:device1 .
"#;

pub fn node(iri: &str) -> NamedNode {
    NamedNode::new(iri).unwrap()
}

pub fn data(local: &str) -> NamedNode {
    node(&format!("{}{}", DATA, local))
}

pub fn loaded_executor() -> OxigraphExecutor {
    let executor = OxigraphExecutor::new().unwrap();
    executor.load_turtle(ONTOLOGY_TTL).unwrap();
    executor.load_turtle(DATA_TTL).unwrap();
    executor
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Facility {
    pub uri: Option<NamedNode>,
    pub name: Option<String>,
}

impl SparqlResource for Facility {
    const RDF_TYPE: &'static str = FACILITY;

    fn describe(schema: &mut SchemaBuilder) {
        schema.uri_field("uri");
        schema.property("name", vocab::RDFS_LABEL).datatype(vocab::XSD_STRING);
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
            _ => FieldData::Empty,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldData) -> Result<()> {
        match name {
            "name" => self.name = value.into_string(),
            other => return Err(MappingError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    fn uri_hint(&self) -> Option<String> {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Device {
    pub uri: Option<NamedNode>,
    pub rdf_type: Option<NamedNode>,
    pub name: Option<String>,
    pub serial: Option<String>,
    pub tags: Vec<String>,
    pub host: Option<NamedNode>,
    pub components: Vec<NamedNode>,
    pub relations: Vec<Relation>,
}

impl SparqlResource for Device {
    const RDF_TYPE: &'static str = DEVICE;

    fn describe(schema: &mut SchemaBuilder) {
        schema.uri_field("uri");
        schema.property("name", vocab::RDFS_LABEL).datatype(vocab::XSD_STRING);
        schema.property("serial", SERIAL_NUMBER).datatype(vocab::XSD_STRING).optional();
        schema.property("tags", TAG).datatype(vocab::XSD_STRING).list().optional();
        schema.property("host", HOSTED_BY).object::<Facility>().optional();
        schema
            .property("components", PART_OF)
            .object::<Device>()
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
            "serial" => FieldData::string(self.serial.as_deref()),
            "tags" => FieldData::strings(&self.tags),
            "host" => FieldData::object(self.host.as_ref()),
            "components" => FieldData::objects(&self.components),
            _ => FieldData::Empty,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldData) -> Result<()> {
        match name {
            "name" => self.name = value.into_string(),
            "serial" => self.serial = value.into_string(),
            "tags" => self.tags = value.into_strings(),
            "host" => self.host = value.into_named_node(),
            "components" => self.components = value.into_named_nodes(),
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

/// Executor wrapper counting the requests it forwards.
pub struct CountingExecutor<E> {
    pub inner: E,
    pub selects: AtomicUsize,
    pub asks: AtomicUsize,
    pub updates: AtomicUsize,
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
