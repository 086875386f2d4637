/**
 * builder.rs
 * Registration API used by mapped types to declare their fields
 */

use crate::model::SparqlResource;

/// Declaration of one mapped field, refined through chained setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDeclaration {
    pub(crate) field: String,
    pub(crate) predicate: String,
    pub(crate) datatype: Option<String>,
    pub(crate) target: Option<(String, String)>,
    pub(crate) list: bool,
    pub(crate) optional: bool,
    pub(crate) reverse: bool,
}

impl FieldDeclaration {
    /// Literal (or xsd:anyURI) range of a data property.
    pub fn datatype(&mut self, iri: &str) -> &mut Self {
        self.datatype = Some(iri.to_string());
        self
    }

    /// Object range: values are instances of `T`.
    pub fn object<T: SparqlResource>(&mut self) -> &mut Self {
        self.target = Some((T::RDF_TYPE.to_string(), short_type_name::<T>().to_string()));
        self
    }

    pub fn list(&mut self) -> &mut Self {
        self.list = true;
        self
    }

    pub fn optional(&mut self) -> &mut Self {
        self.optional = true;
        self
    }

    /// The triple points from the value to the owner.
    pub fn reverse(&mut self) -> &mut Self {
        self.reverse = true;
        self
    }
}

/// Collects field declarations for one type.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    pub(crate) type_name: String,
    pub(crate) rdf_type: String,
    pub(crate) uri_fields: Vec<String>,
    pub(crate) fields: Vec<FieldDeclaration>,
    pub(crate) graph: Option<String>,
    pub(crate) allow_blank_nodes: bool,
    pub(crate) validated: bool,
}

impl SchemaBuilder {
    pub fn new(type_name: impl Into<String>, rdf_type: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            rdf_type: rdf_type.into(),
            uri_fields: Vec::new(),
            fields: Vec::new(),
            graph: None,
            allow_blank_nodes: false,
            validated: true,
        }
    }

    pub fn uri_field(&mut self, name: &str) -> &mut Self {
        self.uri_fields.push(name.to_string());
        self
    }

    pub fn property(&mut self, field: &str, predicate: &str) -> &mut FieldDeclaration {
        let index = self.fields.len();
        self.fields.push(FieldDeclaration {
            field: field.to_string(),
            predicate: predicate.to_string(),
            datatype: None,
            target: None,
            list: false,
            optional: false,
            reverse: false,
        });
        &mut self.fields[index]
    }

    /// Default named graph for reads and writes of this type.
    pub fn graph(&mut self, iri: &str) -> &mut Self {
        self.graph = Some(iri.to_string());
        self
    }

    pub fn allow_blank_nodes(&mut self) -> &mut Self {
        self.allow_blank_nodes = true;
        self
    }

    /// Writes of this type bypass OWL restriction validation.
    pub fn skip_validation(&mut self) -> &mut Self {
        self.validated = false;
        self
    }
}

/// Last path segment of a Rust type name.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
