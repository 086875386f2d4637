/**
 * resource.rs
 * Mapped resource trait and the untyped resource shape used for raw imports
 */

use oxigraph::model::NamedNode;

use crate::errors::Result;
use crate::model::value::{FieldData, Relation};
use crate::schema::SchemaBuilder;

/// A Rust type mapped onto an RDF class.
///
/// The type registers its fields once through [`SparqlResource::describe`];
/// the engine then reads and writes them by field name.
///
/// ```ignore
/// impl SparqlResource for Device {
///     const RDF_TYPE: &'static str = "http://www.opensilex.org/vocabulary/oeso#Device";
///
///     fn describe(schema: &mut SchemaBuilder) {
///         schema.uri_field("uri");
///         schema.property("name", vocab::RDFS_LABEL).datatype(vocab::XSD_STRING);
///         schema.property("hostedBy", HOSTED_BY).object::<Facility>().optional();
///     }
///     // field accessors ...
/// }
/// ```
pub trait SparqlResource: Default + Send + Sync + 'static {
    const RDF_TYPE: &'static str;

    fn describe(schema: &mut SchemaBuilder);

    fn uri(&self) -> Option<&NamedNode>;

    fn set_uri(&mut self, uri: NamedNode);

    /// Current value of a declared field.
    fn field(&self, name: &str) -> FieldData;

    /// Assigns a declared field, failing with `UnknownField` for other names.
    fn set_field(&mut self, name: &str, value: FieldData) -> Result<()>;

    /// Concrete type read back from the store (may be a subclass).
    fn rdf_type(&self) -> Option<&NamedNode> {
        None
    }

    fn set_rdf_type(&mut self, _rdf_type: NamedNode) {}

    fn relations(&self) -> &[Relation] {
        &[]
    }

    fn relations_mut(&mut self) -> Option<&mut Vec<Relation>> {
        None
    }

    /// Text used to build a readable URI when none is set.
    fn uri_hint(&self) -> Option<String> {
        None
    }
}

/// One raw `(property, value)` pair asserted on a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub property: NamedNode,
    pub value: String,
}

/// Untyped resource: a class, optional URI and raw assertions.
///
/// Validation fills `relations` and `name` from the assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceModel {
    pub uri: Option<NamedNode>,
    pub rdf_type: NamedNode,
    pub name: Option<String>,
    pub assertions: Vec<Assertion>,
    pub relations: Vec<Relation>,
}

impl ResourceModel {
    pub fn new(rdf_type: NamedNode) -> Self {
        Self {
            uri: None,
            rdf_type,
            name: None,
            assertions: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn with_uri(mut self, uri: NamedNode) -> Self {
        self.uri = Some(uri);
        self
    }

    pub fn assert(&mut self, property: NamedNode, value: impl Into<String>) -> &mut Self {
        self.assertions.push(Assertion {
            property,
            value: value.into(),
        });
        self
    }

    /// Asserted values grouped by property, in first-seen order.
    ///
    /// Blank values (empty cells of an import) count as absent, so a property
    /// holding only blanks does not appear at all.
    pub fn values_by_property(&self) -> Vec<(&NamedNode, Vec<&str>)> {
        let mut grouped: Vec<(&NamedNode, Vec<&str>)> = Vec::new();
        for assertion in self.assertions.iter().filter(|a| !a.value.trim().is_empty()) {
            match grouped.iter_mut().find(|(p, _)| *p == &assertion.property) {
                Some((_, values)) => values.push(&assertion.value),
                None => grouped.push((&assertion.property, vec![&assertion.value])),
            }
        }
        grouped
    }
}
