/**
 * value.rs
 * Field values exchanged between model instances and the query builder
 */

use oxigraph::model::{Literal, NamedNode, Term};

use crate::errors::{MappingError, Result};
use crate::vocab;

/// One value held by a mapped field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    Literal(Literal),
    /// Resource value of a data property (xsd:anyURI)
    Iri(NamedNode),
    /// Reference to a nested instance, `None` when that instance has no URI yet
    Object(Option<NamedNode>),
}

impl FieldValue {
    pub fn string(value: impl Into<String>) -> Self {
        FieldValue::Literal(Literal::new_simple_literal(value))
    }

    pub fn typed(value: impl Into<String>, datatype: &str) -> Result<Self> {
        let datatype = NamedNode::new(datatype)?;
        Ok(FieldValue::Literal(Literal::new_typed_literal(value, datatype)))
    }

    pub fn integer(value: i64) -> Self {
        FieldValue::Literal(Literal::from(value))
    }

    pub fn boolean(value: bool) -> Self {
        FieldValue::Literal(Literal::from(value))
    }

    pub fn iri(value: &str) -> Result<Self> {
        Ok(FieldValue::Iri(NamedNode::new(value)?))
    }

    pub fn object(uri: &NamedNode) -> Self {
        FieldValue::Object(Some(uri.clone()))
    }

    /// Converts a bound query term according to the field range.
    pub fn from_term(term: &Term, object_range: bool) -> Result<Self> {
        match term {
            Term::NamedNode(node) if object_range => Ok(FieldValue::Object(Some(node.clone()))),
            Term::NamedNode(node) => Ok(FieldValue::Iri(node.clone())),
            Term::Literal(literal) if !object_range => Ok(FieldValue::Literal(literal.clone())),
            other => Err(MappingError::Deserialization(format!(
                "Unexpected term {} for {} field",
                other,
                if object_range { "object" } else { "data" }
            ))),
        }
    }

    /// Lexical form of the value, `None` for an unresolved object.
    pub fn lexical(&self) -> Option<&str> {
        match self {
            FieldValue::Literal(literal) => Some(literal.value()),
            FieldValue::Iri(node) => Some(node.as_str()),
            FieldValue::Object(node) => node.as_ref().map(NamedNode::as_str),
        }
    }

    pub fn to_term(&self) -> Option<Term> {
        match self {
            FieldValue::Literal(literal) => Some(Term::Literal(literal.clone())),
            FieldValue::Iri(node) => Some(Term::NamedNode(node.clone())),
            FieldValue::Object(node) => node.clone().map(Term::NamedNode),
        }
    }

    pub fn as_named_node(&self) -> Option<&NamedNode> {
        match self {
            FieldValue::Iri(node) | FieldValue::Object(Some(node)) => Some(node),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        self.lexical().map(str::to_string)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Literal(literal) => literal.value().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Literal(literal) => match literal.value() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Everything a field can hold: nothing, one value or a list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldData {
    #[default]
    Empty,
    One(FieldValue),
    Many(Vec<FieldValue>),
}

impl FieldData {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldData::Empty => true,
            FieldData::One(_) => false,
            FieldData::Many(values) => values.is_empty(),
        }
    }

    pub fn values(&self) -> Vec<&FieldValue> {
        match self {
            FieldData::Empty => Vec::new(),
            FieldData::One(value) => vec![value],
            FieldData::Many(values) => values.iter().collect(),
        }
    }

    pub fn into_values(self) -> Vec<FieldValue> {
        match self {
            FieldData::Empty => Vec::new(),
            FieldData::One(value) => vec![value],
            FieldData::Many(values) => values,
        }
    }

    /// First value, for scalar setters.
    pub fn into_single(self) -> Option<FieldValue> {
        self.into_values().into_iter().next()
    }

    pub fn into_string(self) -> Option<String> {
        self.into_single().and_then(FieldValue::into_string)
    }

    pub fn into_strings(self) -> Vec<String> {
        self.into_values()
            .into_iter()
            .filter_map(FieldValue::into_string)
            .collect()
    }

    pub fn into_named_node(self) -> Option<NamedNode> {
        self.into_single().and_then(|value| value.as_named_node().cloned())
    }

    pub fn into_named_nodes(self) -> Vec<NamedNode> {
        self.into_values()
            .iter()
            .filter_map(|value| value.as_named_node().cloned())
            .collect()
    }

    pub fn string(value: Option<&str>) -> Self {
        value.map(FieldValue::string).into()
    }

    pub fn strings<S: AsRef<str>>(values: &[S]) -> Self {
        FieldData::Many(values.iter().map(|v| FieldValue::string(v.as_ref())).collect())
    }

    pub fn object(uri: Option<&NamedNode>) -> Self {
        uri.map(FieldValue::object).into()
    }

    pub fn objects(uris: &[NamedNode]) -> Self {
        FieldData::Many(uris.iter().map(FieldValue::object).collect())
    }
}

impl From<Option<FieldValue>> for FieldData {
    fn from(value: Option<FieldValue>) -> Self {
        match value {
            Some(value) => FieldData::One(value),
            None => FieldData::Empty,
        }
    }
}

impl From<FieldValue> for FieldData {
    fn from(value: FieldValue) -> Self {
        FieldData::One(value)
    }
}

/// A triple asserted on an instance outside its mapped fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation {
    pub property: NamedNode,
    pub value: String,
    /// Literal datatype, `None` when the value is a resource
    pub value_type: Option<NamedNode>,
}

impl Relation {
    pub fn resource(property: NamedNode, value: &NamedNode) -> Self {
        Self {
            property,
            value: value.as_str().to_string(),
            value_type: None,
        }
    }

    pub fn literal(property: NamedNode, value: impl Into<String>, datatype: NamedNode) -> Self {
        Self {
            property,
            value: value.into(),
            value_type: Some(datatype),
        }
    }

    pub fn from_term(property: NamedNode, term: &Term) -> Option<Self> {
        match term {
            Term::NamedNode(node) => Some(Self::resource(property, node)),
            Term::Literal(literal) => Some(Self::literal(
                property,
                literal.value(),
                literal.datatype().into_owned(),
            )),
            _ => None,
        }
    }

    pub fn is_resource(&self) -> bool {
        self.value_type.is_none()
    }

    pub fn to_term(&self) -> Result<Term> {
        match &self.value_type {
            None => Ok(Term::NamedNode(NamedNode::new(self.value.as_str())?)),
            // language tags are not kept on relations
            Some(datatype) if datatype.as_str() == vocab::RDF_LANG_STRING => {
                Ok(Term::Literal(Literal::new_simple_literal(self.value.as_str())))
            }
            Some(datatype) => Ok(Term::Literal(Literal::new_typed_literal(
                self.value.as_str(),
                datatype.clone(),
            ))),
        }
    }
}
