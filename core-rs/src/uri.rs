//! URIs for resources created without one

use once_cell::sync::Lazy;
use oxigraph::model::NamedNode;
use regex::Regex;
use uuid::Uuid;

use crate::errors::Result;
use crate::vocab;

static NOT_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

/// Builds `<base>/<type local name>/<slug or uuid>` URIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriGenerator {
    base: String,
}

impl UriGenerator {
    pub fn new(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// A readable URI when `hint` yields a slug, a random one otherwise.
    pub fn generate(&self, rdf_type: &NamedNode, hint: Option<&str>) -> Result<NamedNode> {
        let segment = vocab::local_name(rdf_type.as_str()).to_lowercase();
        let id = hint.map(slug).filter(|s| !s.is_empty()).unwrap_or_else(|| Uuid::new_v4().to_string());
        Ok(NamedNode::new(format!("{}/{}/{}", self.base, segment, id))?)
    }

    /// Always random; used when the readable URI is already taken.
    pub fn generate_random(&self, rdf_type: &NamedNode) -> Result<NamedNode> {
        self.generate(rdf_type, None)
    }
}

fn slug(text: &str) -> String {
    NOT_SLUG
        .replace_all(&text.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}
