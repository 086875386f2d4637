//! Engine configuration loaded from YAML
//!
//! ```yaml
//! nbErrorLimit: 100
//! queryTimeoutMs: 5000
//! uriBase: http://opensilex.dev/id
//! labelPredicate: http://www.w3.org/2000/01/rdf-schema#label
//! includeAncestorRestrictions: true
//! allowBlankNodes: false
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use oxigraph::model::NamedNode;
use serde::{Deserialize, Serialize};

use crate::errors::{MappingError, Result};
use crate::vocab;

pub const DEFAULT_URI_BASE: &str = "http://opensilex.dev/id";

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MappingConfig {
    /// Cap on recorded validation errors, unlimited when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nb_error_limit: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_timeout_ms: Option<u64>,

    #[serde(default = "default_uri_base")]
    pub uri_base: String,

    /// Predicate whose validated value becomes the display name of a resource
    #[serde(default = "default_label_predicate")]
    pub label_predicate: String,

    #[serde(default = "default_true")]
    pub include_ancestor_restrictions: bool,

    #[serde(default)]
    pub allow_blank_nodes: bool,
}

fn default_uri_base() -> String {
    DEFAULT_URI_BASE.to_string()
}

fn default_label_predicate() -> String {
    vocab::RDFS_LABEL.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            nb_error_limit: None,
            query_timeout_ms: None,
            uri_base: default_uri_base(),
            label_predicate: default_label_predicate(),
            include_ancestor_restrictions: true,
            allow_blank_nodes: false,
        }
    }
}

impl MappingConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MappingError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Config file not found: {:?}", path),
            )));
        }
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: MappingConfig = serde_yaml::from_str(content)?;
        config.label_predicate()?;
        Ok(config)
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }

    pub fn label_predicate(&self) -> Result<NamedNode> {
        Ok(NamedNode::new(self.label_predicate.as_str())?)
    }

    pub fn with_error_limit(mut self, limit: Option<usize>) -> Self {
        self.nb_error_limit = limit;
        self
    }
}
