/**
 * store.rs
 * Query executor backed by an in-process oxigraph store
 */

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::NamedNode;
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use tracing::{debug, info};

use crate::errors::{MappingError, Result};
use crate::executor::{QueryExecutor, QueryRow};
use crate::query::{SparqlQuery, SparqlUpdate};

pub struct OxigraphExecutor {
    store: Store,
    timeout: Option<Duration>,
}

impl OxigraphExecutor {
    /// Create an executor over a fresh in-memory store
    pub fn new() -> Result<Self> {
        let store = Store::new().map_err(|e| MappingError::Store(e.to_string()))?;
        Ok(Self::from_store(store))
    }

    pub fn from_store(store: Store) -> Self {
        Self {
            store,
            timeout: None,
        }
    }

    /// Deadline checked while solutions are streamed.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Load Turtle into the default graph
    pub fn load_turtle(&self, content: &str) -> Result<()> {
        self.store
            .load_from_reader(RdfFormat::Turtle, content.as_bytes())
            .map_err(|e| MappingError::Store(e.to_string()))?;
        Ok(())
    }

    /// Load Turtle into a named graph
    pub fn load_turtle_into(&self, content: &str, graph: &NamedNode) -> Result<()> {
        self.store
            .load_from_reader(
                RdfParser::from_format(RdfFormat::Turtle).with_default_graph(graph.clone()),
                content.as_bytes(),
            )
            .map_err(|e| MappingError::Store(e.to_string()))?;
        Ok(())
    }

    pub fn load_file(&self, path: &Path) -> Result<()> {
        info!(path = %path.display(), "loading Turtle file");

        if !path.exists() {
            return Err(MappingError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {:?}", path),
            )));
        }
        if path.is_dir() {
            return Err(MappingError::Store(format!("Path is a directory: {:?}", path)));
        }

        let content = fs::read_to_string(path)?;
        self.load_turtle(&content)
    }

    pub fn len(&self) -> Result<usize> {
        self.store.len().map_err(|e| MappingError::Store(e.to_string()))
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.store.is_empty().map_err(|e| MappingError::Store(e.to_string()))
    }

    fn check_deadline(&self, started: Instant) -> Result<()> {
        match self.timeout {
            Some(limit) if started.elapsed() > limit => Err(MappingError::Timeout(limit)),
            _ => Ok(()),
        }
    }
}

impl QueryExecutor for OxigraphExecutor {
    fn select(&self, query: &SparqlQuery) -> Result<Vec<QueryRow>> {
        debug!(query = query.as_str(), "select");
        let started = Instant::now();

        let results = self
            .store
            .query(query.as_str())
            .map_err(|e| MappingError::Query(e.to_string()))?;

        match results {
            QueryResults::Solutions(solutions) => {
                let mut rows = Vec::new();
                for solution in solutions {
                    self.check_deadline(started)?;
                    let solution = solution.map_err(|e| MappingError::Query(e.to_string()))?;
                    rows.push(
                        solution
                            .iter()
                            .map(|(variable, term)| (variable.as_str().to_string(), term.clone()))
                            .collect(),
                    );
                }
                self.check_deadline(started)?;
                Ok(rows)
            }
            QueryResults::Boolean(_) => Err(MappingError::Query(
                "Expected SELECT solutions, got an ASK result".to_string(),
            )),
            QueryResults::Graph(_) => Err(MappingError::Query(
                "Graph queries are not supported".to_string(),
            )),
        }
    }

    fn ask(&self, query: &SparqlQuery) -> Result<bool> {
        debug!(query = query.as_str(), "ask");
        let started = Instant::now();

        let results = self
            .store
            .query(query.as_str())
            .map_err(|e| MappingError::Query(e.to_string()))?;
        self.check_deadline(started)?;

        match results {
            QueryResults::Boolean(result) => Ok(result),
            _ => Err(MappingError::Query("Expected an ASK result".to_string())),
        }
    }

    fn update(&self, update: &SparqlUpdate) -> Result<()> {
        debug!(update = update.as_str(), "update");
        self.store
            .update(update.as_str())
            .map_err(|e| MappingError::Store(e.to_string()))
    }
}
