//! Lazy relation lists
//!
//! A [`SparqlProxyList`] starts `Unloaded`, holding only the owner, predicate
//! and direction of the relation. [`SparqlProxyList::resolve`] runs the one
//! query that loads it and switches to `Loaded`; later calls return the cached
//! values. A proxy must stay on one thread until it is resolved.

use std::fmt;
use std::sync::Arc;

use oxigraph::model::NamedNode;
use tracing::{debug, warn};

use crate::errors::{MappingError, Result};
use crate::executor::QueryExecutor;
use crate::model::{FieldValue, SparqlResource};
use crate::query::builder::{build_values_select, VALUE_VARIABLE};
use crate::query::ClassQueryBuilder;
use crate::schema::{PropertyDirection, Schema};

/// Relation a proxy loads: values linked to `owner` through `predicate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyKey {
    pub owner: NamedNode,
    pub predicate: NamedNode,
    pub direction: PropertyDirection,
    pub graph: Option<NamedNode>,
}

type Loader<T> = fn(&ProxyKey, Option<&Schema>, &dyn QueryExecutor) -> Result<Vec<T>>;

pub enum SparqlProxyList<T> {
    Unloaded {
        key: ProxyKey,
        target: Option<Arc<Schema>>,
        loader: Loader<T>,
    },
    Loaded(Vec<T>),
}

impl SparqlProxyList<FieldValue> {
    /// Proxy over the values of a data list property.
    pub fn data(key: ProxyKey) -> Self {
        SparqlProxyList::Unloaded {
            key,
            target: None,
            loader: load_values,
        }
    }
}

impl<T: SparqlResource> SparqlProxyList<T> {
    /// Proxy over the instances of an object list property.
    pub fn objects(key: ProxyKey, target: Arc<Schema>) -> Self {
        SparqlProxyList::Unloaded {
            key,
            target: Some(target),
            loader: load_objects::<T>,
        }
    }
}

impl<T> SparqlProxyList<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, SparqlProxyList::Loaded(_))
    }

    /// Loads the list on first call; a failed load leaves the proxy unloaded.
    pub fn resolve(&mut self, executor: &dyn QueryExecutor) -> Result<&[T]> {
        if let SparqlProxyList::Unloaded { key, target, loader } = self {
            let values = (*loader)(key, target.as_deref(), executor)?;
            *self = SparqlProxyList::Loaded(values);
        }
        match self {
            SparqlProxyList::Loaded(values) => Ok(values.as_slice()),
            SparqlProxyList::Unloaded { .. } => Err(MappingError::Query("lazy list left unloaded".to_string())),
        }
    }

    /// Contents when already loaded.
    pub fn get(&self) -> Option<&[T]> {
        match self {
            SparqlProxyList::Loaded(values) => Some(values),
            SparqlProxyList::Unloaded { .. } => None,
        }
    }

    pub fn into_inner(self, executor: &dyn QueryExecutor) -> Result<Vec<T>> {
        match self {
            SparqlProxyList::Loaded(values) => Ok(values),
            SparqlProxyList::Unloaded { key, target, loader } => loader(&key, target.as_deref(), executor),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SparqlProxyList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SparqlProxyList::Unloaded { key, .. } => f.debug_struct("Unloaded").field("key", key).finish_non_exhaustive(),
            SparqlProxyList::Loaded(values) => f.debug_tuple("Loaded").field(values).finish(),
        }
    }
}

fn load_values(key: &ProxyKey, _target: Option<&Schema>, executor: &dyn QueryExecutor) -> Result<Vec<FieldValue>> {
    let query = build_values_select(&key.owner, &key.predicate, key.direction, key.graph.as_ref());
    let rows = executor.select(&query)?;
    debug!(owner = key.owner.as_str(), predicate = key.predicate.as_str(), rows = rows.len(), "loaded data list");

    let mut values = Vec::with_capacity(rows.len());
    for row in &rows {
        let Some(term) = row.get(VALUE_VARIABLE) else {
            continue;
        };
        match FieldValue::from_term(term, false) {
            Ok(value) => values.push(value),
            Err(e) => warn!(owner = key.owner.as_str(), error = %e, "skipping list value"),
        }
    }
    Ok(values)
}

fn load_objects<T: SparqlResource>(
    key: &ProxyKey,
    target: Option<&Schema>,
    executor: &dyn QueryExecutor,
) -> Result<Vec<T>> {
    let schema = target.ok_or_else(|| MappingError::Query("object list without target schema".to_string()))?;
    let builder = ClassQueryBuilder::new(schema);
    let query = builder.build_linked_select(&key.owner, &key.predicate, key.direction);
    let rows = executor.select(&query)?;
    debug!(owner = key.owner.as_str(), predicate = key.predicate.as_str(), rows = rows.len(), "loaded object list");

    let mut instances = Vec::with_capacity(rows.len());
    for row in &rows {
        match builder.instance_from_row::<T>(row) {
            Ok(instance) => instances.push(instance),
            Err(e) => warn!(
                owner = key.owner.as_str(),
                target = schema.type_name(),
                error = %e,
                "skipping list instance"
            ),
        }
    }
    Ok(instances)
}
