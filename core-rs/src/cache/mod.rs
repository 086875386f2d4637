//! Process-wide caches
//!
//! Schemas are analyzed once per Rust type and shared behind `Arc`. Class
//! restrictions are memoized per (class, include-ancestors) pair until the
//! caller invalidates them after an ontology change.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use oxigraph::model::NamedNode;
use tracing::debug;

use crate::errors::Result;
use crate::model::SparqlResource;
use crate::ontology::{ClassRestrictions, RestrictionStore};
use crate::schema::{analyze, Schema};

/// Analyzed schemas keyed by the mapped type.
#[derive(Debug, Default)]
pub struct SchemaCache {
    schemas: RwLock<HashMap<TypeId, Arc<Schema>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema of `T`, analyzing it on first request.
    ///
    /// Concurrent first requests for the same type run the analysis once; an
    /// invalid definition is not cached and fails again on the next call.
    pub fn get<T: SparqlResource>(&self) -> Result<Arc<Schema>> {
        let key = TypeId::of::<T>();
        if let Some(schema) = self
            .schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(schema));
        }

        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(schema) = schemas.get(&key) {
            return Ok(Arc::clone(schema));
        }
        let schema = Arc::new(analyze::<T>()?);
        debug!(type_name = schema.type_name(), "cached schema");
        schemas.insert(key, Arc::clone(&schema));
        Ok(schema)
    }

    pub fn len(&self) -> usize {
        self.schemas.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Memoizing wrapper over another [`RestrictionStore`].
pub struct CachedRestrictionStore<S> {
    inner: S,
    entries: RwLock<HashMap<(String, bool), Arc<ClassRestrictions>>>,
}

impl<S: RestrictionStore> CachedRestrictionStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drops both cached variants for `class`.
    pub fn invalidate(&self, class: &NamedNode) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&(class.as_str().to_string(), true));
        entries.remove(&(class.as_str().to_string(), false));
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl<S: RestrictionStore> RestrictionStore for CachedRestrictionStore<S> {
    fn class_restrictions(&self, class: &NamedNode, include_ancestors: bool) -> Result<Arc<ClassRestrictions>> {
        let key = (class.as_str().to_string(), include_ancestors);
        if let Some(found) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(found));
        }

        // Loaded outside the lock; a racing load of the same key keeps the first entry.
        let loaded = self.inner.class_restrictions(class, include_ancestors)?;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(key).or_insert(loaded)))
    }
}
