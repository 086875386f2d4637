/**
 * service.rs
 * Mapping service: schemas, queries, validation and execution together
 */

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use oxigraph::model::NamedNode;
use tracing::{debug, info};

use crate::cache::{CachedRestrictionStore, SchemaCache};
use crate::config::MappingConfig;
use crate::errors::{MappingError, Result};
use crate::executor::QueryExecutor;
use crate::model::{FieldValue, ResourceModel, SparqlResource};
use crate::ontology::{ClassRestrictions, RestrictionStore, SparqlRestrictionStore};
use crate::proxy::{ProxyKey, SparqlProxyList};
use crate::query::builder::{build_resource_insert, build_uri_exists};
use crate::query::{ClassQueryBuilder, Page, SearchOptions};
use crate::schema::{PropertyMapping, Schema};
use crate::uri::UriGenerator;
use crate::validation::{OwlRestrictionValidator, ValidationReport};

pub struct SparqlService<E> {
    executor: E,
    schemas: Arc<SchemaCache>,
    restrictions: Arc<dyn RestrictionStore>,
    config: MappingConfig,
    uri_generator: UriGenerator,
    label_predicate: NamedNode,
}

impl<X: QueryExecutor + 'static> SparqlService<Arc<X>> {
    /// Service reading restrictions from the same store, cached.
    pub fn over_store(executor: Arc<X>, config: MappingConfig) -> Result<Self> {
        let restrictions = Arc::new(CachedRestrictionStore::new(SparqlRestrictionStore::new(Arc::clone(
            &executor,
        ))));
        Self::new(executor, restrictions, config)
    }
}

impl<E: QueryExecutor> SparqlService<E> {
    pub fn new(executor: E, restrictions: Arc<dyn RestrictionStore>, config: MappingConfig) -> Result<Self> {
        let label_predicate = config.label_predicate()?;
        Ok(Self {
            executor,
            schemas: Arc::new(SchemaCache::new()),
            restrictions,
            uri_generator: UriGenerator::new(config.uri_base.as_str()),
            config,
            label_predicate,
        })
    }

    /// Shares a schema cache with other services.
    pub fn with_schema_cache(mut self, schemas: Arc<SchemaCache>) -> Self {
        self.schemas = schemas;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    pub fn schema<T: SparqlResource>(&self) -> Result<Arc<Schema>> {
        self.schemas.get::<T>()
    }

    fn builder<'s>(&self, schema: &'s Schema) -> ClassQueryBuilder<'s> {
        ClassQueryBuilder::new(schema).allow_blank_nodes(self.config.allow_blank_nodes)
    }

    fn validator(&self) -> OwlRestrictionValidator<'_> {
        OwlRestrictionValidator::new(&self.executor)
            .with_error_limit(self.config.nb_error_limit)
            .with_label_predicate(self.label_predicate.clone())
    }

    fn class_restrictions(
        &self,
        seen: &mut HashMap<String, Arc<ClassRestrictions>>,
        class: &NamedNode,
    ) -> Result<Arc<ClassRestrictions>> {
        if let Some(found) = seen.get(class.as_str()) {
            return Ok(Arc::clone(found));
        }
        let found = self
            .restrictions
            .class_restrictions(class, self.config.include_ancestor_restrictions)?;
        seen.insert(class.as_str().to_string(), Arc::clone(&found));
        Ok(found)
    }

    fn check_report(report: ValidationReport) -> Result<ValidationReport> {
        if report.is_valid() {
            Ok(report)
        } else {
            Err(MappingError::Validation(report))
        }
    }

    /// Supplied URIs must be new; missing ones are generated, falling back
    /// to a random URI when the readable one is taken.
    fn resolve_uri(
        &self,
        supplied: Option<&NamedNode>,
        rdf_type: &NamedNode,
        hint: Option<&str>,
        taken: &mut HashSet<String>,
    ) -> Result<NamedNode> {
        if let Some(uri) = supplied {
            if !taken.insert(uri.as_str().to_string()) || self.executor.ask(&build_uri_exists(uri))? {
                return Err(MappingError::UriAlreadyExists(uri.as_str().to_string()));
            }
            return Ok(uri.clone());
        }

        let mut uri = self.uri_generator.generate(rdf_type, hint)?;
        if taken.contains(uri.as_str()) || self.executor.ask(&build_uri_exists(&uri))? {
            uri = self.uri_generator.generate_random(rdf_type)?;
        }
        taken.insert(uri.as_str().to_string());
        Ok(uri)
    }

    fn validate_instances<T: SparqlResource>(&self, builder: &ClassQueryBuilder<'_>, instances: &[&T]) -> Result<()> {
        if !builder.schema().is_validated() {
            return Ok(());
        }
        let mut seen = HashMap::new();
        let mut validator = self.validator();
        for instance in instances {
            let mut model = builder.to_resource_model(*instance)?;
            let restrictions = self.class_restrictions(&mut seen, &model.rdf_type)?;
            validator.validate_model(&restrictions, &mut model);
        }
        Self::check_report(validator.finish()?)?;
        Ok(())
    }

    pub fn create<T: SparqlResource>(&self, instance: &mut T) -> Result<()> {
        self.create_all(std::slice::from_mut(instance))
    }

    /// Validates the batch, assigns URIs and inserts everything in one request.
    pub fn create_all<T: SparqlResource>(&self, instances: &mut [T]) -> Result<()> {
        if instances.is_empty() {
            return Ok(());
        }
        let schema = self.schema::<T>()?;
        let builder = self.builder(&schema);

        let refs: Vec<&T> = instances.iter().collect();
        self.validate_instances(&builder, &refs)?;

        let mut taken = HashSet::new();
        for instance in instances.iter_mut() {
            let rdf_type = instance.rdf_type().unwrap_or(schema.rdf_type()).clone();
            let hint = instance.uri_hint();
            let uri = self.resolve_uri(instance.uri(), &rdf_type, hint.as_deref(), &mut taken)?;
            instance.set_uri(uri);
        }

        let update = builder.build_create_all(instances)?;
        self.executor.update(&update)?;
        info!(type_name = schema.type_name(), count = instances.len(), "created instances");
        Ok(())
    }

    /// Replaces the stored properties of `old` with those of `new`.
    pub fn update<T: SparqlResource>(&self, old: &T, new: &T) -> Result<()> {
        let schema = self.schema::<T>()?;
        let builder = self.builder(&schema);
        self.validate_instances(&builder, &[new])?;

        let plan = builder.build_update(old, new)?;
        if plan.is_empty() {
            return Ok(());
        }
        self.executor.update(&plan.to_update())?;
        debug!(type_name = schema.type_name(), deletes = plan.deletes.len(), inserts = plan.inserts.len(), "updated instance");
        Ok(())
    }

    pub fn delete<T: SparqlResource>(&self, uri: &NamedNode) -> Result<()> {
        let schema = self.schema::<T>()?;
        self.executor.update(&self.builder(&schema).build_delete(uri))?;
        info!(type_name = schema.type_name(), uri = uri.as_str(), "deleted instance");
        Ok(())
    }

    /// Scalar fields only; list fields are read through proxies.
    pub fn get_by_uri<T: SparqlResource>(&self, uri: &NamedNode) -> Result<Option<T>> {
        let schema = self.schema::<T>()?;
        let builder = self.builder(&schema);
        let rows = self.executor.select(&builder.build_select_by_uri(uri))?;
        rows.first().map(|row| builder.instance_from_row(row)).transpose()
    }

    /// Every instance of `T` with its list fields loaded.
    pub fn search<T: SparqlResource>(&self) -> Result<Vec<T>> {
        self.search_with(&SearchOptions::default())
    }

    /// Instances matching `options`, in the requested order.
    pub fn search_with<T: SparqlResource>(&self, options: &SearchOptions) -> Result<Vec<T>> {
        let schema = self.schema::<T>()?;
        let builder = self.builder(&schema);
        let rows = self.executor.select(&builder.build_select(options)?)?;
        Ok(builder.instances_from_rows(&rows))
    }

    pub fn count<T: SparqlResource>(&self) -> Result<usize> {
        self.count_with::<T>(&SearchOptions::default())
    }

    pub fn count_with<T: SparqlResource>(&self, options: &SearchOptions) -> Result<usize> {
        let schema = self.schema::<T>()?;
        let count = self.builder(&schema).build_count(options)?;
        let rows = self.executor.select(&count.query)?;
        count.total(&rows)
    }

    /// One page of matching instances and the total over all pages.
    pub fn search_with_pagination<T: SparqlResource>(&self, options: &SearchOptions) -> Result<Page<T>> {
        let total = self.count_with::<T>(options)?;
        let offset = options.offset.unwrap_or(0);
        let items = if total > offset {
            self.search_with(options)?
        } else {
            Vec::new()
        };
        debug!(total, offset, items = items.len(), "searched page");
        Ok(Page {
            items,
            total,
            limit: options.limit,
            offset,
        })
    }

    /// Instances of `uris` in the given order, fetched in one query.
    /// URIs that are not instances of `T` are skipped.
    pub fn get_list_by_uris<T: SparqlResource>(&self, uris: &[NamedNode]) -> Result<Vec<T>> {
        if uris.is_empty() {
            return Ok(Vec::new());
        }
        let schema = self.schema::<T>()?;
        let builder = self.builder(&schema);
        let rows = self.executor.select(&builder.build_select_by_uris(uris))?;

        let mut found: HashMap<String, T> = builder
            .instances_from_rows::<T>(&rows)
            .into_iter()
            .filter_map(|instance| {
                let key = instance.uri()?.as_str().to_string();
                Some((key, instance))
            })
            .collect();
        Ok(uris.iter().filter_map(|uri| found.remove(uri.as_str())).collect())
    }

    pub fn uri_exists<T: SparqlResource>(&self, uri: &NamedNode) -> Result<bool> {
        let schema = self.schema::<T>()?;
        self.executor.ask(&self.builder(&schema).build_ask(uri))
    }

    /// Fills the custom relations of `instance` with its unmapped predicates.
    pub fn load_relations<T: SparqlResource>(&self, instance: &mut T) -> Result<()> {
        let schema = self.schema::<T>()?;
        let builder = self.builder(&schema);
        let uri = instance
            .uri()
            .ok_or_else(|| MappingError::InvalidUri(format!("{} instance has no URI", schema.type_name())))?;
        let rows = self.executor.select(&builder.build_relations_select(uri))?;
        let relations = builder.relations_from_rows(&rows);
        if let Some(target) = instance.relations_mut() {
            *target = relations;
        }
        Ok(())
    }

    fn proxy_key(schema: &Schema, property: &PropertyMapping, owner: Option<&NamedNode>) -> Result<ProxyKey> {
        let owner = owner
            .ok_or_else(|| MappingError::InvalidUri(format!("{} instance has no URI", schema.type_name())))?
            .clone();
        Ok(ProxyKey {
            owner,
            predicate: property.predicate.clone(),
            direction: property.direction,
            graph: schema.graph().cloned(),
        })
    }

    /// Lazy list over a data list field of `instance`.
    pub fn data_list_proxy<T: SparqlResource>(&self, instance: &T, field: &str) -> Result<SparqlProxyList<FieldValue>> {
        let schema = self.schema::<T>()?;
        let property = schema
            .property(field)
            .ok_or_else(|| MappingError::UnknownField(field.to_string()))?;
        if property.is_object() {
            return Err(MappingError::InvalidFieldValue(format!("{} is an object field", field)));
        }
        Ok(SparqlProxyList::data(Self::proxy_key(&schema, property, instance.uri())?))
    }

    /// Lazy list over an object field of `instance` whose target is `U`.
    pub fn object_list_proxy<T: SparqlResource, U: SparqlResource>(
        &self,
        instance: &T,
        field: &str,
    ) -> Result<SparqlProxyList<U>> {
        let schema = self.schema::<T>()?;
        let target = self.schema::<U>()?;
        let property = schema
            .property(field)
            .ok_or_else(|| MappingError::UnknownField(field.to_string()))?;
        if property.target_class() != Some(target.rdf_type()) {
            return Err(MappingError::InvalidFieldValue(format!(
                "{} does not reference {}",
                field,
                target.type_name()
            )));
        }
        Ok(SparqlProxyList::objects(Self::proxy_key(&schema, property, instance.uri())?, target))
    }

    /// Validates raw resources as one batch, filling their relations and names.
    pub fn validate_resources(&self, models: &mut [ResourceModel]) -> Result<ValidationReport> {
        let mut seen = HashMap::new();
        let mut validator = self.validator();
        for model in models.iter_mut() {
            let restrictions = self.class_restrictions(&mut seen, &model.rdf_type)?;
            validator.validate_model(&restrictions, model);
        }
        validator.finish()
    }

    /// Validates and inserts raw resources; nothing is written unless the
    /// whole batch is valid.
    pub fn create_resources(&self, models: &mut [ResourceModel], graph: Option<&NamedNode>) -> Result<ValidationReport> {
        let report = Self::check_report(self.validate_resources(models)?)?;

        let mut taken = HashSet::new();
        for model in models.iter_mut() {
            let uri = self.resolve_uri(model.uri.as_ref(), &model.rdf_type, model.name.as_deref(), &mut taken)?;
            model.uri = Some(uri);
        }

        self.executor.update(&build_resource_insert(models, graph)?)?;
        info!(count = models.len(), "created resources");
        Ok(report)
    }
}
