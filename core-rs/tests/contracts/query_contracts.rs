//! Query Generation Contract Tests
//!
//! These tests pin INVARIANTS of the mapping engine that callers rely on:
//! stable query text, one request per batch, bounded existence checks and
//! lazy lists that load once.
//!
//! Each test names what breaks downstream when it fails.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use common::*;
use sparql_orm::{
    analyze, vocab, ClassQueryBuilder, MappingConfig, MappingError, OwlRestrictionValidator, QueryExecutor,
    ResourceModel, RestrictionStore, SchemaCache, SearchOptions, SparqlRestrictionStore, SparqlService,
};

fn counting_service() -> (
    Arc<CountingExecutor<sparql_orm::OxigraphExecutor>>,
    SparqlService<Arc<CountingExecutor<sparql_orm::OxigraphExecutor>>>,
) {
    let executor = Arc::new(CountingExecutor::new(loaded_store()));
    let service = SparqlService::over_store(executor.clone(), MappingConfig::default()).unwrap();
    (executor, service)
}

fn sorted(mut plants: Vec<Plant>) -> Vec<Plant> {
    for plant in &mut plants {
        plant.notes.sort();
        plant.children.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    }
    plants.sort_by(|a, b| a.uri.as_ref().map(|u| u.as_str()).cmp(&b.uri.as_ref().map(|u| u.as_str())));
    plants
}

/// GUARANTEE: Analysing a type twice yields the same schema
/// BREAKS: Cached and freshly analysed schemas would generate different queries
#[test]
fn schema_analysis_is_deterministic() {
    assert_eq!(analyze::<Plant>().unwrap(), analyze::<Plant>().unwrap());

    let cache = SchemaCache::new();
    let first = cache.get::<Plant>().unwrap();
    let second = cache.get::<Plant>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(*first, analyze::<Plant>().unwrap());
}

/// GUARANTEE: Query text depends only on the schema, properties in declaration order
/// BREAKS: Logged queries stop being comparable across runs
#[test]
fn generated_text_is_stable() {
    let a = analyze::<Plant>().unwrap();
    let b = analyze::<Plant>().unwrap();
    let (a, b) = (ClassQueryBuilder::new(&a), ClassQueryBuilder::new(&b));

    let all = SearchOptions::default();
    let paged = SearchOptions::new().regex("name", "plant").desc("sowingDate").page(1, 2);

    assert_eq!(a.build_select(&all).unwrap(), b.build_select(&all).unwrap());
    assert_eq!(a.build_select(&paged).unwrap(), b.build_select(&paged).unwrap());
    assert_eq!(a.build_count(&all).unwrap(), b.build_count(&all).unwrap());
    assert_eq!(a.build_ask(&id("plant1")), b.build_ask(&id("plant1")));
    assert_eq!(a.build_delete(&id("plant1")), b.build_delete(&id("plant1")));

    let select = a.build_select(&all).unwrap();
    let text = select.as_str();
    let positions: Vec<usize> = [vocab::RDFS_LABEL, FROM_SPECIES, HAS_SOWING_DATE, vocab::RDFS_COMMENT, HAS_PARENT]
        .iter()
        .map(|iri| text.find(&format!("<{}>", iri)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", text);
}

/// GUARANTEE: Count equals the number of instances search returns
/// BREAKS: Pagination totals drift from the listed rows
#[test]
fn count_matches_search() {
    let service = service();
    assert_eq!(service.count::<Species>().unwrap(), service.search::<Species>().unwrap().len());
    assert_eq!(service.count::<Plant>().unwrap(), service.search::<Plant>().unwrap().len());
    assert_eq!(service.count::<Plant>().unwrap(), 3);
}

/// GUARANTEE: A filtered count equals the number of instances the same filtered search returns
/// BREAKS: Paged listings would report totals that disagree with their pages
#[test]
fn filtered_count_matches_filtered_search() {
    let service = service();
    let filters = [
        SearchOptions::new().regex("name", "^plant [12]$"),
        SearchOptions::new().equals("species", id("wheat")),
        SearchOptions::new().regex("notes", "north"),
        SearchOptions::new().regex("name", "no such plant"),
    ];
    for options in &filters {
        let found = service.search_with::<Plant>(options).unwrap().len();
        assert_eq!(service.count_with::<Plant>(options).unwrap(), found, "{:?}", options);
    }
}

/// GUARANTEE: Looking up a list of URIs is a single select
/// BREAKS: Resolving references of a page would cost one query per reference
#[test]
fn list_by_uris_is_one_query() {
    let (executor, service) = counting_service();
    let before = executor.selects();
    let plants: Vec<Plant> = service
        .get_list_by_uris(&[id("plant1"), id("plant2"), id("plant3")])
        .unwrap();
    assert_eq!(plants.len(), 3);
    assert_eq!(executor.selects(), before + 1);
}

/// GUARANTEE: Applying the same update twice leaves the store as after the first
/// BREAKS: Retried requests would duplicate list values
#[test]
fn update_is_idempotent() {
    let service = service();
    let old: Plant = service.get_by_uri(&id("plant3")).unwrap().unwrap();
    let mut new = old.clone();
    new.notes = vec!["staked".to_string(), "watered".to_string()];

    service.update(&old, &new).unwrap();
    let once = sorted(service.search::<Plant>().unwrap());
    service.update(&old, &new).unwrap();
    let twice = sorted(service.search::<Plant>().unwrap());

    assert_eq!(once, twice);
    assert_eq!(service.count::<Plant>().unwrap(), 3);
}

/// GUARANTEE: A batch create is a single update request
/// BREAKS: A failure mid-batch would leave a partial import behind
#[test]
fn batch_create_is_one_request() {
    let (executor, service) = counting_service();
    let mut plants: Vec<Plant> = (0..4).map(|i| plant(&format!("Seedling {}", i), "wheat")).collect();
    service.create_all(&mut plants).unwrap();
    assert_eq!(executor.updates(), 1);
}

/// GUARANTEE: An invalid batch touches nothing, not even URI checks
/// BREAKS: Rejected imports would still cost store round trips or writes
#[test]
fn invalid_batch_writes_nothing() {
    let (executor, service) = counting_service();
    let mut plants = vec![plant("Good", "maize"), plant("Orphan", "teosinte")];

    assert!(matches!(service.create_all(&mut plants), Err(MappingError::Validation(_))));
    assert_eq!(executor.updates(), 0);
    assert_eq!(executor.asks(), 0);
    assert!(plants.iter().all(|p| p.uri.is_none()));
}

/// GUARANTEE: Existence checks cost at most one query per referenced class
/// BREAKS: Large imports would issue one query per reference
#[test]
fn existence_checks_are_batched_per_class() {
    let store = SparqlRestrictionStore::new(loaded_store());
    let restrictions = store.class_restrictions(&node(PLANT), true).unwrap();
    let executor = CountingExecutor::new(loaded_store());

    let mut validator = OwlRestrictionValidator::new(&executor as &dyn QueryExecutor);
    for i in 0..20 {
        let mut row = ResourceModel::new(node(PLANT)).with_uri(id(&format!("bulk{}", i)));
        row.assert(node(vocab::RDFS_LABEL), format!("Bulk {}", i))
            .assert(node(FROM_SPECIES), id(if i % 2 == 0 { "maize" } else { "wheat" }).as_str())
            .assert(node(HAS_PARENT), id("plant1").as_str());
        validator.validate_model(&restrictions, &mut row);
    }
    let report = validator.finish().unwrap();

    assert!(report.is_valid(), "{}", report);
    assert_eq!(executor.selects(), 2);
}

/// GUARANTEE: A lazy list runs its query once, on first access
/// BREAKS: Iterating a relation repeatedly would hammer the store
#[test]
fn lazy_list_loads_once() {
    let (executor, service) = counting_service();
    let parent: Plant = service.get_by_uri(&id("plant1")).unwrap().unwrap();
    let mut children = service.object_list_proxy::<Plant, Plant>(&parent, "children").unwrap();

    let before = executor.selects();
    assert!(children.get().is_none());
    assert_eq!(children.resolve(service.executor()).unwrap().len(), 2);
    assert_eq!(children.resolve(service.executor()).unwrap().len(), 2);
    assert_eq!(executor.selects(), before + 1);
}
