//! Integration tests for the mapping service
//!
//! Tests complete round trips against an in-memory store:
//! - Create, read back, search and count
//! - Update with list replacement
//! - Delete including reverse links
//! - Relations and lazy lists

#[path = "../common/mod.rs"]
mod common;

use common::*;
use sparql_orm::{
    vocab, MappingConfig, MappingError, Page, QueryExecutor, Relation, ResourceModel, SearchOptions, SparqlQuery,
    SparqlResource, ValidationErrorKind,
};

/// Test: Created plants read back field for field
///
/// Verifies that a plant created without a URI receives one under the
/// configured base, and that every scalar and list field survives the
/// round trip through the store.
#[test]
fn test_create_and_read_back() {
    let service = service();
    let mut created = plant("Plant 9", "maize");
    created.sowing_date = Some("2024-05-02".to_string());
    created.notes = vec!["greenhouse".to_string(), "bench 4".to_string()];

    service.create(&mut created).unwrap();
    let uri = created.uri().cloned().unwrap();
    assert_eq!(uri.as_str(), "http://opensilex.dev/id/plant/plant-9");

    let stored: Plant = service
        .search::<Plant>()
        .unwrap()
        .into_iter()
        .find(|p| p.uri.as_ref() == Some(&uri))
        .unwrap();
    assert_eq!(stored.name.as_deref(), Some("Plant 9"));
    assert_eq!(stored.species, Some(id("maize")));
    assert_eq!(stored.sowing_date.as_deref(), Some("2024-05-02"));
    let mut notes = stored.notes.clone();
    notes.sort();
    assert_eq!(notes, vec!["bench 4".to_string(), "greenhouse".to_string()]);
    assert_eq!(stored.rdf_type, Some(node(PLANT)));
}

#[test]
fn test_create_batch_in_one_request() {
    let executor = std::sync::Arc::new(CountingExecutor::new(loaded_store()));
    let service = sparql_orm::SparqlService::over_store(executor.clone(), MappingConfig::default()).unwrap();

    let mut plants = vec![plant("A", "maize"), plant("B", "wheat"), plant("C", "maize")];
    service.create_all(&mut plants).unwrap();

    assert_eq!(executor.updates(), 1);
    assert!(plants.iter().all(|p| p.uri.is_some()));
    assert_eq!(service.count::<Plant>().unwrap(), 6);
}

#[test]
fn test_missing_label_fails_validation() {
    let service = service();
    let mut species = Species {
        uri: Some(id("rice")),
        ..Species::default()
    };

    // validation reports the missing label before anything is written
    match service.create(&mut species) {
        Err(MappingError::Validation(report)) => assert_eq!(report.nb_error(), 1),
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(service.count::<Species>().unwrap(), 2);
}

#[test]
fn test_subclass_instances_are_found() {
    let service = service();
    let plants: Vec<Plant> = service.search().unwrap();
    assert_eq!(plants.len(), 3);

    let tree = plants.iter().find(|p| p.uri == Some(id("plant2"))).unwrap();
    assert_eq!(tree.rdf_type, Some(node(TREE)));

    assert!(service.uri_exists::<Plant>(&id("plant2")).unwrap());
    assert!(!service.uri_exists::<Plant>(&id("maize")).unwrap());
}

#[test]
fn test_reverse_list_is_loaded() {
    let service = service();
    let plants: Vec<Plant> = service.search().unwrap();
    let parent = plants.iter().find(|p| p.uri == Some(id("plant1"))).unwrap();

    let mut children = parent.children.clone();
    children.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    assert_eq!(children, vec![id("plant2"), id("plant3")]);
}

/// Test: Updating replaces scalar values and whole lists
#[test]
fn test_update_replaces_values() {
    let service = service();
    let old: Plant = service
        .search::<Plant>()
        .unwrap()
        .into_iter()
        .find(|p| p.uri == Some(id("plant1")))
        .unwrap();

    let mut new = old.clone();
    new.species = Some(id("wheat"));
    new.sowing_date = None;
    new.notes = vec!["moved".to_string()];
    service.update(&old, &new).unwrap();

    let stored: Plant = service
        .search::<Plant>()
        .unwrap()
        .into_iter()
        .find(|p| p.uri == Some(id("plant1")))
        .unwrap();
    assert_eq!(stored.species, Some(id("wheat")));
    assert_eq!(stored.sowing_date, None);
    assert_eq!(stored.notes, vec!["moved".to_string()]);
    assert_eq!(stored.children.len(), 2);
}

#[test]
fn test_update_rejects_unknown_species() {
    let service = service();
    let old: Plant = service.get_by_uri(&id("plant3")).unwrap().unwrap();
    let mut new = old.clone();
    new.species = Some(id("oak"));

    assert!(matches!(service.update(&old, &new), Err(MappingError::Validation(_))));
    let stored: Plant = service.get_by_uri(&id("plant3")).unwrap().unwrap();
    assert_eq!(stored.species, Some(id("maize")));
}

#[test]
fn test_delete_removes_reverse_links() {
    let service = service();
    service.delete::<Plant>(&id("plant1")).unwrap();

    assert!(service.get_by_uri::<Plant>(&id("plant1")).unwrap().is_none());
    let mut plant2: Plant = service.get_by_uri(&id("plant2")).unwrap().unwrap();
    service.load_relations(&mut plant2).unwrap();
    assert!(plant2.relations.iter().all(|r| r.property.as_str() != HAS_PARENT));
}

#[test]
fn test_relations_hold_unmapped_predicates() {
    let service = service();
    let mut tree: Plant = service.get_by_uri(&id("plant2")).unwrap().unwrap();
    service.load_relations(&mut tree).unwrap();

    assert_eq!(tree.relations.len(), 2);
    assert!(tree
        .relations
        .contains(&Relation::resource(node(HAS_PARENT), &id("plant1"))));
    assert!(tree
        .relations
        .contains(&Relation::literal(node(HAS_HEIGHT), "1.85", node(vocab::XSD_DECIMAL))));
}

#[test]
fn test_lazy_lists() {
    let service = service();
    let parent: Plant = service.get_by_uri(&id("plant1")).unwrap().unwrap();
    assert!(parent.notes.is_empty());

    let mut notes = service.data_list_proxy(&parent, "notes").unwrap();
    assert!(!notes.is_loaded());
    let values: Vec<&str> = notes
        .resolve(service.executor())
        .unwrap()
        .iter()
        .filter_map(|v| v.lexical())
        .collect();
    assert_eq!(values, vec!["north plot", "row 3"]);

    let mut children = service.object_list_proxy::<Plant, Plant>(&parent, "children").unwrap();
    let children = children.resolve(service.executor()).unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].name.as_deref(), Some("Plant 2"));
}

#[test]
fn test_raw_resource_import() {
    let service = service();
    let mut imported = ResourceModel::new(node(PLANT));
    imported
        .assert(node(vocab::RDFS_LABEL), "Imported plant")
        .assert(node(FROM_SPECIES), id("wheat").as_str())
        .assert(node(HAS_HEIGHT), "0.4");
    let mut models = vec![imported];

    service.create_resources(&mut models, None).unwrap();
    assert_eq!(models[0].name.as_deref(), Some("Imported plant"));

    let stored: Plant = service.get_by_uri(models[0].uri.as_ref().unwrap()).unwrap().unwrap();
    assert_eq!(stored.name.as_deref(), Some("Imported plant"));
    assert_eq!(stored.species, Some(id("wheat")));
}

/// Test: An anyURI cell of an import is stored as a resource
///
/// Verifies that the imported value becomes an IRI object in the store and
/// reads back through a mapped anyURI field.
#[test]
fn test_any_uri_import_round_trip() {
    let service = service();
    let reference = "https://www.gbif.org/species/4584";
    let mut imported = ResourceModel::new(node(SPECIES)).with_uri(id("sorghum"));
    imported
        .assert(node(vocab::RDFS_LABEL), "Sorghum bicolor")
        .assert(node(HAS_REFERENCE), reference);
    let mut models = vec![imported];

    let report = service.create_resources(&mut models, None).unwrap();
    assert!(report.is_valid(), "{}", report);

    let ask = SparqlQuery::new(format!("ASK {{ <{}> <{}> <{}> }}", id("sorghum").as_str(), HAS_REFERENCE, reference));
    assert!(service.executor().ask(&ask).unwrap());

    let stored: Species = service.get_by_uri(&id("sorghum")).unwrap().unwrap();
    assert_eq!(stored.name.as_deref(), Some("Sorghum bicolor"));
    assert_eq!(stored.reference.as_deref(), Some(reference));

    let maize: Species = service.get_by_uri(&id("maize")).unwrap().unwrap();
    assert_eq!(maize.reference.as_deref(), Some("https://www.gbif.org/species/5290052"));
}

/// Test: A malformed anyURI cell rejects the import
#[test]
fn test_any_uri_import_rejects_malformed_value() {
    let service = service();
    let mut imported = ResourceModel::new(node(SPECIES)).with_uri(id("millet"));
    imported
        .assert(node(vocab::RDFS_LABEL), "Pennisetum glaucum")
        .assert(node(HAS_REFERENCE), "gbif species 5290052");
    let mut models = vec![imported];

    match service.create_resources(&mut models, None) {
        Err(MappingError::Validation(report)) => {
            assert_eq!(report.nb_error(), 1, "{}", report);
            assert_eq!(report.errors()[0].kind, ValidationErrorKind::InvalidUri);
        }
        other => panic!("expected a validation failure, got {:?}", other),
    }
    assert!(!service.uri_exists::<Species>(&id("millet")).unwrap());
}

/// Test: Paged search over a class hierarchy
///
/// Verifies that pages are cut on instances, that subclass instances are
/// included and that the total ignores paging.
#[test]
fn test_paginated_search() {
    let service = service();
    let first: Page<Plant> = service
        .search_with_pagination(&SearchOptions::new().asc("name").page(0, 2))
        .unwrap();

    assert_eq!(first.total, 3);
    let names: Vec<_> = first.items.iter().filter_map(|p| p.name.as_deref()).collect();
    assert_eq!(names, vec!["Plant 1", "Plant 2"]);
    assert_eq!(first.items[0].notes.len(), 2);
    assert_eq!(first.items[0].children.len(), 2);
    assert!(first.has_next());

    let second: Page<Plant> = service
        .search_with_pagination(&SearchOptions::new().asc("name").page(1, 2))
        .unwrap();
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].uri, Some(id("plant3")));
    assert!(!second.has_next());
}

#[test]
fn test_filtered_search_and_count() {
    let service = service();
    let options = SearchOptions::new().equals("species", id("maize")).desc("name");

    let plants: Vec<Plant> = service.search_with(&options).unwrap();
    let uris: Vec<_> = plants.iter().filter_map(|p| p.uri.clone()).collect();
    assert_eq!(uris, vec![id("plant3"), id("plant1")]);
    assert_eq!(service.count_with::<Plant>(&options).unwrap(), 2);
}

#[test]
fn test_get_list_by_uris_keeps_input_order() {
    let service = service();
    let plants: Vec<Plant> = service
        .get_list_by_uris(&[id("plant3"), id("unknown"), id("maize"), id("plant1")])
        .unwrap();

    let uris: Vec<_> = plants.iter().filter_map(|p| p.uri.clone()).collect();
    assert_eq!(uris, vec![id("plant3"), id("plant1")]);
    assert_eq!(plants[1].notes.len(), 2);
}
