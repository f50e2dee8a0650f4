use fishy_core::db::open_db_in_memory;
use fishy_core::{
    validate_fish_data, CatalogService, CatalogServiceError, FishChangeOutcome, FishPayload,
    FishRepository, NewFishOutcome, SqliteFishRepository, SqliteSpeciesRepository,
};
use rusqlite::Connection;
use serde_json::json;

type SqliteCatalog<'conn> =
    CatalogService<SqliteSpeciesRepository<'conn>, SqliteFishRepository<'conn>>;

fn service(conn: &Connection) -> SqliteCatalog<'_> {
    CatalogService::new(
        SqliteSpeciesRepository::try_new(conn).unwrap(),
        SqliteFishRepository::try_new(conn).unwrap(),
    )
}

fn chinook() -> FishPayload {
    FishPayload::from_json(&json!({
        "name": "Chinook",
        "description": "Large",
        "habitat": "Pacific",
    }))
}

#[test]
fn new_fish_appears_on_species_page() {
    let conn = open_db_in_memory().unwrap();
    let catalog = service(&conn);
    let salmon = catalog.add_species("salmon", "Salmon").unwrap();
    assert_eq!(salmon.id, "salmon");
    assert_eq!(salmon.name, "Salmon");

    let fish = match catalog.submit_new_fish("salmon", chinook()).unwrap() {
        NewFishOutcome::Created(fish) => fish,
        other => panic!("unexpected outcome: {other:?}"),
    };

    let page = catalog.species_page("salmon").unwrap().unwrap();
    assert_eq!(page.fishes, vec![fish]);

    let index = catalog.species_index().unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index[0].id, "salmon");
}

#[test]
fn unknown_species_wins_over_invalid_payload() {
    let conn = open_db_in_memory().unwrap();
    let catalog = service(&conn);

    let outcome = catalog
        .submit_new_fish("nonexistent", FishPayload::default())
        .unwrap();
    assert_eq!(outcome, NewFishOutcome::SpeciesNotFound);
    assert!(catalog.species_page("nonexistent").unwrap().is_none());
}

#[test]
fn invalid_new_fish_is_echoed_back_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let catalog = service(&conn);
    catalog.add_species("salmon", "Salmon").unwrap();

    let payload = FishPayload::from_json(&json!({
        "name": "",
        "description": "ok",
        "habitat": "ok",
    }));
    match catalog.submit_new_fish("salmon", payload.clone()).unwrap() {
        NewFishOutcome::Rejected(rejected) => {
            assert_eq!(rejected.errors, validate_fish_data(&payload));
            assert_eq!(rejected.errors.len(), 1);
            assert!(rejected.errors[0].contains("'name'"));
            assert_eq!(rejected.payload, payload);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let page = catalog.species_page("salmon").unwrap().unwrap();
    assert!(page.fishes.is_empty());
}

#[test]
fn edit_form_requires_fish_of_that_species() {
    let conn = open_db_in_memory().unwrap();
    let catalog = service(&conn);
    catalog.add_species("salmon", "Salmon").unwrap();
    catalog.add_species("carp", "Carp").unwrap();
    let NewFishOutcome::Created(fish) = catalog.submit_new_fish("salmon", chinook()).unwrap()
    else {
        panic!("fish should be created");
    };

    let form = catalog.edit_fish_form("salmon", fish.id).unwrap().unwrap();
    assert_eq!(form.fish, fish);
    assert_eq!(form.species.id, "salmon");

    assert!(catalog.edit_fish_form("carp", fish.id).unwrap().is_none());
    assert!(catalog.edit_fish_form("salmon", fish.id + 1).unwrap().is_none());
    assert!(catalog.edit_fish_form("pike", fish.id).unwrap().is_none());
}

#[test]
fn edit_submission_replaces_fields() {
    let conn = open_db_in_memory().unwrap();
    let catalog = service(&conn);
    catalog.add_species("salmon", "Salmon").unwrap();
    let NewFishOutcome::Created(fish) = catalog.submit_new_fish("salmon", chinook()).unwrap()
    else {
        panic!("fish should be created");
    };

    let payload = FishPayload::from_pairs([
        ("name", "King"),
        ("description", "Very large"),
        ("habitat", "North Pacific"),
    ]);
    let outcome = catalog
        .submit_fish_edit("salmon", fish.id, payload)
        .unwrap();
    assert_eq!(outcome, FishChangeOutcome::Applied(1));

    let stored = SqliteFishRepository::try_new(&conn)
        .unwrap()
        .get_fish(fish.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "King");
    assert_eq!(stored.habitat, "North Pacific");
}

#[test]
fn edit_submission_is_validated_and_scoped_to_species() {
    let conn = open_db_in_memory().unwrap();
    let catalog = service(&conn);
    catalog.add_species("salmon", "Salmon").unwrap();
    catalog.add_species("carp", "Carp").unwrap();
    let NewFishOutcome::Created(fish) = catalog.submit_new_fish("salmon", chinook()).unwrap()
    else {
        panic!("fish should be created");
    };

    let partial = FishPayload::from_pairs([("name", "King")]);
    match catalog.submit_fish_edit("salmon", fish.id, partial).unwrap() {
        FishChangeOutcome::Rejected(rejected) => {
            assert_eq!(
                rejected.errors,
                vec!["missing field 'description'", "missing field 'habitat'"]
            );
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert_eq!(
        catalog.submit_fish_edit("carp", fish.id, chinook()).unwrap(),
        FishChangeOutcome::FishNotFound
    );
    assert_eq!(
        catalog.submit_fish_edit("pike", fish.id, chinook()).unwrap(),
        FishChangeOutcome::SpeciesNotFound
    );
    assert_eq!(
        catalog.submit_fish_edit("salmon", 9999, chinook()).unwrap(),
        FishChangeOutcome::FishNotFound
    );
}

#[test]
fn delete_removes_fish_from_species_page() {
    let conn = open_db_in_memory().unwrap();
    let catalog = service(&conn);
    catalog.add_species("salmon", "Salmon").unwrap();
    catalog.add_species("carp", "Carp").unwrap();
    let NewFishOutcome::Created(fish) = catalog.submit_new_fish("salmon", chinook()).unwrap()
    else {
        panic!("fish should be created");
    };

    assert_eq!(
        catalog.delete_fish("carp", fish.id).unwrap(),
        FishChangeOutcome::FishNotFound
    );
    assert_eq!(
        catalog.delete_fish("pike", fish.id).unwrap(),
        FishChangeOutcome::SpeciesNotFound
    );
    assert_eq!(
        catalog.delete_fish("salmon", fish.id).unwrap(),
        FishChangeOutcome::Applied(1)
    );
    assert!(catalog
        .species_page("salmon")
        .unwrap()
        .unwrap()
        .fishes
        .is_empty());
    assert_eq!(
        catalog.delete_fish("salmon", fish.id).unwrap(),
        FishChangeOutcome::FishNotFound
    );
}

#[test]
fn duplicate_species_maps_to_service_error() {
    let conn = open_db_in_memory().unwrap();
    let catalog = service(&conn);
    catalog.add_species("salmon", "Salmon").unwrap();

    let err = catalog.add_species("salmon", "Salmon again").unwrap_err();
    assert!(matches!(err, CatalogServiceError::DuplicateSpecies(ref id) if id == "salmon"));
    assert_eq!(err.to_string(), "species already exists: salmon");
}
