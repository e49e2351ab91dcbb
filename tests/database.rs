//! Integration tests against a live PostgreSQL instance.
//!
//! Each test opens its own connection and wraps itself in a test
//! transaction, so nothing is ever committed. They are ignored by default;
//! run them with `cargo test -- --ignored` against a database that has the
//! migrations applied (`diesel migration run`), with `DATABASE_URL` set.

use diesel::prelude::*;

use recipe_manager::database::connection::establish_connection;
use recipe_manager::database::models::ingredient::Ingredient;
use recipe_manager::error::{Error, FormsetError, ValidationError};
use recipe_manager::forms::formset::PREFIX;
use recipe_manager::forms::FormData;
use recipe_manager::service;

fn connection() -> PgConnection {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut connection = establish_connection();
    connection.begin_test_transaction().unwrap();
    connection
}

fn set_recipe_fields(data: &mut FormData, name: &str) {
    data.set("name", name);
    data.set("description", "");
    data.set("instructions", "Mix");
    data.set("prep_time", "10");
    data.set("cook_time", "15");
    data.set("servings", "4");
}

fn set_management(data: &mut FormData, total: usize, initial: usize) {
    data.set(format!("{PREFIX}-TOTAL_FORMS"), total.to_string());
    data.set(format!("{PREFIX}-INITIAL_FORMS"), initial.to_string());
    data.set(format!("{PREFIX}-MIN_NUM_FORMS"), "1");
    data.set(format!("{PREFIX}-MAX_NUM_FORMS"), "1000");
}

fn set_row(data: &mut FormData, index: usize, id: &str, name: &str, quantity: &str) {
    data.set(format!("{PREFIX}-{index}-id"), id);
    data.set(format!("{PREFIX}-{index}-ingredient_name"), name);
    data.set(format!("{PREFIX}-{index}-quantity"), quantity);
}

/// Submission creating a recipe with the given (ingredient, quantity) rows.
fn new_recipe_submission(name: &str, rows: &[(&str, &str)]) -> FormData {
    let mut data = FormData::new();
    set_recipe_fields(&mut data, name);
    set_management(&mut data, rows.len(), 0);
    for (index, (ingredient, quantity)) in rows.iter().enumerate() {
        set_row(&mut data, index, "", ingredient, quantity);
    }
    data
}

#[test]
#[ignore = "requires PostgreSQL (set DATABASE_URL, run migrations)"]
fn create_recipe_normalizes_and_persists_ingredients() {
    let mut connection = connection();

    let data = new_recipe_submission("Pancakes", &[("milk", "2 dl")]);
    let recipe = service::create_recipe(&mut connection, &data).unwrap();

    assert_eq!(recipe.name, "Pancakes");
    assert_eq!(recipe.prep_time, 10);
    assert_eq!(recipe.cook_time, 15);
    assert_eq!(recipe.total_time(), 25);
    assert_eq!(recipe.servings, 4);

    let detail = service::recipe_detail(&mut connection, recipe.id).unwrap();
    assert_eq!(detail.ingredients.len(), 1);
    let (association, ingredient) = &detail.ingredients[0];
    assert_eq!(ingredient.name, "Milk");
    assert_eq!(association.quantity, "2 dl");
}

#[test]
#[ignore = "requires PostgreSQL (set DATABASE_URL, run migrations)"]
fn blank_recipe_name_persists_nothing() {
    let mut connection = connection();
    let before = service::list_recipes(&mut connection).unwrap().len();

    let data = new_recipe_submission("   ", &[("Milk", "2 dl")]);
    let error = service::create_recipe(&mut connection, &data).unwrap_err();

    match error {
        Error::Invalid(errors) => {
            assert_eq!(errors.recipe["name"], vec![ValidationError::EmptyField]);
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert_eq!(service::list_recipes(&mut connection).unwrap().len(), before);
    assert!(service::ingredient_suggestions(&mut connection, "Milk")
        .unwrap()
        .is_empty());
}

#[test]
#[ignore = "requires PostgreSQL (set DATABASE_URL, run migrations)"]
fn round_trip_preserves_every_submitted_row() {
    let mut connection = connection();

    let rows = [("Flour", "4 dl"), ("Milk", "2 dl"), ("Egg", "2")];
    let data = new_recipe_submission("Pancakes", &rows);
    let recipe = service::create_recipe(&mut connection, &data).unwrap();

    let detail = service::recipe_detail(&mut connection, recipe.id).unwrap();
    assert_eq!(detail.ingredients.len(), rows.len());
    for ((association, ingredient), (name, quantity)) in detail.ingredients.iter().zip(rows) {
        assert_eq!(ingredient.name, name);
        assert_eq!(association.quantity, quantity);
    }
}

#[test]
#[ignore = "requires PostgreSQL (set DATABASE_URL, run migrations)"]
fn resolving_the_same_name_twice_yields_one_identity() {
    let mut connection = connection();

    let first = Ingredient::get_or_create(&mut connection, "Milk").unwrap();
    let second = Ingredient::get_or_create(&mut connection, "Milk").unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(
        service::ingredient_suggestions(&mut connection, "Milk").unwrap(),
        vec!["Milk".to_owned()]
    );
}

#[test]
#[ignore = "requires PostgreSQL (set DATABASE_URL, run migrations)"]
fn editing_reconciles_update_delete_and_create() {
    let mut connection = connection();

    let data = new_recipe_submission("Pancakes", &[("Milk", "2 dl"), ("Sugar", "1 dl")]);
    let recipe = service::create_recipe(&mut connection, &data).unwrap();
    let detail = service::recipe_detail(&mut connection, recipe.id).unwrap();
    let milk_row = &detail.ingredients[0].0;
    let sugar_row = &detail.ingredients[1].0;

    let mut edit = FormData::new();
    set_recipe_fields(&mut edit, "Pancakes deluxe");
    set_management(&mut edit, 3, 2);
    set_row(&mut edit, 0, &milk_row.id.to_string(), "Milk", "3 dl");
    set_row(&mut edit, 1, &sugar_row.id.to_string(), "Sugar", "1 dl");
    edit.set(format!("{PREFIX}-1-DELETE"), "on");
    set_row(&mut edit, 2, "", "butter", "50 g");

    let updated = service::edit_recipe(&mut connection, recipe.id, &edit).unwrap();
    assert_eq!(updated.name, "Pancakes deluxe");
    assert_eq!(updated.created_at, recipe.created_at);
    assert!(updated.updated_at >= recipe.updated_at);

    let detail = service::recipe_detail(&mut connection, recipe.id).unwrap();
    let mut rows: Vec<(&str, &str)> = detail
        .ingredients
        .iter()
        .map(|(association, ingredient)| (ingredient.name.as_str(), association.quantity.as_str()))
        .collect();
    rows.sort();
    assert_eq!(rows, vec![("Butter", "50 g"), ("Milk", "3 dl")]);
}

#[test]
#[ignore = "requires PostgreSQL (set DATABASE_URL, run migrations)"]
fn deleting_the_only_row_leaves_the_association_untouched() {
    let mut connection = connection();

    let data = new_recipe_submission("Porridge", &[("Oats", "1 dl")]);
    let recipe = service::create_recipe(&mut connection, &data).unwrap();
    let detail = service::recipe_detail(&mut connection, recipe.id).unwrap();
    let oats_row = &detail.ingredients[0].0;

    let mut edit = FormData::new();
    set_recipe_fields(&mut edit, "Porridge");
    set_management(&mut edit, 1, 1);
    set_row(&mut edit, 0, &oats_row.id.to_string(), "Oats", "1 dl");
    edit.set(format!("{PREFIX}-0-DELETE"), "on");

    let error = service::edit_recipe(&mut connection, recipe.id, &edit).unwrap_err();
    match error {
        Error::Invalid(errors) => {
            assert_eq!(
                errors.ingredients.set,
                vec![FormsetError::BelowMinimumRows { required: 1, got: 0 }]
            );
        }
        other => panic!("expected validation failure, got {other:?}"),
    }

    let detail = service::recipe_detail(&mut connection, recipe.id).unwrap();
    assert_eq!(detail.ingredients.len(), 1);
    assert_eq!(detail.ingredients[0].0.quantity, "1 dl");
}

#[test]
#[ignore = "requires PostgreSQL (set DATABASE_URL, run migrations)"]
fn duplicate_rows_in_one_submission_fail_together() {
    let mut connection = connection();
    let before = service::list_recipes(&mut connection).unwrap().len();

    let data = new_recipe_submission("Omelette", &[("Egg", "2"), ("egg", "3")]);
    let error = service::create_recipe(&mut connection, &data).unwrap_err();

    match error {
        Error::Invalid(errors) => {
            assert_eq!(
                errors.ingredients.rows[&1]["ingredient_name"],
                vec![ValidationError::DuplicateAssociation]
            );
        }
        other => panic!("expected validation failure, got {other:?}"),
    }

    // Whole-submission failure: no recipe, no ingredient rows.
    assert_eq!(service::list_recipes(&mut connection).unwrap().len(), before);
    assert!(service::ingredient_suggestions(&mut connection, "Egg")
        .unwrap()
        .is_empty());
}

#[test]
#[ignore = "requires PostgreSQL (set DATABASE_URL, run migrations)"]
fn storage_level_duplicate_is_reported_and_rolled_back() {
    let mut connection = connection();

    let data = new_recipe_submission("Toast", &[("Bread", "2 slices"), ("Butter", "10 g")]);
    let recipe = service::create_recipe(&mut connection, &data).unwrap();
    let detail = service::recipe_detail(&mut connection, recipe.id).unwrap();
    let bread_row = &detail.ingredients[0].0;

    // Point the bread row at Butter, which another association already
    // references. The submission itself has no duplicates, so only the
    // unique index can catch this.
    let mut edit = FormData::new();
    set_recipe_fields(&mut edit, "Toast");
    set_management(&mut edit, 1, 1);
    set_row(&mut edit, 0, &bread_row.id.to_string(), "Butter", "10 g");

    let error = service::edit_recipe(&mut connection, recipe.id, &edit).unwrap_err();
    assert!(matches!(error, Error::DuplicateAssociation), "{error:?}");

    let detail = service::recipe_detail(&mut connection, recipe.id).unwrap();
    let names: Vec<&str> = detail
        .ingredients
        .iter()
        .map(|(_, ingredient)| ingredient.name.as_str())
        .collect();
    assert_eq!(names, vec!["Bread", "Butter"]);
}

#[test]
#[ignore = "requires PostgreSQL (set DATABASE_URL, run migrations)"]
fn deleting_a_recipe_spares_its_ingredients() {
    let mut connection = connection();

    let data = new_recipe_submission("Pancakes", &[("Milk", "2 dl"), ("Flour", "4 dl")]);
    let recipe = service::create_recipe(&mut connection, &data).unwrap();

    service::delete_recipe(&mut connection, recipe.id).unwrap();

    let error = service::recipe_detail(&mut connection, recipe.id).unwrap_err();
    assert!(matches!(error, Error::NotFound));

    // Shared ingredients survive and resolve to the same rows.
    let milk = Ingredient::get_or_create(&mut connection, "Milk").unwrap();
    assert_eq!(
        service::ingredient_suggestions(&mut connection, "milk").unwrap(),
        vec![milk.name]
    );
}

#[test]
#[ignore = "requires PostgreSQL (set DATABASE_URL, run migrations)"]
fn operations_on_unknown_recipes_are_not_found() {
    let mut connection = connection();

    assert!(matches!(
        service::recipe_detail(&mut connection, -1),
        Err(Error::NotFound)
    ));
    assert!(matches!(
        service::delete_recipe(&mut connection, -1),
        Err(Error::NotFound)
    ));

    let data = new_recipe_submission("Ghost", &[("Milk", "2 dl")]);
    assert!(matches!(
        service::edit_recipe(&mut connection, -1, &data),
        Err(Error::NotFound)
    ));
}

#[test]
#[ignore = "requires PostgreSQL (set DATABASE_URL, run migrations)"]
fn search_matches_substrings_case_insensitively_without_duplicates() {
    let mut connection = connection();

    let pancakes = service::create_recipe(
        &mut connection,
        &new_recipe_submission("Pancakes", &[("Whole milk", "2 dl"), ("Milk chocolate", "50 g")]),
    )
    .unwrap();
    let porridge = service::create_recipe(
        &mut connection,
        &new_recipe_submission("Porridge", &[("Oats", "1 dl")]),
    )
    .unwrap();

    // Two matching ingredients, one result row.
    let found = service::search_recipes(&mut connection, "MILK").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, pancakes.id);

    // Blank query lists everything, newest first.
    let all = service::search_recipes(&mut connection, "   ").unwrap();
    let ids: Vec<i32> = all.iter().map(|recipe| recipe.id).collect();
    assert_eq!(ids, vec![porridge.id, pancakes.id]);

    // No match is an empty result, not an error.
    assert!(service::search_recipes(&mut connection, "dragonfruit")
        .unwrap()
        .is_empty());
}

#[test]
#[ignore = "requires PostgreSQL (set DATABASE_URL, run migrations)"]
fn search_treats_pattern_metacharacters_literally() {
    let mut connection = connection();

    let brownies = service::create_recipe(
        &mut connection,
        &new_recipe_submission("Brownies", &[("100% cocoa", "50 g")]),
    )
    .unwrap();
    service::create_recipe(
        &mut connection,
        &new_recipe_submission("Porridge", &[("Oats 1000 g", "1 dl")]),
    )
    .unwrap();

    // "%" must match itself, not act as a wildcard.
    let found = service::search_recipes(&mut connection, "100%").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, brownies.id);

    // "_" is not a single-character wildcard either.
    assert!(service::search_recipes(&mut connection, "_").unwrap().is_empty());
    assert!(service::ingredient_suggestions(&mut connection, "_")
        .unwrap()
        .is_empty());

    assert_eq!(
        service::ingredient_suggestions(&mut connection, "100%").unwrap(),
        vec!["100% cocoa".to_owned()]
    );
}

#[test]
#[ignore = "requires PostgreSQL (set DATABASE_URL, run migrations)"]
fn suggestions_are_capped_at_ten() {
    let mut connection = connection();

    for index in 0..12 {
        Ingredient::get_or_create(&mut connection, &format!("Spice {index:02}")).unwrap();
    }

    let suggestions = service::ingredient_suggestions(&mut connection, "spice").unwrap();
    assert_eq!(suggestions.len(), 10);
    assert_eq!(suggestions[0], "Spice 00");

    assert!(service::ingredient_suggestions(&mut connection, "  ")
        .unwrap()
        .is_empty());
}
