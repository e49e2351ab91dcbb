//! The operations the routing layer calls: create, edit, delete, detail,
//! list, search and ingredient suggestions. Each submission is one unit of
//! work; writes happen inside a single transaction so a half-applied
//! submission is never observable.

use diesel::prelude::*;
use itertools::Itertools;
use tracing::{event, trace_span, Level};

use crate::database::models::ingredient::Ingredient;
use crate::database::models::recipe::{NewRecipe, Recipe};
use crate::database::models::recipe_ingredient::{NewRecipeIngredient, RecipeIngredient};
use crate::error::{Error, SubmissionErrors};
use crate::forms::formset::{IngredientFormSet, RowIntent};
use crate::forms::recipe::RecipeForm;
use crate::forms::FormData;

/// A recipe together with its ingredient rows, the read-back surface for
/// the detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub ingredients: Vec<(RecipeIngredient, Ingredient)>,
}

/// Validate and persist a new recipe with its ingredient rows.
pub fn create_recipe(connection: &mut PgConnection, data: &FormData) -> Result<Recipe, Error> {
    let span = trace_span!("create recipe");
    let _guard = span.enter();

    let (fields, plan) = validate_submission(data)?;

    connection.build_transaction().run(|connection| {
        use crate::database::schema::recipes;

        let recipe: Recipe = diesel::insert_into(recipes::table)
            .values(&fields)
            .returning(Recipe::as_returning())
            .get_result(connection)?;

        apply_plan(connection, recipe.id, &plan)?;

        event!(Level::INFO, recipe_id = recipe.id, "recipe created");
        Ok(recipe)
    })
}

/// Validate and apply an edit of an existing recipe, reconciling its
/// ingredient rows against the submitted set.
pub fn edit_recipe(
    connection: &mut PgConnection,
    recipe_id: i32,
    data: &FormData,
) -> Result<Recipe, Error> {
    let span = trace_span!("edit recipe", recipe_id);
    let _guard = span.enter();

    if Recipe::find(connection, recipe_id)?.is_none() {
        return Err(Error::NotFound);
    }

    let (fields, plan) = validate_submission(data)?;

    connection.build_transaction().run(|connection| {
        use crate::database::schema::recipes::dsl::{recipes, updated_at};

        let recipe: Recipe = diesel::update(recipes.find(recipe_id))
            .set((&fields, updated_at.eq(diesel::dsl::now)))
            .returning(Recipe::as_returning())
            .get_result(connection)?;

        apply_plan(connection, recipe.id, &plan)?;

        event!(Level::INFO, recipe_id, "recipe updated");
        Ok(recipe)
    })
}

/// Delete a recipe. Its association rows go with it (cascade); the shared
/// ingredients stay.
pub fn delete_recipe(connection: &mut PgConnection, recipe_id: i32) -> Result<(), Error> {
    use crate::database::schema::recipes::dsl::recipes;

    let deleted = diesel::delete(recipes.find(recipe_id)).execute(connection)?;
    if deleted == 0 {
        return Err(Error::NotFound);
    }

    event!(Level::INFO, recipe_id, "recipe deleted");
    Ok(())
}

/// All recipes, newest first.
pub fn list_recipes(connection: &mut PgConnection) -> Result<Vec<Recipe>, Error> {
    Ok(Recipe::all(connection)?)
}

/// One recipe with its ingredient rows.
pub fn recipe_detail(connection: &mut PgConnection, recipe_id: i32) -> Result<RecipeDetail, Error> {
    let recipe = Recipe::find(connection, recipe_id)?.ok_or(Error::NotFound)?;
    let ingredients = RecipeIngredient::for_recipe(connection, &recipe)?;

    Ok(RecipeDetail {
        recipe,
        ingredients,
    })
}

/// Search recipes by ingredient name fragment. A blank query lists
/// everything.
pub fn search_recipes(connection: &mut PgConnection, query: &str) -> Result<Vec<Recipe>, Error> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Recipe::all(connection)?);
    }
    Ok(Recipe::search_by_ingredient(connection, query)?)
}

/// Up to 10 ingredient names containing the fragment, for autocomplete.
pub fn ingredient_suggestions(
    connection: &mut PgConnection,
    fragment: &str,
) -> Result<Vec<String>, Error> {
    let suggestions = Ingredient::suggest(connection, fragment)?;
    Ok(suggestions
        .into_iter()
        .map(|ingredient| ingredient.name)
        .collect_vec())
}

/// Run both the recipe form and the formset so the caller sees every
/// error in one response.
fn validate_submission(data: &FormData) -> Result<(NewRecipe, Vec<RowIntent>), Error> {
    let fields = RecipeForm::validate(data);
    let plan = IngredientFormSet::new().validate(data);

    match (fields, plan) {
        (Ok(fields), Ok(plan)) => Ok((fields, plan)),
        (fields, plan) => Err(Error::Invalid(SubmissionErrors {
            recipe: fields.err().unwrap_or_default(),
            ingredients: plan.err().unwrap_or_default(),
        })),
    }
}

/// Apply an intent plan to the recipe's association rows. Deletions run
/// first so a deleted ingredient can be re-added in the same submission
/// without tripping the (recipe, ingredient) unique index.
fn apply_plan(connection: &mut PgConnection, owner_id: i32, plan: &[RowIntent]) -> Result<(), Error> {
    use crate::database::schema::recipe_ingredients::dsl::*;

    for intent in plan {
        if let RowIntent::Delete { id: row_id } = intent {
            let removed = diesel::delete(
                recipe_ingredients.filter(id.eq(*row_id).and(recipe_id.eq(owner_id))),
            )
            .execute(connection)?;
            if removed == 0 {
                return Err(Error::NotFound);
            }
        }
    }

    for intent in plan {
        match intent {
            RowIntent::Delete { .. } => {}
            RowIntent::Create {
                ingredient_name,
                quantity: amount,
            } => {
                let ingredient = Ingredient::get_or_create(connection, ingredient_name)?;
                diesel::insert_into(recipe_ingredients)
                    .values(&NewRecipeIngredient::new(
                        owner_id,
                        ingredient.id,
                        amount.clone(),
                    ))
                    .execute(connection)?;
            }
            RowIntent::Update {
                id: row_id,
                ingredient_name,
                quantity: amount,
            } => {
                let ingredient = Ingredient::get_or_create(connection, ingredient_name)?;
                let updated = diesel::update(
                    recipe_ingredients.filter(id.eq(*row_id).and(recipe_id.eq(owner_id))),
                )
                .set((ingredient_id.eq(ingredient.id), quantity.eq(amount.as_str())))
                .execute(connection)?;
                if updated == 0 {
                    return Err(Error::NotFound);
                }
            }
        }
    }

    Ok(())
}
