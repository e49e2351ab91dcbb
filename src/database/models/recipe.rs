use chrono::{DateTime, Utc};
use diesel::prelude::*;
use lombok::AllArgsConstructor;

/// A stored recipe. Timestamps are assigned by the database; clients never
/// supply them.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::database::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Recipe {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub instructions: String,
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated recipe fields, ready to insert or to apply as a changeset.
#[derive(Insertable, AsChangeset, AllArgsConstructor, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::database::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewRecipe {
    pub name: String,
    pub description: String,
    pub instructions: String,
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
}

impl Recipe {
    /// Total time (prep + cook) in minutes.
    pub fn total_time(&self) -> i32 {
        self.prep_time + self.cook_time
    }

    /// All recipes, newest first.
    pub fn all(connection: &mut PgConnection) -> QueryResult<Vec<Recipe>> {
        use crate::database::schema::recipes::dsl::*;

        recipes
            .order((created_at.desc(), id.desc()))
            .select(Recipe::as_select())
            .load(connection)
    }

    pub fn find(connection: &mut PgConnection, recipe_id: i32) -> QueryResult<Option<Recipe>> {
        use crate::database::schema::recipes::dsl::*;

        recipes
            .find(recipe_id)
            .select(Recipe::as_select())
            .first(connection)
            .optional()
    }

    /// Recipes with at least one ingredient whose name contains
    /// `search_text` (case-insensitive). Each recipe appears once even if
    /// several of its ingredients match.
    pub fn search_by_ingredient(
        connection: &mut PgConnection,
        search_text: &str,
    ) -> QueryResult<Vec<Recipe>> {
        use crate::database::models::escape_like;
        use crate::database::schema::{ingredients, recipe_ingredients, recipes};

        recipes::table
            .inner_join(recipe_ingredients::table.inner_join(ingredients::table))
            .filter(ingredients::name.ilike(format!("%{}%", escape_like(search_text))))
            .select(Recipe::as_select())
            .distinct()
            .order((recipes::created_at.desc(), recipes::id.desc()))
            .load(connection)
    }
}
