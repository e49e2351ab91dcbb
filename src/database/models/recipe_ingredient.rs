use diesel::prelude::*;
use lombok::AllArgsConstructor;

use super::ingredient::Ingredient;
use super::recipe::Recipe;

/// Join row binding one recipe to one ingredient with a free-text
/// quantity ("2 dl", "500 g"). At most one row per (recipe, ingredient)
/// pair, enforced by a unique index.
#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq, Eq)]
#[diesel(belongs_to(Recipe))]
#[diesel(belongs_to(Ingredient))]
#[diesel(table_name = crate::database::schema::recipe_ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RecipeIngredient {
    pub id: i32,
    pub recipe_id: i32,
    pub ingredient_id: i32,
    pub quantity: String,
}

#[derive(Insertable, AllArgsConstructor, Debug, Clone)]
#[diesel(table_name = crate::database::schema::recipe_ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewRecipeIngredient {
    pub recipe_id: i32,
    pub ingredient_id: i32,
    pub quantity: String,
}

impl RecipeIngredient {
    /// The recipe's association rows with their ingredients, in insertion
    /// order.
    pub fn for_recipe(
        connection: &mut PgConnection,
        recipe: &Recipe,
    ) -> QueryResult<Vec<(RecipeIngredient, Ingredient)>> {
        use crate::database::schema::{ingredients, recipe_ingredients};

        RecipeIngredient::belonging_to(recipe)
            .inner_join(ingredients::table)
            .order(recipe_ingredients::id.asc())
            .select((RecipeIngredient::as_select(), Ingredient::as_select()))
            .load(connection)
    }
}
