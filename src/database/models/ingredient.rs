use diesel::prelude::*;
use lombok::AllArgsConstructor;

/// A shared ingredient. Identified by its exact (normalized) name; never
/// deleted when recipes that reference it go away.
#[derive(
    Queryable, Selectable, Identifiable, AllArgsConstructor, Debug, Clone, PartialEq, Eq, Hash,
)]
#[diesel(table_name = crate::database::schema::ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
}

impl Ingredient {
    /// Resolve a normalized name to its ingredient row, creating it on
    /// first sight. Concurrent resolutions of the same name are settled by
    /// the unique index on `name`: the losing insert is a no-op and the
    /// follow-up lookup returns the winner's row.
    pub fn get_or_create(
        connection: &mut PgConnection,
        ingredient_name: &str,
    ) -> QueryResult<Ingredient> {
        use crate::database::schema::ingredients::dsl::*;

        diesel::insert_into(ingredients)
            .values(name.eq(ingredient_name))
            .on_conflict(name)
            .do_nothing()
            .execute(connection)?;

        ingredients
            .filter(name.eq(ingredient_name))
            .select(Ingredient::as_select())
            .first(connection)
    }

    /// Up to 10 ingredients whose name contains `fragment`, for the
    /// autocomplete box. A blank fragment suggests nothing.
    pub fn suggest(connection: &mut PgConnection, fragment: &str) -> QueryResult<Vec<Ingredient>> {
        use crate::database::models::escape_like;
        use crate::database::schema::ingredients::dsl::*;

        let fragment = fragment.trim();
        if fragment.is_empty() {
            return Ok(Vec::new());
        }

        ingredients
            .filter(name.ilike(format!("%{}%", escape_like(fragment))))
            .order(name.asc())
            .limit(10)
            .select(Ingredient::as_select())
            .load(connection)
    }
}
