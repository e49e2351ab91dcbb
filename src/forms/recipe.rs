use crate::database::models::recipe::NewRecipe;
use crate::error::{FieldErrors, ValidationError};

use super::{clean_non_negative_int, clean_text, FormData};

pub const NAME_MAX_LENGTH: usize = 200;

/// Field validation for the recipe itself. All fields are checked so the
/// caller gets every error at once, not just the first.
pub struct RecipeForm;

impl RecipeForm {
    pub fn validate(data: &FormData) -> Result<NewRecipe, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = Self::text(
            "name",
            clean_text(data.get("name"), Some(NAME_MAX_LENGTH)),
            &mut errors,
        );
        let instructions = Self::text(
            "instructions",
            clean_text(data.get("instructions"), None),
            &mut errors,
        );

        // Optional; absent means empty.
        let description = data.get("description").unwrap_or("").trim().to_owned();

        let prep_time = Self::non_negative("prep_time", data, &mut errors);
        let cook_time = Self::non_negative("cook_time", data, &mut errors);
        let servings = Self::non_negative("servings", data, &mut errors);

        match (name, instructions, prep_time, cook_time, servings) {
            (Some(name), Some(instructions), Some(prep_time), Some(cook_time), Some(servings))
                if errors.is_empty() =>
            {
                Ok(NewRecipe::new(
                    name,
                    description,
                    instructions,
                    prep_time,
                    cook_time,
                    servings,
                ))
            }
            _ => Err(errors),
        }
    }

    fn text(
        field: &'static str,
        result: Result<String, ValidationError>,
        errors: &mut FieldErrors,
    ) -> Option<String> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                errors.entry(field).or_default().push(error);
                None
            }
        }
    }

    fn non_negative(field: &'static str, data: &FormData, errors: &mut FieldErrors) -> Option<i32> {
        match clean_non_negative_int(data.get(field)) {
            Ok(value) => Some(value),
            Err(error) => {
                errors.entry(field).or_default().push(error);
                None
            }
        }
    }
}
