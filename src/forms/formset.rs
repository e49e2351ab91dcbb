//! The multi-row ingredient submission protocol: an indexed, variable
//! length list of rows under the `recipe_ingredients` prefix, preceded by
//! a management block with the row counts. Parsing turns the wire format
//! into an ordered plan of row intents; nothing here touches the database.

use std::collections::HashSet;

use crate::error::{FieldErrors, FormsetError, FormsetErrors, ValidationError};

use super::{capitalize, clean_text, FormData};

pub const PREFIX: &str = "recipe_ingredients";
pub const INGREDIENT_NAME_MAX_LENGTH: usize = 100;
pub const QUANTITY_MAX_LENGTH: usize = 50;
pub const DEFAULT_MIN_ROWS: usize = 1;
/// Hard ceiling on rows examined per submission. The declared total is
/// client data; without this bound a single request could declare
/// billions of rows and keep the parser busy indefinitely.
pub const ABSOLUTE_MAX_ROWS: usize = 1000;

/// Counts declared by the client alongside the rows. `max_num` is carried
/// for completeness but not enforced; the server-side minimum lives on
/// [`IngredientFormSet`], not in client data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagementForm {
    pub total_forms: usize,
    pub initial_forms: usize,
    pub min_num: usize,
    pub max_num: usize,
}

impl ManagementForm {
    pub fn parse(data: &FormData) -> Result<Self, FormsetError> {
        let total_forms = Self::count(data, "TOTAL_FORMS")?;
        let initial_forms = Self::count(data, "INITIAL_FORMS")?;
        let min_num = Self::count(data, "MIN_NUM_FORMS")?;
        let max_num = Self::count(data, "MAX_NUM_FORMS")?;

        if total_forms < initial_forms {
            return Err(FormsetError::MalformedProtocol);
        }

        Ok(Self {
            total_forms,
            initial_forms,
            min_num,
            max_num,
        })
    }

    fn count(data: &FormData, key: &str) -> Result<usize, FormsetError> {
        data.get(&format!("{PREFIX}-{key}"))
            .and_then(|raw| raw.trim().parse().ok())
            .ok_or(FormsetError::MalformedProtocol)
    }
}

/// What one surviving or deleted row asks the store to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowIntent {
    Create {
        ingredient_name: String,
        quantity: String,
    },
    Update {
        id: i32,
        ingredient_name: String,
        quantity: String,
    },
    Delete {
        id: i32,
    },
}

/// Validates a submitted ingredient row set into an ordered intent plan.
pub struct IngredientFormSet {
    min_rows: usize,
}

impl Default for IngredientFormSet {
    fn default() -> Self {
        Self {
            min_rows: DEFAULT_MIN_ROWS,
        }
    }
}

impl IngredientFormSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_rows(min_rows: usize) -> Self {
        Self { min_rows }
    }

    /// Parse and validate every row. On success the returned plan contains
    /// one intent per non-blank row, in submission order. On failure all
    /// set-level and row-level errors are reported together; no partial
    /// plan escapes.
    pub fn validate(&self, data: &FormData) -> Result<Vec<RowIntent>, FormsetErrors> {
        let mut errors = FormsetErrors::default();

        let management = match ManagementForm::parse(data) {
            Ok(management) => management,
            Err(error) => {
                errors.set.push(error);
                return Err(errors);
            }
        };

        let mut intents = Vec::new();
        let mut seen_names: HashSet<String> = HashSet::new();
        let mut surviving = 0usize;

        for index in 0..management.total_forms.min(ABSOLUTE_MAX_ROWS) {
            let row = RawRow::extract(data, index);

            let id = match row.parsed_id() {
                Ok(id) => id,
                Err(error) => {
                    errors.rows.entry(index).or_default().entry("id").or_default().push(error);
                    continue;
                }
            };

            if row.delete {
                // Deleting an existing row is an intent; a delete-flagged
                // new row never existed and is simply dropped.
                if let Some(id) = id {
                    intents.push(RowIntent::Delete { id });
                }
                continue;
            }

            // Extra blank rows the UI rendered but the user never filled
            // in are not an error.
            if row.is_blank() && id.is_none() {
                continue;
            }

            surviving += 1;

            let mut row_errors = FieldErrors::new();

            let ingredient_name =
                match clean_text(row.ingredient_name, Some(INGREDIENT_NAME_MAX_LENGTH)) {
                    Ok(name) => Some(capitalize(&name)),
                    Err(error) => {
                        row_errors.entry("ingredient_name").or_default().push(error);
                        None
                    }
                };

            let quantity = match Self::clean_quantity(row.quantity) {
                Ok(quantity) => Some(quantity),
                Err(error) => {
                    row_errors.entry("quantity").or_default().push(error);
                    None
                }
            };

            if let Some(name) = &ingredient_name {
                if !seen_names.insert(name.clone()) {
                    row_errors
                        .entry("ingredient_name")
                        .or_default()
                        .push(ValidationError::DuplicateAssociation);
                }
            }

            if !row_errors.is_empty() {
                errors.rows.insert(index, row_errors);
                continue;
            }

            let (ingredient_name, quantity) = match (ingredient_name, quantity) {
                (Some(name), Some(quantity)) => (name, quantity),
                _ => continue,
            };

            intents.push(match id {
                Some(id) => RowIntent::Update {
                    id,
                    ingredient_name,
                    quantity,
                },
                None => RowIntent::Create {
                    ingredient_name,
                    quantity,
                },
            });
        }

        if surviving < self.min_rows {
            errors.set.push(FormsetError::BelowMinimumRows {
                required: self.min_rows,
                got: surviving,
            });
        }

        if errors.is_empty() {
            Ok(intents)
        } else {
            Err(errors)
        }
    }

    /// Free text; nothing is checked beyond the column length.
    fn clean_quantity(raw: Option<&str>) -> Result<String, ValidationError> {
        let trimmed = raw.unwrap_or("").trim();
        if trimmed.chars().count() > QUANTITY_MAX_LENGTH {
            return Err(ValidationError::TooLong {
                max: QUANTITY_MAX_LENGTH,
            });
        }
        Ok(trimmed.to_owned())
    }
}

/// One row as it appears on the wire, before any cleaning.
struct RawRow<'a> {
    id: Option<&'a str>,
    ingredient_name: Option<&'a str>,
    quantity: Option<&'a str>,
    delete: bool,
}

impl<'a> RawRow<'a> {
    fn extract(data: &'a FormData, index: usize) -> Self {
        let field = |name: &str| data.get(&format!("{PREFIX}-{index}-{name}"));

        Self {
            id: field("id"),
            ingredient_name: field("ingredient_name"),
            quantity: field("quantity"),
            delete: is_checked(field("DELETE")),
        }
    }

    fn parsed_id(&self) -> Result<Option<i32>, ValidationError> {
        match self.id.map(str::trim).filter(|raw| !raw.is_empty()) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| ValidationError::InvalidInteger),
        }
    }

    fn is_blank(&self) -> bool {
        let blank = |raw: Option<&str>| raw.map_or(true, |value| value.trim().is_empty());
        blank(self.ingredient_name) && blank(self.quantity)
    }
}

/// Checkbox semantics: "", "0" and "false" are unchecked, anything else
/// counts as checked.
fn is_checked(raw: Option<&str>) -> bool {
    match raw {
        None => false,
        Some(value) => !matches!(value.trim().to_ascii_lowercase().as_str(), "" | "0" | "false"),
    }
}
