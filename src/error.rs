use std::collections::BTreeMap;

use thiserror::Error;

/// Per-field validation errors, keyed by field name.
pub type FieldErrors = BTreeMap<&'static str, Vec<ValidationError>>;

/// A single field-level validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is missing or blank after trimming.
    #[error("this field cannot be empty")]
    EmptyField,

    /// Value does not parse as a whole number.
    #[error("enter a whole number")]
    InvalidInteger,

    /// Parsed fine but is negative.
    #[error("value cannot be negative")]
    NegativeValue,

    /// Value exceeds the column's length bound.
    #[error("ensure this value has at most {max} characters")]
    TooLong { max: usize },

    /// Another row in the same submission already names this ingredient.
    #[error("this ingredient is already listed for the recipe")]
    DuplicateAssociation,
}

/// A failure of the ingredient row set as a whole, as opposed to a single
/// row's fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormsetError {
    /// Management counts missing, non-numeric, or inconsistent.
    #[error("management form data is missing or has been tampered with")]
    MalformedProtocol,

    /// Fewer surviving rows than the configured minimum.
    #[error("at least {required} ingredient row(s) required, got {got}")]
    BelowMinimumRows { required: usize, got: usize },
}

/// Errors for the ingredient row set: set-level failures plus field errors
/// indexed by row position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormsetErrors {
    pub set: Vec<FormsetError>,
    pub rows: BTreeMap<usize, FieldErrors>,
}

impl FormsetErrors {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.rows.is_empty()
    }
}

/// Everything that went wrong with one submission, structured so a
/// presentation layer can annotate the offending fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionErrors {
    pub recipe: FieldErrors,
    pub ingredients: FormsetErrors,
}

/// Service-level error. Validation failures carry the full structured
/// error set; storage failures stay opaque because the enclosing
/// transaction guarantees nothing partial was applied.
#[derive(Error, Debug)]
pub enum Error {
    #[error("recipe not found")]
    NotFound,

    #[error("submission failed validation")]
    Invalid(SubmissionErrors),

    /// The database rejected a duplicate (recipe, ingredient) pair that
    /// the pre-commit check could not see, e.g. a concurrent edit.
    #[error("ingredient is already attached to this recipe")]
    DuplicateAssociation,

    #[error("database error: {0}")]
    Storage(diesel::result::Error),
}

impl From<diesel::result::Error> for Error {
    fn from(error: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};

        match error {
            DieselError::NotFound => Error::NotFound,
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                Error::DuplicateAssociation
            }
            other => Error::Storage(other),
        }
    }
}
