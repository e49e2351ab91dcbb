pub mod ingredient;
pub mod recipe;
pub mod recipe_ingredient;

/// Escape `ILIKE` pattern metacharacters so user input matches as a
/// literal substring. Backslash first, since it is the escape character.
pub(crate) fn escape_like(fragment: &str) -> String {
    fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
