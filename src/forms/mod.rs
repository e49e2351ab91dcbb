//! Form handling for raw request data: field cleaning for recipes and the
//! multi-row ingredient formset protocol. Everything here is pure; the
//! database is only touched once a submission has validated.

pub mod formset;
pub mod recipe;

use std::collections::HashMap;

use crate::error::ValidationError;

/// Raw submitted fields, as the routing layer hands them over. Keys follow
/// the formset wire format (`recipe_ingredients-0-ingredient_name`, ...).
#[derive(Debug, Clone, Default)]
pub struct FormData {
    values: HashMap<String, String>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Required text field: trimmed, non-empty, optionally length-bounded.
pub(crate) fn clean_text(
    raw: Option<&str>,
    max_length: Option<usize>,
) -> Result<String, ValidationError> {
    let trimmed = raw.unwrap_or("").trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField);
    }
    if let Some(max) = max_length {
        if trimmed.chars().count() > max {
            return Err(ValidationError::TooLong { max });
        }
    }
    Ok(trimmed.to_owned())
}

/// Required integer field that must not be negative. Parsing failures are
/// reported as a type error, not a negativity error.
pub(crate) fn clean_non_negative_int(raw: Option<&str>) -> Result<i32, ValidationError> {
    let trimmed = raw.unwrap_or("").trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField);
    }
    let value: i64 = trimmed
        .parse()
        .map_err(|_| ValidationError::InvalidInteger)?;
    if value < 0 {
        return Err(ValidationError::NegativeValue);
    }
    i32::try_from(value).map_err(|_| ValidationError::InvalidInteger)
}

/// First character uppercased, the rest lowercased ("MILK" -> "Milk",
/// "whole milk" -> "Whole milk").
pub(crate) fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}
