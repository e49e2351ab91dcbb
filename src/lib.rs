#![warn(clippy::all)]

//! Core of the recipe manager: validation, ingredient resolution, the
//! multi-row ingredient submission protocol and the queries behind the
//! recipe pages. The presentation layer lives elsewhere and only ever
//! talks to [`service`].

pub mod database;
pub mod error;
pub mod forms;
pub mod service;

pub use error::Error;
