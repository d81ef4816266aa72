//! Core business logic for clubdesk.

pub mod query;
pub mod services;

pub use services::*;
