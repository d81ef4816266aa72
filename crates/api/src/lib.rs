//! HTTP API layer for clubdesk.
//!
//! - **Endpoints**: questions, answers, votes, categories, users, files
//! - **Extractors**: caller identity (`AuthUser`, `MaybeAuthUser`, `AdminUser`)
//! - **Middleware**: bearer token lookup, application state wiring
//! - **Response**: the `{"data": ...}` wrapper and `$select` projection
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::{app, router};
pub use middleware::AppState;
