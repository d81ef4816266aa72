//! API endpoints.

mod answers;
mod categories;
mod files;
mod questions;
mod users;

use axum::{Json, Router, middleware::from_fn_with_state, routing::get};
use serde_json::{Value, json};

use crate::middleware::{AppState, auth_middleware};

pub use answers::AnswerResponse;
pub use categories::CategoryResponse;
pub use files::FileResponse;
pub use questions::QuestionResponse;
pub use users::{MeResponse, PreferencesResponse, UserResponse};

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/questions", questions::router())
        .nest("/answers", answers::router())
        .nest("/categories", categories::router())
        .nest("/users", users::router())
        .nest("/files", files::router())
}

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// The full application: `/v1` API behind the auth middleware plus `/health`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/v1", router())
        .route("/health", get(health))
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
