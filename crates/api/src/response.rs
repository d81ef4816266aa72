//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clubdesk_common::{AppError, AppResult};
use clubdesk_core::query::project;
use serde::Serialize;
use serde_json::Value;

/// Standard success wrapper: `{"data": ...}`.
///
/// Errors do not go through this type; [`AppError`] renders its own
/// `{"error": {...}}` body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 response.
    pub const fn ok(data: T) -> Self {
        Self {
            data,
            status: StatusCode::OK,
        }
    }

    /// 201 response.
    pub const fn created(data: T) -> Self {
        Self {
            data,
            status: StatusCode::CREATED,
        }
    }
}

impl ApiResponse<Value> {
    /// 200 response keeping only the `$select`ed fields, if any.
    pub fn selected<T: Serialize>(data: &T, select: Option<&[String]>) -> AppResult<Self> {
        let value = serde_json::to_value(data)
            .map_err(|e| AppError::Internal(format!("Failed to serialize response: {e}")))?;
        Ok(Self::ok(match select {
            Some(fields) => project(value, fields),
            None => value,
        }))
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Empty success response.
#[must_use]
pub fn no_content() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
