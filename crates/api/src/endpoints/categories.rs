//! Category endpoints.

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use clubdesk_common::AppResult;
use clubdesk_db::{entities::category, filters::Page};
use serde::{Deserialize, Serialize};

use crate::{middleware::AppState, response::ApiResponse};

/// Category response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

impl From<category::Model> for CategoryResponse {
    fn from(c: category::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Paging parameters.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(rename = "$top")]
    pub top: Option<u64>,
    #[serde(rename = "$skip")]
    pub skip: Option<u64>,
}

async fn list(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<ApiResponse<Vec<CategoryResponse>>> {
    let page = Page::new(
        params.top.unwrap_or(clubdesk_db::filters::DEFAULT_PAGE_SIZE),
        params.skip.unwrap_or(0),
    );
    let categories = state.category_service.list(page).await?;
    Ok(ApiResponse::ok(
        categories.into_iter().map(Into::into).collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list))
}
