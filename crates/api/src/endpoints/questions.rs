//! Question endpoints.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use clubdesk_common::AppResult;
use clubdesk_core::{
    CreateAnswerInput, CreateQuestionInput, QuestionView, UpdateQuestionInput,
    query::{self, Questions},
};
use clubdesk_db::entities::question::{QuestionStatus, Visibility};
use serde::Serialize;
use serde_json::Value;

use super::{answers::AnswerResponse, categories::CategoryResponse};
use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Question response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub visibility: Visibility,
    pub status: QuestionStatus,
    pub attachment: Option<String>,
    pub modified_by: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategoryResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<AnswerResponse>>,
}

impl From<QuestionView> for QuestionResponse {
    fn from(view: QuestionView) -> Self {
        let q = view.question;
        Self {
            id: q.id,
            user_id: q.user_id,
            title: q.title,
            content: q.content,
            visibility: q.visibility,
            status: q.status,
            attachment: q.attachment,
            modified_by: q.modified_by,
            created_at: q.created_at.to_rfc3339(),
            updated_at: q.updated_at.map(|t| t.to_rfc3339()),
            categories: view
                .categories
                .map(|c| c.into_iter().map(Into::into).collect()),
            answers: view.answers.map(|a| a.into_iter().map(Into::into).collect()),
        }
    }
}

async fn list(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<ApiResponse<Value>> {
    let query = query::parse::<Questions>(&params)?;
    let select = query.select.clone();

    let questions: Vec<QuestionResponse> = state
        .question_service
        .list(viewer.user(), query)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    ApiResponse::selected(&questions, select.as_deref())
}

async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<CreateQuestionInput>,
) -> AppResult<ApiResponse<QuestionResponse>> {
    let view = state.question_service.create(&user, input).await?;
    Ok(ApiResponse::created(view.into()))
}

async fn show(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<QuestionResponse>> {
    let view = state.question_service.get(viewer.user(), &id).await?;
    Ok(ApiResponse::ok(view.into()))
}

async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(input): Json<UpdateQuestionInput>,
) -> AppResult<ApiResponse<QuestionResponse>> {
    let view = state.question_service.update(&user, &id, input).await?;
    Ok(ApiResponse::ok(view.into()))
}

async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.question_service.delete(&user, &id).await?;
    Ok(no_content())
}

async fn list_answers(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<AnswerResponse>>> {
    let answers = state
        .answer_service
        .list_for_question(viewer.user(), &id)
        .await?;
    Ok(ApiResponse::ok(answers.into_iter().map(Into::into).collect()))
}

async fn create_answer(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(input): Json<CreateAnswerInput>,
) -> AppResult<ApiResponse<AnswerResponse>> {
    let answer = state.answer_service.create(&user, &id, input).await?;
    Ok(ApiResponse::created(answer.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(delete))
        .route("/{id}/answers", get(list_answers).post(create_answer))
}
