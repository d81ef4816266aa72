//! Answer endpoints.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
};
use clubdesk_common::AppResult;
use clubdesk_core::{
    AnswerView, SetAnswerStatusInput, UpdateAnswerInput, VoteState,
    query::{self, Answers},
};
use clubdesk_db::entities::{
    answer::{self, AnswerStatus},
    question::QuestionStatus,
};
use serde::Serialize;
use serde_json::Value;

use crate::{
    extractors::{AdminUser, AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Answer response. Vote fields are only present on answer reads;
/// `questionStatus` only on writes that move the question status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub id: String,
    pub question_id: String,
    pub user_id: String,
    pub content: String,
    pub status: AnswerStatus,
    pub attachment: Option<String>,
    pub modified_by: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_status: Option<QuestionStatus>,
}

impl From<answer::Model> for AnswerResponse {
    fn from(a: answer::Model) -> Self {
        Self {
            id: a.id,
            question_id: a.question_id,
            user_id: a.user_id,
            content: a.content,
            status: a.status,
            attachment: a.attachment,
            modified_by: a.modified_by,
            created_at: a.created_at.to_rfc3339(),
            updated_at: a.updated_at.map(|t| t.to_rfc3339()),
            votes: None,
            voted: None,
            question_status: None,
        }
    }
}

impl From<(answer::Model, QuestionStatus)> for AnswerResponse {
    fn from((answer, question_status): (answer::Model, QuestionStatus)) -> Self {
        Self {
            question_status: Some(question_status),
            ..answer.into()
        }
    }
}

impl From<AnswerView> for AnswerResponse {
    fn from(view: AnswerView) -> Self {
        Self {
            votes: Some(view.votes),
            voted: Some(view.voted),
            ..view.answer.into()
        }
    }
}

async fn list(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<ApiResponse<Value>> {
    let query = query::parse::<Answers>(&params)?;
    let select = query.select.clone();

    let answers: Vec<AnswerResponse> = state
        .answer_service
        .list(viewer.user(), query)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    ApiResponse::selected(&answers, select.as_deref())
}

async fn show(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<AnswerResponse>> {
    let view = state.answer_service.get(viewer.user(), &id).await?;
    Ok(ApiResponse::ok(view.into()))
}

async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(input): Json<UpdateAnswerInput>,
) -> AppResult<ApiResponse<AnswerResponse>> {
    let answer = state.answer_service.update(&user, &id, input).await?;
    Ok(ApiResponse::ok(answer.into()))
}

async fn set_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(input): Json<SetAnswerStatusInput>,
) -> AppResult<ApiResponse<AnswerResponse>> {
    let answer = state.answer_service.set_status(&admin, &id, input).await?;
    Ok(ApiResponse::ok(answer.into()))
}

async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.answer_service.delete(&user, &id).await?;
    Ok(no_content())
}

async fn vote(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<VoteState>> {
    let vote = state.vote_service.toggle(&user, &id).await?;
    Ok(ApiResponse::ok(vote))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(show).put(update).delete(delete))
        .route("/{id}/status", put(set_status))
        .route("/{id}/vote", post(vote))
}
