//! User endpoints.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use clubdesk_common::AppResult;
use clubdesk_core::{
    CreateUserInput, UpdatePreferencesInput,
    query::{self, Users},
};
use clubdesk_db::entities::{notification_preference, user};
use serde::Serialize;
use serde_json::Value;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::ApiResponse,
};

/// Public user profile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub club: String,
    pub role: user::Role,
    pub microsite: Option<String>,
    pub photo: Option<String>,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            name: u.name,
            club: u.club,
            role: u.role,
            microsite: u.microsite,
            photo: u.photo,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// The caller's own account. The token is only returned at signup.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl MeResponse {
    fn new(user: user::Model, with_token: bool) -> Self {
        let email = user.email.clone();
        let token = with_token.then(|| user.token.clone());
        Self {
            user: user.into(),
            email,
            token,
        }
    }
}

/// Notification preferences response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesResponse {
    pub notify_on_new_club_question: bool,
    pub notify_on_related_question_modified_by_author: bool,
    pub notify_on_my_question_or_answer_modified_by_admin: bool,
    pub notify_on_new_answer_in_related_question: bool,
    pub notify_on_answer_published_on_my_question: bool,
    pub notify_on_any_official_answer_in_related_question: bool,
    pub notify_on_answer_to_my_question_marked_official: bool,
}

impl From<notification_preference::Model> for PreferencesResponse {
    fn from(p: notification_preference::Model) -> Self {
        Self {
            notify_on_new_club_question: p.notify_on_new_club_question,
            notify_on_related_question_modified_by_author: p
                .notify_on_related_question_modified_by_author,
            notify_on_my_question_or_answer_modified_by_admin: p
                .notify_on_my_question_or_answer_modified_by_admin,
            notify_on_new_answer_in_related_question: p.notify_on_new_answer_in_related_question,
            notify_on_answer_published_on_my_question: p.notify_on_answer_published_on_my_question,
            notify_on_any_official_answer_in_related_question: p
                .notify_on_any_official_answer_in_related_question,
            notify_on_answer_to_my_question_marked_official: p
                .notify_on_answer_to_my_question_marked_official,
        }
    }
}

async fn list(
    State(state): State<AppState>,
    _viewer: AuthUser,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<ApiResponse<Value>> {
    let query = query::parse::<Users>(&params)?;

    let users: Vec<UserResponse> = state
        .user_service
        .list(&query.filter, query.sort, query.page)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    ApiResponse::selected(&users, query.select.as_deref())
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> AppResult<ApiResponse<MeResponse>> {
    let user = state.user_service.create(input).await?;
    Ok(ApiResponse::created(MeResponse::new(user, true)))
}

async fn me(AuthUser(user): AuthUser) -> ApiResponse<MeResponse> {
    ApiResponse::ok(MeResponse::new(user, false))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get(&id).await?;
    Ok(ApiResponse::ok(user.into()))
}

async fn get_preferences(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<ApiResponse<PreferencesResponse>> {
    let prefs = state.user_service.get_preferences(&user.id).await?;
    Ok(ApiResponse::ok(prefs.into()))
}

async fn update_preferences(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(input): Json<UpdatePreferencesInput>,
) -> AppResult<ApiResponse<PreferencesResponse>> {
    let prefs = state
        .user_service
        .update_preferences(&user.id, input)
        .await?;
    Ok(ApiResponse::ok(prefs.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/me", get(me))
        .route(
            "/me/notification-preferences",
            get(get_preferences).put(update_preferences),
        )
        .route("/{id}", get(show))
}
