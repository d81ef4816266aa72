//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use clubdesk_common::{Config, FileRules, StorageBackend};
use clubdesk_core::{
    AnswerService, AnswerVoteService, CategoryService, FileService, Mailer, NotificationService,
    QuestionService, UserService,
};
use clubdesk_db::repositories::{
    AnswerRepository, AnswerVoteRepository, CategoryRepository, NotificationPreferenceRepository,
    QuestionRepository, UserRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub question_service: QuestionService,
    pub answer_service: AnswerService,
    pub vote_service: AnswerVoteService,
    pub category_service: CategoryService,
    pub file_service: FileService,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: Arc<dyn StorageBackend>,
        mailer: Arc<dyn Mailer>,
        config: &Config,
    ) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let preference_repo = NotificationPreferenceRepository::new(Arc::clone(&db));
        let question_repo = QuestionRepository::new(Arc::clone(&db));
        let answer_repo = AnswerRepository::new(Arc::clone(&db));
        let vote_repo = AnswerVoteRepository::new(Arc::clone(&db));
        let category_repo = CategoryRepository::new(db);

        let file_service = FileService::new(
            storage,
            FileRules::new(config.storage.max_upload_bytes),
        );
        let notification_service = NotificationService::new(
            user_repo.clone(),
            answer_repo.clone(),
            mailer,
            config.notifications.clone(),
        );

        Self {
            user_service: UserService::new(user_repo, preference_repo),
            question_service: QuestionService::new(
                question_repo.clone(),
                answer_repo.clone(),
                category_repo.clone(),
                file_service.clone(),
                notification_service.clone(),
            ),
            answer_service: AnswerService::new(
                question_repo.clone(),
                answer_repo.clone(),
                vote_repo.clone(),
                file_service.clone(),
                notification_service,
            ),
            vote_service: AnswerVoteService::new(question_repo, answer_repo, vote_repo),
            category_service: CategoryService::new(category_repo),
            file_service,
        }
    }
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stores it in the
/// request extensions. Requests without a valid token pass through
/// anonymously; handlers that need a caller reject them.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate(token.trim()).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => tracing::debug!("Unknown bearer token"),
            Err(e) => tracing::warn!(error = %e, "Token lookup failed"),
        }
    }

    next.run(req).await
}
