//! User service.

use chrono::Utc;
use clubdesk_common::{AppError, AppResult, IdGenerator};
use clubdesk_db::entities::{notification_preference, user};
use clubdesk_db::repositories::{NotificationPreferenceRepository, UserRepository};
use clubdesk_db::filters::{Page, Sort, UserFilter, UserSortField};
use sea_orm::{ActiveModelTrait, Set};
use serde::Deserialize;
use validator::Validate;

/// Input for signing up.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub club: String,
    #[validate(url)]
    pub microsite: Option<String>,
    #[validate(url)]
    pub photo: Option<String>,
}

/// Partial update of notification preferences. Missing flags keep their value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesInput {
    pub notify_on_new_club_question: Option<bool>,
    pub notify_on_related_question_modified_by_author: Option<bool>,
    pub notify_on_my_question_or_answer_modified_by_admin: Option<bool>,
    pub notify_on_new_answer_in_related_question: Option<bool>,
    pub notify_on_answer_published_on_my_question: Option<bool>,
    pub notify_on_any_official_answer_in_related_question: Option<bool>,
    pub notify_on_answer_to_my_question_marked_official: Option<bool>,
}

/// Service for users and their notification preferences.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    preference_repo: NotificationPreferenceRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        preference_repo: NotificationPreferenceRepository,
    ) -> Self {
        Self {
            user_repo,
            preference_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Resolve an API token to its user.
    pub async fn authenticate(&self, token: &str) -> AppResult<Option<user::Model>> {
        self.user_repo.find_by_token(token).await
    }

    /// List users.
    pub async fn list(
        &self,
        filter: &UserFilter,
        sort: Option<Sort<UserSortField>>,
        page: Page,
    ) -> AppResult<Vec<user::Model>> {
        self.user_repo.list(filter, sort, page).await
    }

    /// Sign a user up with every notification enabled.
    ///
    /// New users always get the `user` role; the returned model carries the
    /// API token.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(format!("Email already registered: {email}")));
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            email: Set(email),
            club: Set(input.club),
            role: Set(user::Role::User),
            microsite: Set(input.microsite),
            photo: Set(input.photo),
            token: Set(self.id_gen.generate_token()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        let user = self.user_repo.create(model).await?;

        let prefs: notification_preference::ActiveModel =
            notification_preference::Model::defaults_for(&user.id).into();
        self.preference_repo.create(prefs.reset_all()).await?;

        tracing::info!(user_id = %user.id, club = %user.club, "Created user");
        Ok(user)
    }

    /// Notification preferences of a user.
    pub async fn get_preferences(&self, user_id: &str) -> AppResult<notification_preference::Model> {
        self.preference_repo.get_or_default(user_id).await
    }

    /// Change some notification preferences.
    pub async fn update_preferences(
        &self,
        user_id: &str,
        input: UpdatePreferencesInput,
    ) -> AppResult<notification_preference::Model> {
        let existing = self.preference_repo.find_by_user_id(user_id).await?;
        let is_new = existing.is_none();
        let current =
            existing.unwrap_or_else(|| notification_preference::Model::defaults_for(user_id));

        let mut active: notification_preference::ActiveModel = current.into();
        macro_rules! apply {
            ($($flag:ident),* $(,)?) => {
                $(if let Some(value) = input.$flag {
                    active.$flag = Set(value);
                })*
            };
        }
        apply!(
            notify_on_new_club_question,
            notify_on_related_question_modified_by_author,
            notify_on_my_question_or_answer_modified_by_admin,
            notify_on_new_answer_in_related_question,
            notify_on_answer_published_on_my_question,
            notify_on_any_official_answer_in_related_question,
            notify_on_answer_to_my_question_marked_official,
        );
        active.updated_at = Set(Some(Utc::now().into()));

        if is_new {
            self.preference_repo.create(active.reset_all()).await
        } else {
            self.preference_repo.update(active).await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            club: "chess".to_string(),
            role: user::Role::User,
            microsite: None,
            photo: None,
            token: "abc".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn build_service(db: MockDatabase) -> UserService {
        let db = Arc::new(db.into_connection());
        UserService::new(
            UserRepository::new(Arc::clone(&db)),
            NotificationPreferenceRepository::new(db),
        )
    }

    fn input(email: &str) -> CreateUserInput {
        CreateUserInput {
            name: "Ada".to_string(),
            email: email.to_string(),
            club: "chess".to_string(),
            microsite: None,
            photo: None,
        }
    }

    #[tokio::test]
    async fn test_create_user_with_default_preferences() {
        let user = create_test_user("user1");
        let prefs = notification_preference::Model::defaults_for("user1");

        let service = build_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[user.clone()]])
                .append_query_results([[prefs]]),
        );

        let created = service.create(input("Ada@Example.com")).await.unwrap();
        assert_eq!(created.id, "user1");
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email() {
        let service = build_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("user1")]]),
        );

        let result = service.create(input("ada@example.com")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_user_invalid_email() {
        // Validation runs before any query
        let service = build_service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service.create(input("not-an-email")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_preferences_creates_missing_row() {
        let mut stored = notification_preference::Model::defaults_for("user1");
        stored.notify_on_new_club_question = false;

        let service = build_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<notification_preference::Model>::new()])
                .append_query_results([[stored.clone()]]),
        );

        let result = service
            .update_preferences(
                "user1",
                UpdatePreferencesInput {
                    notify_on_new_club_question: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!result.notify_on_new_club_question);
        assert!(result.notify_on_answer_published_on_my_question);
    }
}
