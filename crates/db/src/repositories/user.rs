//! User repository.

use std::sync::Arc;

use crate::entities::{NotificationPreference, User, notification_preference, user};
use crate::filters::{Page, Sort, UserFilter, UserSortField};
use clubdesk_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Order,
};

/// A user together with their stored notification preferences.
///
/// The preferences are `None` when no row was ever written for the user.
pub type UserWithPreferences = (user::Model, Option<notification_preference::Model>);

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by API token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List users matching a filter.
    pub async fn list(
        &self,
        filter: &UserFilter,
        sort: Option<Sort<UserSortField>>,
        page: Page,
    ) -> AppResult<Vec<user::Model>> {
        let mut query = User::find();

        if let Some(club) = &filter.club {
            query = query.filter(user::Column::Club.eq(club.as_str()));
        }
        if let Some(role) = filter.role {
            query = query.filter(user::Column::Role.eq(role));
        }

        query = match sort {
            Some(Sort {
                field: UserSortField::Name,
                descending,
            }) => query.order_by(
                user::Column::Name,
                if descending { Order::Desc } else { Order::Asc },
            ),
            None => query.order_by_asc(user::Column::CreatedAt),
        };

        query
            .offset(page.offset)
            .limit(page.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // === Notification audiences ===

    /// Members of `club` and admins of any club, with their preferences.
    pub async fn find_club_members_or_admins(
        &self,
        club: &str,
    ) -> AppResult<Vec<UserWithPreferences>> {
        User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Club.eq(club))
                    .add(user::Column::Role.eq(user::Role::Admin)),
            )
            .find_also_related(NotificationPreference)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All admins, with their preferences.
    pub async fn find_admins(&self) -> AppResult<Vec<UserWithPreferences>> {
        User::find()
            .filter(user::Column::Role.eq(user::Role::Admin))
            .find_also_related(NotificationPreference)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Users by IDs, with their preferences.
    pub async fn find_by_ids_with_preferences(
        &self,
        ids: &[String],
    ) -> AppResult<Vec<UserWithPreferences>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .find_also_related(NotificationPreference)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_user(id: &str, club: &str, role: user::Role) -> user::Model {
        user::Model {
            id: id.to_string(),
            name: format!("User {id}"),
            email: format!("{id}@example.com"),
            club: club.to_string(),
            role,
            microsite: None,
            photo: None,
            token: format!("token_{id}"),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let user = create_test_user("user1", "chess", user::Role::User);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_id("user1").await.unwrap();

        assert_eq!(result, Some(user));
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::UserNotFound(id)) if id == "missing"));
    }

    #[tokio::test]
    async fn test_find_by_token() {
        let user = create_test_user("user1", "chess", user::Role::User);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_token("token_user1").await.unwrap();

        assert_eq!(result.unwrap().id, "user1");
    }

    #[tokio::test]
    async fn test_find_admins_with_preferences() {
        let admin = create_test_user("admin1", "rowing", user::Role::Admin);
        let mut prefs = notification_preference::Model::defaults_for("admin1");
        prefs.notify_on_new_club_question = false;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[(admin.clone(), prefs.clone())]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_admins().await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0.id, "admin1");
        assert_eq!(result[0].1, Some(prefs));
    }

    #[tokio::test]
    async fn test_list_users() {
        let users = vec![
            create_test_user("user1", "chess", user::Role::User),
            create_test_user("user2", "chess", user::Role::User),
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([users])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let filter = UserFilter {
            club: Some("chess".to_string()),
            role: None,
        };
        let result = repo
            .list(&filter, Some(Sort::asc(UserSortField::Name)), Page::default())
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
    }
}
