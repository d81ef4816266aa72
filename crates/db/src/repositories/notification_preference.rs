//! Notification preference repository.

use std::sync::Arc;

use crate::entities::{NotificationPreference, notification_preference};
use clubdesk_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait};

/// Notification preference repository for database operations.
#[derive(Clone)]
pub struct NotificationPreferenceRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationPreferenceRepository {
    /// Create a new notification preference repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the preferences of a user.
    pub async fn find_by_user_id(
        &self,
        user_id: &str,
    ) -> AppResult<Option<notification_preference::Model>> {
        NotificationPreference::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Preferences of a user, or the all-enabled defaults when no row exists.
    pub async fn get_or_default(&self, user_id: &str) -> AppResult<notification_preference::Model> {
        Ok(self
            .find_by_user_id(user_id)
            .await?
            .unwrap_or_else(|| notification_preference::Model::defaults_for(user_id)))
    }

    /// Insert a preference row.
    pub async fn create(
        &self,
        model: notification_preference::ActiveModel,
    ) -> AppResult<notification_preference::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a preference row.
    pub async fn update(
        &self,
        model: notification_preference::ActiveModel,
    ) -> AppResult<notification_preference::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
