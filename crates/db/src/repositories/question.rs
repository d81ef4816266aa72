//! Question repository.

use std::sync::Arc;

use super::question_scope_condition;
use crate::entities::{
    Category, Question, QuestionCategory, category, question, question_category,
};
use crate::filters::{Page, QuestionFilter, QuestionSortField, Sort};
use clubdesk_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
    sea_query::{Expr, Order, Query},
};

/// Question repository for database operations.
#[derive(Clone)]
pub struct QuestionRepository {
    db: Arc<DatabaseConnection>,
}

impl QuestionRepository {
    /// Create a new question repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a question by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<question::Model>> {
        Question::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a question by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<question::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::QuestionNotFound(id.to_string()))
    }

    /// Create a new question.
    pub async fn create(&self, model: question::ActiveModel) -> AppResult<question::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a question.
    pub async fn update(&self, model: question::ActiveModel) -> AppResult<question::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a question. Answers, votes and category links go with it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Question::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::QuestionNotFound(id.to_string()));
        }
        Ok(())
    }

    /// List questions matching a filter, newest first unless sorted otherwise.
    pub async fn list(
        &self,
        filter: &QuestionFilter,
        sort: Option<Sort<QuestionSortField>>,
        page: Page,
    ) -> AppResult<Vec<question::Model>> {
        let mut query = Question::find();

        if let Some(condition) = question_scope_condition(&filter.scope) {
            query = query.filter(condition);
        }
        if let Some(status) = filter.status {
            query = query.filter(question::Column::Status.eq(status));
        }
        if let Some(visibility) = filter.visibility {
            query = query.filter(question::Column::Visibility.eq(visibility));
        }
        if let Some(user_id) = &filter.user_id {
            query = query.filter(question::Column::UserId.eq(user_id.as_str()));
        }
        if let Some(name) = &filter.category {
            // Questions linked to the category with this (lowercased) name
            query = query.filter(
                question::Column::Id.in_subquery(
                    Query::select()
                        .column((QuestionCategory, question_category::Column::QuestionId))
                        .from(QuestionCategory)
                        .inner_join(
                            Category,
                            Expr::col((Category, category::Column::Id))
                                .equals((QuestionCategory, question_category::Column::CategoryId)),
                        )
                        .and_where(category::Column::NameLower.eq(name.to_lowercase()))
                        .to_owned(),
                ),
            );
        }

        query = match sort {
            Some(Sort { field, descending }) => {
                let column = match field {
                    QuestionSortField::CreatedAt => question::Column::CreatedAt,
                    QuestionSortField::UpdatedAt => question::Column::UpdatedAt,
                    QuestionSortField::Title => question::Column::Title,
                };
                query.order_by(column, if descending { Order::Desc } else { Order::Asc })
            }
            None => query.order_by_desc(question::Column::CreatedAt),
        };

        query
            .offset(page.offset)
            .limit(page.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::question::{QuestionStatus, Visibility};
    use crate::filters::QuestionScope;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_question(id: &str, user_id: &str, visibility: Visibility) -> question::Model {
        question::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: "Wifi down".to_string(),
            content: "Cannot connect".to_string(),
            visibility,
            status: QuestionStatus::Open,
            attachment: None,
            modified_by: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_found() {
        let question = create_test_question("q1", "user1", Visibility::Public);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[question.clone()]])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let result = repo.get_by_id("q1").await.unwrap();

        assert_eq!(result.title, "Wifi down");
        assert_eq!(result.status, QuestionStatus::Open);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<question::Model>::new()])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::QuestionNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_returns_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let result = repo.delete("missing").await;

        assert!(matches!(result, Err(AppError::QuestionNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_public_only() {
        let questions = vec![
            create_test_question("q2", "user1", Visibility::Public),
            create_test_question("q1", "user2", Visibility::Public),
        ];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([questions])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let filter = QuestionFilter {
            scope: QuestionScope::PublicOnly,
            category: Some("Network".to_string()),
            ..Default::default()
        };
        let result = repo.list(&filter, None, Page::default()).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "q2");
    }
}
