//! Answer repository.
//!
//! Answer writes also move the parent question's status; see
//! [`QuestionStatus`] for the transition rules.

use std::sync::Arc;

use super::question_scope_condition;
use crate::entities::{
    Answer, Question, answer, answer::AnswerStatus, question, question::QuestionStatus,
};
use crate::filters::{AnswerFilter, AnswerSortField, Page, Sort};
use clubdesk_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
    sea_query::{Expr, Order, Query},
};

/// Answer repository for database operations.
#[derive(Clone)]
pub struct AnswerRepository {
    db: Arc<DatabaseConnection>,
}

impl AnswerRepository {
    /// Create a new answer repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an answer by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<answer::Model>> {
        Answer::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an answer by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<answer::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::AnswerNotFound(id.to_string()))
    }

    /// Answers of a question, oldest first.
    pub async fn find_by_question(&self, question_id: &str) -> AppResult<Vec<answer::Model>> {
        Answer::find()
            .filter(answer::Column::QuestionId.eq(question_id))
            .order_by_asc(answer::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Answers of several questions, oldest first.
    pub async fn find_by_questions(&self, question_ids: &[String]) -> AppResult<Vec<answer::Model>> {
        if question_ids.is_empty() {
            return Ok(vec![]);
        }

        Answer::find()
            .filter(answer::Column::QuestionId.is_in(question_ids.to_vec()))
            .order_by_asc(answer::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Distinct IDs of the users who answered a question.
    pub async fn find_answerer_ids(&self, question_id: &str) -> AppResult<Vec<String>> {
        Answer::find()
            .select_only()
            .column(answer::Column::UserId)
            .distinct()
            .filter(answer::Column::QuestionId.eq(question_id))
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List answers matching a filter.
    pub async fn list(
        &self,
        filter: &AnswerFilter,
        sort: Option<Sort<AnswerSortField>>,
        page: Page,
    ) -> AppResult<Vec<answer::Model>> {
        let mut query = Answer::find();

        if let Some(condition) = question_scope_condition(&filter.scope) {
            // Only answers on questions the caller may read
            query = query.filter(
                answer::Column::QuestionId.in_subquery(
                    Query::select()
                        .column((Question, question::Column::Id))
                        .from(Question)
                        .cond_where(condition)
                        .to_owned(),
                ),
            );
        }
        if let Some(status) = filter.status {
            query = query.filter(answer::Column::Status.eq(status));
        }
        if let Some(question_id) = &filter.question_id {
            query = query.filter(answer::Column::QuestionId.eq(question_id.as_str()));
        }
        if let Some(user_id) = &filter.user_id {
            query = query.filter(answer::Column::UserId.eq(user_id.as_str()));
        }

        query = match sort {
            Some(Sort {
                field: AnswerSortField::CreatedAt,
                descending,
            }) => query.order_by(
                answer::Column::CreatedAt,
                if descending { Order::Desc } else { Order::Asc },
            ),
            None => query.order_by_desc(answer::Column::CreatedAt),
        };

        query
            .offset(page.offset)
            .limit(page.limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert an answer and advance the question status.
    ///
    /// `question_status` is the parent question's status before the insert.
    /// Returns the new answer and the question status after it.
    pub async fn create(
        &self,
        model: answer::ActiveModel,
        question_status: QuestionStatus,
    ) -> AppResult<(answer::Model, QuestionStatus)> {
        let answer = model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let next = question_status.after_answer_created();
        if next != question_status {
            self.write_question_status(&answer.question_id, next).await?;
        }

        Ok((answer, next))
    }

    /// Update an answer's content or attachment.
    pub async fn update(&self, model: answer::ActiveModel) -> AppResult<answer::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Change an answer's status and move the question status with it.
    pub async fn set_status(
        &self,
        answer: answer::Model,
        status: AnswerStatus,
        modified_by: &str,
    ) -> AppResult<(answer::Model, QuestionStatus)> {
        let question_id = answer.question_id.clone();

        let mut active: answer::ActiveModel = answer.into();
        active.status = Set(status);
        active.modified_by = Set(Some(modified_by.to_string()));
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let updated = active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let next = QuestionStatus::after_answer_status_changed(status);
        self.write_question_status(&question_id, next).await?;

        Ok((updated, next))
    }

    /// Delete an answer and move the question status.
    ///
    /// `question_status` is the parent question's status before the delete.
    pub async fn delete(
        &self,
        answer: &answer::Model,
        question_status: QuestionStatus,
    ) -> AppResult<QuestionStatus> {
        Answer::delete_by_id(answer.id.as_str())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let remaining = Answer::find()
            .filter(answer::Column::QuestionId.eq(answer.question_id.as_str()))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let next = question_status.after_answer_deleted(remaining, answer.status);
        if next != question_status {
            self.write_question_status(&answer.question_id, next).await?;
        }

        tracing::debug!(
            answer_id = %answer.id,
            question_id = %answer.question_id,
            remaining,
            status = ?next,
            "Deleted answer"
        );

        Ok(next)
    }

    async fn write_question_status(&self, question_id: &str, status: QuestionStatus) -> AppResult<()> {
        Question::update_many()
            .col_expr(question::Column::Status, Expr::value(status))
            .filter(question::Column::Id.eq(question_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
