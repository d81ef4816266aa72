//! Answer vote repository.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::entities::{AnswerVote, answer_vote};
use clubdesk_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QuerySelect, Set, sea_query::Expr,
};

/// Number of votes on one answer.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct VoteCount {
    pub answer_id: String,
    pub votes: i64,
}

/// Answer vote repository for database operations.
#[derive(Clone)]
pub struct AnswerVoteRepository {
    db: Arc<DatabaseConnection>,
}

impl AnswerVoteRepository {
    /// Create a new answer vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the vote a user cast on an answer.
    pub async fn find(
        &self,
        user_id: &str,
        answer_id: &str,
    ) -> AppResult<Option<answer_vote::Model>> {
        AnswerVote::find_by_id((user_id.to_string(), answer_id.to_string()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove the vote if it exists, cast it otherwise.
    ///
    /// Returns whether the user has a vote on the answer afterwards.
    pub async fn toggle(&self, user_id: &str, answer_id: &str) -> AppResult<bool> {
        if self.find(user_id, answer_id).await?.is_some() {
            AnswerVote::delete_by_id((user_id.to_string(), answer_id.to_string()))
                .exec(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(false);
        }

        let model = answer_vote::ActiveModel {
            user_id: Set(user_id.to_string()),
            answer_id: Set(answer_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    /// Vote counts keyed by answer ID. Answers without votes are absent.
    pub async fn count_by_answers(&self, answer_ids: &[String]) -> AppResult<HashMap<String, u64>> {
        if answer_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let counts = AnswerVote::find()
            .select_only()
            .column(answer_vote::Column::AnswerId)
            .column_as(Expr::col(answer_vote::Column::UserId).count(), "votes")
            .filter(answer_vote::Column::AnswerId.is_in(answer_ids.to_vec()))
            .group_by(answer_vote::Column::AnswerId)
            .into_model::<VoteCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(counts
            .into_iter()
            .map(|c| (c.answer_id, c.votes.max(0) as u64))
            .collect())
    }

    /// Which of `answer_ids` the user voted on.
    pub async fn voted_answer_ids(
        &self,
        user_id: &str,
        answer_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        if answer_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let votes = AnswerVote::find()
            .filter(answer_vote::Column::UserId.eq(user_id))
            .filter(answer_vote::Column::AnswerId.is_in(answer_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(votes.into_iter().map(|v| v.answer_id).collect())
    }
}
