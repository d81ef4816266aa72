//! Answer votes.

use clubdesk_common::{AppError, AppResult};
use clubdesk_db::entities::user;
use clubdesk_db::repositories::{AnswerRepository, AnswerVoteRepository, QuestionRepository};
use serde::Serialize;

/// A caller's vote on an answer after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteState {
    pub voted: bool,
    pub votes: u64,
}

/// Service for voting on answers.
#[derive(Clone)]
pub struct AnswerVoteService {
    question_repo: QuestionRepository,
    answer_repo: AnswerRepository,
    vote_repo: AnswerVoteRepository,
}

impl AnswerVoteService {
    /// Create a new answer vote service.
    #[must_use]
    pub const fn new(
        question_repo: QuestionRepository,
        answer_repo: AnswerRepository,
        vote_repo: AnswerVoteRepository,
    ) -> Self {
        Self {
            question_repo,
            answer_repo,
            vote_repo,
        }
    }

    /// Cast the caller's vote, or take it back if already cast.
    pub async fn toggle(&self, voter: &user::Model, answer_id: &str) -> AppResult<VoteState> {
        let answer = self.answer_repo.get_by_id(answer_id).await?;
        let readable = self
            .question_repo
            .find_by_id(&answer.question_id)
            .await?
            .is_some_and(|q| q.is_visible_to(Some(voter)));
        if !readable {
            return Err(AppError::AnswerNotFound(answer_id.to_string()));
        }

        let voted = self.vote_repo.toggle(&voter.id, &answer.id).await?;
        let votes = self
            .vote_repo
            .count_by_answers(&[answer.id.clone()])
            .await?
            .get(&answer.id)
            .copied()
            .unwrap_or(0);

        tracing::debug!(answer_id = %answer.id, user_id = %voter.id, voted, votes, "Toggled vote");
        Ok(VoteState { voted, votes })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::fixtures;
    use chrono::Utc;
    use clubdesk_db::entities::{answer, answer_vote, question, user::Role};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn build_service(db: MockDatabase) -> AnswerVoteService {
        let db = Arc::new(db.into_connection());
        AnswerVoteService::new(
            QuestionRepository::new(Arc::clone(&db)),
            AnswerRepository::new(Arc::clone(&db)),
            AnswerVoteRepository::new(db),
        )
    }

    fn vote_count(answer_id: &str, votes: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            ("answer_id", Value::String(Some(Box::new(answer_id.to_string())))),
            ("votes", Value::BigInt(Some(votes))),
        ])
    }

    #[tokio::test]
    async fn test_toggle_twice_returns_to_no_vote() {
        let voter = fixtures::user("voter", "chess", Role::User);
        let answer = fixtures::answer("a1", "q1", "helper");
        let question = fixtures::question("q1", "author");
        let vote = answer_vote::Model {
            user_id: "voter".to_string(),
            answer_id: "a1".to_string(),
            created_at: Utc::now().into(),
        };

        let service = build_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                // first toggle: no vote yet, insert, one vote
                .append_query_results([[answer.clone()]])
                .append_query_results([[question.clone()]])
                .append_query_results([Vec::<answer_vote::Model>::new()])
                .append_query_results([[vote.clone()]])
                .append_query_results([[vote_count("a1", 1)]])
                // second toggle: vote found and removed, no votes left
                .append_query_results([[answer]])
                .append_query_results([[question]])
                .append_query_results([[vote]])
                .append_query_results([Vec::<BTreeMap<&'static str, Value>>::new()])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
        );

        let first = service.toggle(&voter, "a1").await.unwrap();
        assert_eq!(first, VoteState { voted: true, votes: 1 });

        let second = service.toggle(&voter, "a1").await.unwrap();
        assert_eq!(second, VoteState { voted: false, votes: 0 });
    }

    #[tokio::test]
    async fn test_toggle_on_missing_answer() {
        let voter = fixtures::user("voter", "chess", Role::User);
        let service = build_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<answer::Model>::new()]),
        );

        let result = service.toggle(&voter, "missing").await;
        assert!(matches!(result, Err(AppError::AnswerNotFound(_))));
    }

    #[tokio::test]
    async fn test_toggle_on_private_question_of_someone_else() {
        let voter = fixtures::user("voter", "chess", Role::User);
        let mut question = fixtures::question("q1", "author");
        question.visibility = question::Visibility::Private;

        let service = build_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fixtures::answer("a1", "q1", "helper")]])
                .append_query_results([[question]]),
        );

        let result = service.toggle(&voter, "a1").await;
        assert!(matches!(result, Err(AppError::AnswerNotFound(_))));
    }
}
