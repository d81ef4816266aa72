//! Answer service.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use clubdesk_common::{AppError, AppResult, IdGenerator};
use clubdesk_db::entities::{
    answer::{self, AnswerStatus},
    question::{self, QuestionStatus},
    user,
};
use clubdesk_db::repositories::{AnswerRepository, AnswerVoteRepository, QuestionRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::{
    FileService, NotificationEvent, NotificationService, deserialize_some, ensure_admin,
    ensure_owner_or_admin, ensure_visible, scope_for,
};
use crate::query::{Answers, ListQuery};

/// Input for answering a question.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnswerInput {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    pub attachment: Option<String>,
}

/// Partial answer update. `attachment: null` removes the attachment.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAnswerInput {
    #[validate(length(min = 1, max = 2000))]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub attachment: Option<Option<String>>,
}

/// Admin input for moving an answer between statuses.
#[derive(Debug, Deserialize)]
pub struct SetAnswerStatusInput {
    pub status: AnswerStatus,
}

/// An answer with its vote tally as seen by one caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerView {
    pub answer: answer::Model,
    pub votes: u64,
    /// Whether the caller voted for it.
    pub voted: bool,
}

/// Service for answers.
#[derive(Clone)]
pub struct AnswerService {
    question_repo: QuestionRepository,
    answer_repo: AnswerRepository,
    vote_repo: AnswerVoteRepository,
    files: FileService,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl AnswerService {
    /// Create a new answer service.
    #[must_use]
    pub const fn new(
        question_repo: QuestionRepository,
        answer_repo: AnswerRepository,
        vote_repo: AnswerVoteRepository,
        files: FileService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            question_repo,
            answer_repo,
            vote_repo,
            files,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Answer a question.
    ///
    /// The answer starts `pending`; an `open` question becomes `pending`.
    /// Returns the answer and the question status after the insert.
    pub async fn create(
        &self,
        author: &user::Model,
        question_id: &str,
        input: CreateAnswerInput,
    ) -> AppResult<(answer::Model, QuestionStatus)> {
        input.validate()?;

        let mut question = self.visible_question(Some(author), question_id).await?;
        if let Some(key) = &input.attachment {
            self.files.ensure_exists(key).await?;
        }

        let model = answer::ActiveModel {
            id: Set(self.id_gen.generate()),
            question_id: Set(question.id.clone()),
            user_id: Set(author.id.clone()),
            content: Set(input.content),
            status: Set(AnswerStatus::Pending),
            attachment: Set(input.attachment),
            modified_by: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        let (answer, status) = self.answer_repo.create(model, question.status).await?;
        question.status = status;

        tracing::info!(
            answer_id = %answer.id,
            question_id = %question.id,
            question_status = ?status,
            "Created answer"
        );

        self.notifications
            .dispatch(NotificationEvent::AnswerCreated {
                question,
                answer: answer.clone(),
            })
            .await;

        Ok((answer, status))
    }

    /// Get an answer with its votes.
    pub async fn get(&self, viewer: Option<&user::Model>, id: &str) -> AppResult<AnswerView> {
        let (answer, _) = self.visible_answer(viewer, id).await?;
        let mut views = self.with_votes(viewer, vec![answer]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::AnswerNotFound(id.to_string()))
    }

    /// Answers of one question, oldest first.
    pub async fn list_for_question(
        &self,
        viewer: Option<&user::Model>,
        question_id: &str,
    ) -> AppResult<Vec<AnswerView>> {
        let question = self.visible_question(viewer, question_id).await?;
        let answers = self.answer_repo.find_by_question(&question.id).await?;
        self.with_votes(viewer, answers).await
    }

    /// List answers on questions the viewer may read.
    pub async fn list(
        &self,
        viewer: Option<&user::Model>,
        mut query: ListQuery<Answers>,
    ) -> AppResult<Vec<AnswerView>> {
        query.filter.scope = scope_for(viewer);
        let answers = self
            .answer_repo
            .list(&query.filter, query.sort, query.page)
            .await?;
        self.with_votes(viewer, answers).await
    }

    /// Edit an answer's content or attachment.
    pub async fn update(
        &self,
        actor: &user::Model,
        id: &str,
        input: UpdateAnswerInput,
    ) -> AppResult<answer::Model> {
        input.validate()?;

        let (answer, question) = self.visible_answer(Some(actor), id).await?;
        ensure_owner_or_admin(actor, &answer.user_id, "answer")?;

        if let Some(Some(key)) = &input.attachment {
            self.files.ensure_exists(key).await?;
        }

        let mut active: answer::ActiveModel = answer.into();
        if let Some(content) = input.content {
            active.content = Set(content);
        }
        if let Some(attachment) = input.attachment {
            active.attachment = Set(attachment);
        }
        active.modified_by = Set(Some(actor.id.clone()));
        active.updated_at = Set(Some(Utc::now().into()));

        let answer = self.answer_repo.update(active).await?;
        tracing::info!(answer_id = %answer.id, modified_by = %actor.id, "Updated answer");

        self.notifications
            .dispatch(NotificationEvent::AnswerUpdated {
                question,
                answer: answer.clone(),
                modified_by: actor.id.clone(),
            })
            .await;

        Ok(answer)
    }

    /// Move an answer to another status. Admins only.
    ///
    /// Making an answer official resolves the question; any other status
    /// puts it back to `pending`.
    pub async fn set_status(
        &self,
        actor: &user::Model,
        id: &str,
        input: SetAnswerStatusInput,
    ) -> AppResult<(answer::Model, QuestionStatus)> {
        ensure_admin(actor)?;

        let (answer, mut question) = self.visible_answer(Some(actor), id).await?;
        let previous = answer.status;

        let (answer, status) = self
            .answer_repo
            .set_status(answer, input.status, &actor.id)
            .await?;
        question.status = status;

        tracing::info!(
            answer_id = %answer.id,
            from = ?previous,
            to = ?answer.status,
            question_status = ?status,
            "Changed answer status"
        );

        let event = if answer.status == AnswerStatus::Official && previous != AnswerStatus::Official {
            NotificationEvent::AnswerMarkedOfficial {
                question,
                answer: answer.clone(),
            }
        } else {
            NotificationEvent::AnswerUpdated {
                question,
                answer: answer.clone(),
                modified_by: actor.id.clone(),
            }
        };
        self.notifications.dispatch(event).await;

        Ok((answer, status))
    }

    /// Delete an answer and move the question status.
    ///
    /// Returns the question status after the delete.
    pub async fn delete(&self, actor: &user::Model, id: &str) -> AppResult<QuestionStatus> {
        let (answer, question) = self.visible_answer(Some(actor), id).await?;
        ensure_owner_or_admin(actor, &answer.user_id, "answer")?;

        self.answer_repo.delete(&answer, question.status).await
    }

    async fn visible_question(
        &self,
        viewer: Option<&user::Model>,
        question_id: &str,
    ) -> AppResult<question::Model> {
        let question = self.question_repo.get_by_id(question_id).await?;
        ensure_visible(&question, viewer)?;
        Ok(question)
    }

    /// Load an answer and its question, hiding answers on unreadable questions.
    async fn visible_answer(
        &self,
        viewer: Option<&user::Model>,
        id: &str,
    ) -> AppResult<(answer::Model, question::Model)> {
        let answer = self.answer_repo.get_by_id(id).await?;
        let question = self
            .question_repo
            .find_by_id(&answer.question_id)
            .await?
            .filter(|q| q.is_visible_to(viewer))
            .ok_or_else(|| AppError::AnswerNotFound(id.to_string()))?;
        Ok((answer, question))
    }

    async fn with_votes(
        &self,
        viewer: Option<&user::Model>,
        answers: Vec<answer::Model>,
    ) -> AppResult<Vec<AnswerView>> {
        if answers.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<String> = answers.iter().map(|a| a.id.clone()).collect();
        let counts: HashMap<String, u64> = self.vote_repo.count_by_answers(&ids).await?;
        let voted: HashSet<String> = match viewer {
            Some(user) => self.vote_repo.voted_answer_ids(&user.id, &ids).await?,
            None => HashSet::new(),
        };

        Ok(answers
            .into_iter()
            .map(|answer| AnswerView {
                votes: counts.get(&answer.id).copied().unwrap_or(0),
                voted: voted.contains(&answer.id),
                answer,
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::email::RecordingMailer;
    use crate::services::fixtures;
    use clubdesk_common::{FileRules, LocalStorage, config::NotificationConfig};
    use clubdesk_db::entities::user::Role;
    use clubdesk_db::repositories::UserRepository;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn build_service(db: MockDatabase) -> AnswerService {
        let db = Arc::new(db.into_connection());
        let files = FileService::new(
            Arc::new(LocalStorage::new(std::env::temp_dir().join("clubdesk-answer-tests"))),
            FileRules::new(1024),
        );
        let notifications = NotificationService::new(
            UserRepository::new(Arc::clone(&db)),
            AnswerRepository::new(Arc::clone(&db)),
            Arc::new(RecordingMailer::new()),
            NotificationConfig {
                locale: "en".to_string(),
                site_name: "Clubdesk".to_string(),
                site_url: "https://help.example.org".to_string(),
            },
        );
        AnswerService::new(
            QuestionRepository::new(Arc::clone(&db)),
            AnswerRepository::new(Arc::clone(&db)),
            AnswerVoteRepository::new(db),
            files,
            notifications,
        )
    }

    fn exec(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    fn content(text: String) -> CreateAnswerInput {
        CreateAnswerInput {
            content: text,
            attachment: None,
        }
    }

    #[tokio::test]
    async fn test_create_answer_rejects_long_content() {
        let author = fixtures::user("helper", "chess", Role::User);
        // No query results: validation must fail first
        let service = build_service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service
            .create(&author, "q1", content("a".repeat(2001)))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_answer_on_missing_question() {
        let author = fixtures::user("helper", "chess", Role::User);
        let service = build_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<question::Model>::new()]),
        );

        let result = service
            .create(&author, "missing", content("Restart it".to_string()))
            .await;
        assert!(matches!(result, Err(AppError::QuestionNotFound(_))));
    }

    #[tokio::test]
    async fn test_wifi_scenario_through_the_service() {
        let helper = fixtures::user("helper", "chess", Role::User);
        let admin = fixtures::user("admin", "rowing", Role::Admin);
        let question = fixtures::question("q1", "author");
        let answer = fixtures::answer("a1", "q1", "helper");

        // Answer posted: open -> pending
        let service = build_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[question.clone()]])
                .append_query_results([[answer.clone()]])
                .append_exec_results([exec(1)]),
        );
        let (created, status) = service
            .create(&helper, "q1", content("Restart the router".to_string()))
            .await
            .unwrap();
        assert_eq!(created.status, AnswerStatus::Pending);
        assert_eq!(status, QuestionStatus::Pending);

        // Marked official: pending -> resolved
        let mut pending_question = question.clone();
        pending_question.status = QuestionStatus::Pending;
        let mut official = answer.clone();
        official.status = AnswerStatus::Official;
        let service = build_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[answer.clone()]])
                .append_query_results([[pending_question]])
                .append_query_results([[official.clone()]])
                .append_exec_results([exec(1)]),
        );
        let (updated, status) = service
            .set_status(
                &admin,
                "a1",
                SetAnswerStatusInput {
                    status: AnswerStatus::Official,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, AnswerStatus::Official);
        assert_eq!(status, QuestionStatus::Resolved);

        // Official answer deleted, none left: resolved -> open
        let mut resolved_question = question;
        resolved_question.status = QuestionStatus::Resolved;
        let service = build_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[official]])
                .append_query_results([[resolved_question]])
                .append_query_results([[count_row(0)]])
                .append_exec_results([exec(1), exec(1)]),
        );
        let status = service.delete(&admin, "a1").await.unwrap();
        assert_eq!(status, QuestionStatus::Open);
    }

    #[tokio::test]
    async fn test_answer_on_resolved_question_keeps_it_resolved() {
        let helper = fixtures::user("helper", "chess", Role::User);
        let mut question = fixtures::question("q1", "author");
        question.status = QuestionStatus::Resolved;

        // No status write: only the insert result is needed
        let service = build_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[question]])
                .append_query_results([[fixtures::answer("a2", "q1", "helper")]]),
        );
        let (_, status) = service
            .create(&helper, "q1", content("Try channel 6".to_string()))
            .await
            .unwrap();
        assert_eq!(status, QuestionStatus::Resolved);
    }

    #[tokio::test]
    async fn test_archiving_official_answer_puts_question_back_to_pending() {
        let admin = fixtures::user("admin", "rowing", Role::Admin);
        let mut question = fixtures::question("q1", "author");
        question.status = QuestionStatus::Resolved;
        let mut official = fixtures::answer("a1", "q1", "helper");
        official.status = AnswerStatus::Official;
        let mut archived = official.clone();
        archived.status = AnswerStatus::Archived;

        let service = build_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[official]])
                .append_query_results([[question]])
                .append_query_results([[archived]])
                .append_exec_results([exec(1)]),
        );
        let (answer, status) = service
            .set_status(
                &admin,
                "a1",
                SetAnswerStatusInput {
                    status: AnswerStatus::Archived,
                },
            )
            .await
            .unwrap();
        assert_eq!(answer.status, AnswerStatus::Archived);
        assert_eq!(status, QuestionStatus::Pending);
    }

    #[tokio::test]
    async fn test_set_status_requires_admin() {
        let helper = fixtures::user("helper", "chess", Role::User);
        let service = build_service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = service
            .set_status(
                &helper,
                "a1",
                SetAnswerStatusInput {
                    status: AnswerStatus::Official,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_by_other_user_is_forbidden() {
        let other = fixtures::user("other", "chess", Role::User);
        let service = build_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fixtures::answer("a1", "q1", "helper")]])
                .append_query_results([[fixtures::question("q1", "author")]]),
        );

        let result = service
            .update(
                &other,
                "a1",
                UpdateAnswerInput {
                    content: Some("Actually no".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_answer_on_private_question_is_hidden() {
        let mut question = fixtures::question("q1", "author");
        question.visibility = question::Visibility::Private;
        let service = build_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fixtures::answer("a1", "q1", "helper")]])
                .append_query_results([[question]]),
        );

        let result = service.get(None, "a1").await;
        assert!(matches!(result, Err(AppError::AnswerNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_for_question_includes_votes() {
        let viewer = fixtures::user("viewer", "chess", Role::User);
        let first = fixtures::answer("a1", "q1", "helper");
        let second = fixtures::answer("a2", "q1", "other");

        let service = build_service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[fixtures::question("q1", "author")]])
                .append_query_results([[first, second]])
                .append_query_results([[BTreeMap::from([
                    ("answer_id", Value::String(Some(Box::new("a1".to_string())))),
                    ("votes", Value::BigInt(Some(3))),
                ])]])
                .append_query_results([[clubdesk_db::entities::answer_vote::Model {
                    user_id: "viewer".to_string(),
                    answer_id: "a1".to_string(),
                    created_at: Utc::now().into(),
                }]]),
        );

        let views = service.list_for_question(Some(&viewer), "q1").await.unwrap();

        assert_eq!(views.len(), 2);
        assert_eq!((views[0].votes, views[0].voted), (3, true));
        assert_eq!((views[1].votes, views[1].voted), (0, false));
    }
}
