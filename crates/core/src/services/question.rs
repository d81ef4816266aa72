//! Question service.

use std::collections::HashMap;

use chrono::Utc;
use clubdesk_common::{AppResult, IdGenerator};
use clubdesk_db::entities::{
    answer, category,
    question::{self, QuestionStatus, Visibility},
    user,
};
use clubdesk_db::repositories::{AnswerRepository, CategoryRepository, QuestionRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::{
    CategoryService, FileService, NotificationEvent, NotificationService, deserialize_some,
    ensure_owner_or_admin, ensure_visible, scope_for,
};
use crate::query::{ListQuery, Questions};

const fn default_visibility() -> Visibility {
    Visibility::Public
}

/// Input for asking a question.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    #[serde(default = "default_visibility")]
    pub visibility: Visibility,
    #[serde(default)]
    pub categories: Vec<String>,
    pub attachment: Option<String>,
}

/// Partial question update. `attachment: null` removes the attachment.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionInput {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub content: Option<String>,
    pub visibility: Option<Visibility>,
    pub categories: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub attachment: Option<Option<String>>,
}

/// A question with the relations that were asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub question: question::Model,
    pub categories: Option<Vec<category::Model>>,
    pub answers: Option<Vec<answer::Model>>,
}

/// Service for questions.
#[derive(Clone)]
pub struct QuestionService {
    question_repo: QuestionRepository,
    answer_repo: AnswerRepository,
    category_repo: CategoryRepository,
    categories: CategoryService,
    files: FileService,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl QuestionService {
    /// Create a new question service.
    #[must_use]
    pub fn new(
        question_repo: QuestionRepository,
        answer_repo: AnswerRepository,
        category_repo: CategoryRepository,
        files: FileService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            question_repo,
            answer_repo,
            categories: CategoryService::new(category_repo.clone()),
            category_repo,
            files,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Ask a question. It starts `open`; the author's club and the admins are
    /// notified.
    pub async fn create(
        &self,
        author: &user::Model,
        input: CreateQuestionInput,
    ) -> AppResult<QuestionView> {
        input.validate()?;
        if let Some(key) = &input.attachment {
            self.files.ensure_exists(key).await?;
        }
        let categories = self.categories.resolve(&input.categories).await?;

        let model = question::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(author.id.clone()),
            title: Set(input.title),
            content: Set(input.content),
            visibility: Set(input.visibility),
            status: Set(QuestionStatus::Open),
            attachment: Set(input.attachment),
            modified_by: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        let question = self.question_repo.create(model).await?;

        let category_ids: Vec<String> = categories.iter().map(|c| c.id.clone()).collect();
        self.category_repo
            .set_question_categories(&question.id, &category_ids)
            .await?;

        tracing::info!(question_id = %question.id, user_id = %author.id, "Created question");

        self.notifications
            .dispatch(NotificationEvent::QuestionCreated {
                question: question.clone(),
            })
            .await;

        Ok(QuestionView {
            question,
            categories: Some(categories),
            answers: None,
        })
    }

    /// Get a question with its categories.
    pub async fn get(&self, viewer: Option<&user::Model>, id: &str) -> AppResult<QuestionView> {
        let question = self.get_visible(viewer, id).await?;
        let categories = self.category_repo.find_by_question(&question.id).await?;

        Ok(QuestionView {
            question,
            categories: Some(categories),
            answers: None,
        })
    }

    /// Get a question the viewer may read.
    pub async fn get_visible(
        &self,
        viewer: Option<&user::Model>,
        id: &str,
    ) -> AppResult<question::Model> {
        let question = self.question_repo.get_by_id(id).await?;
        ensure_visible(&question, viewer)?;
        Ok(question)
    }

    /// List the questions the viewer may read.
    pub async fn list(
        &self,
        viewer: Option<&user::Model>,
        mut query: ListQuery<Questions>,
    ) -> AppResult<Vec<QuestionView>> {
        query.filter.scope = scope_for(viewer);
        let questions = self
            .question_repo
            .list(&query.filter, query.sort, query.page)
            .await?;

        let ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();
        let mut categories = if query.expands("categories") {
            Some(self.category_repo.find_by_questions(&ids).await?)
        } else {
            None
        };
        let mut answers = if query.expands("answers") {
            let mut by_question: HashMap<String, Vec<answer::Model>> = HashMap::new();
            for answer in self.answer_repo.find_by_questions(&ids).await? {
                by_question
                    .entry(answer.question_id.clone())
                    .or_default()
                    .push(answer);
            }
            Some(by_question)
        } else {
            None
        };

        Ok(questions
            .into_iter()
            .map(|question| QuestionView {
                categories: categories
                    .as_mut()
                    .map(|c| c.remove(&question.id).unwrap_or_default()),
                answers: answers
                    .as_mut()
                    .map(|a| a.remove(&question.id).unwrap_or_default()),
                question,
            })
            .collect())
    }

    /// Edit a question. Answerers and, for admin edits, the author are
    /// notified.
    pub async fn update(
        &self,
        actor: &user::Model,
        id: &str,
        input: UpdateQuestionInput,
    ) -> AppResult<QuestionView> {
        input.validate()?;

        let question = self.get_visible(Some(actor), id).await?;
        ensure_owner_or_admin(actor, &question.user_id, "question")?;

        if let Some(Some(key)) = &input.attachment {
            self.files.ensure_exists(key).await?;
        }
        let categories = match &input.categories {
            Some(names) => Some(self.categories.resolve(names).await?),
            None => None,
        };

        let mut active: question::ActiveModel = question.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(content) = input.content {
            active.content = Set(content);
        }
        if let Some(visibility) = input.visibility {
            active.visibility = Set(visibility);
        }
        if let Some(attachment) = input.attachment {
            active.attachment = Set(attachment);
        }
        active.modified_by = Set(Some(actor.id.clone()));
        active.updated_at = Set(Some(Utc::now().into()));

        let question = self.question_repo.update(active).await?;

        let categories = match categories {
            Some(categories) => {
                let ids: Vec<String> = categories.iter().map(|c| c.id.clone()).collect();
                self.category_repo
                    .set_question_categories(&question.id, &ids)
                    .await?;
                categories
            }
            None => self.category_repo.find_by_question(&question.id).await?,
        };

        tracing::info!(question_id = %question.id, modified_by = %actor.id, "Updated question");

        self.notifications
            .dispatch(NotificationEvent::QuestionUpdated {
                question: question.clone(),
                modified_by: actor.id.clone(),
            })
            .await;

        Ok(QuestionView {
            question,
            categories: Some(categories),
            answers: None,
        })
    }

    /// Delete a question with its answers, votes and category links.
    pub async fn delete(&self, actor: &user::Model, id: &str) -> AppResult<()> {
        let question = self.get_visible(Some(actor), id).await?;
        ensure_owner_or_admin(actor, &question.user_id, "question")?;

        self.question_repo.delete(&question.id).await?;
        tracing::info!(question_id = %question.id, deleted_by = %actor.id, "Deleted question");
        Ok(())
    }
}
