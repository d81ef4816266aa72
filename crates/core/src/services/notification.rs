//! Notification dispatcher.
//!
//! Turns domain events into emails: loads the audiences, applies the rules in
//! [`super::recipients`], renders each email with a [`Localizer`] and sends the
//! batch. Nothing here ever fails the write that triggered it.

use std::sync::Arc;

use clubdesk_common::{AppResult, config::NotificationConfig};
use clubdesk_db::entities::{answer, question};
use clubdesk_db::repositories::{AnswerRepository, UserRepository, UserWithPreferences};

use super::email::{EmailMessage, Mailer, send_batch};
use super::localization::{Locale, Localizer, TemplateContext};
use super::recipients::{self, Recipient};

/// Something that happened and may warrant email.
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    QuestionCreated {
        question: question::Model,
    },
    QuestionUpdated {
        question: question::Model,
        modified_by: String,
    },
    AnswerCreated {
        question: question::Model,
        answer: answer::Model,
    },
    AnswerUpdated {
        question: question::Model,
        answer: answer::Model,
        modified_by: String,
    },
    AnswerMarkedOfficial {
        question: question::Model,
        answer: answer::Model,
    },
}

impl NotificationEvent {
    const fn name(&self) -> &'static str {
        match self {
            Self::QuestionCreated { .. } => "question_created",
            Self::QuestionUpdated { .. } => "question_updated",
            Self::AnswerCreated { .. } => "answer_created",
            Self::AnswerUpdated { .. } => "answer_updated",
            Self::AnswerMarkedOfficial { .. } => "answer_marked_official",
        }
    }

    const fn question(&self) -> &question::Model {
        match self {
            Self::QuestionCreated { question }
            | Self::QuestionUpdated { question, .. }
            | Self::AnswerCreated { question, .. }
            | Self::AnswerUpdated { question, .. }
            | Self::AnswerMarkedOfficial { question, .. } => question,
        }
    }
}

/// Computes recipients for events and emails them.
#[derive(Clone)]
pub struct NotificationService {
    user_repo: UserRepository,
    answer_repo: AnswerRepository,
    mailer: Arc<dyn Mailer>,
    config: NotificationConfig,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        answer_repo: AnswerRepository,
        mailer: Arc<dyn Mailer>,
        config: NotificationConfig,
    ) -> Self {
        Self {
            user_repo,
            answer_repo,
            mailer,
            config,
        }
    }

    /// Email everyone the event concerns.
    ///
    /// Returns the number of emails handed to the mailer successfully.
    /// Lookup and delivery errors are logged, never returned.
    pub async fn dispatch(&self, event: NotificationEvent) -> usize {
        let recipients = match self.recipients_for(&event).await {
            Ok(recipients) => recipients,
            Err(e) => {
                tracing::warn!(event = event.name(), error = %e, "Failed to resolve notification recipients");
                return 0;
            }
        };

        if recipients.is_empty() {
            return 0;
        }

        let localizer = Localizer::new(
            Locale::from_tag(&self.config.locale),
            self.config.site_name.as_str(),
            self.config.site_url.as_str(),
        );
        let question = event.question();
        let messages: Vec<EmailMessage> = recipients
            .iter()
            .map(|r| {
                let rendered = localizer.render(
                    r.template,
                    &TemplateContext {
                        recipient_name: &r.user.name,
                        question_id: &question.id,
                        question_title: &question.title,
                    },
                );
                EmailMessage {
                    to: r.user.email.clone(),
                    to_name: r.user.name.clone(),
                    subject: rendered.subject,
                    body: rendered.body,
                }
            })
            .collect();

        let report = send_batch(self.mailer.as_ref(), &messages).await;
        tracing::debug!(
            event = event.name(),
            question_id = %question.id,
            sent = report.sent,
            failed = report.failed,
            "Dispatched notifications"
        );
        report.sent
    }

    /// Load the audiences for an event and apply the recipient rules.
    pub async fn recipients_for(&self, event: &NotificationEvent) -> AppResult<Vec<Recipient>> {
        match event {
            NotificationEvent::QuestionCreated { question } => {
                let author = self.user_with_preferences(&question.user_id).await?;
                let audience = self
                    .user_repo
                    .find_club_members_or_admins(&author.0.club)
                    .await?;
                Ok(recipients::for_new_question(&author, &audience))
            }
            NotificationEvent::QuestionUpdated {
                question,
                modified_by,
            } => {
                let author = self.user_with_preferences(&question.user_id).await?;
                let answerers = self.answerers(&question.id).await?;
                Ok(recipients::for_question_updated(
                    question,
                    modified_by,
                    &author,
                    &answerers,
                ))
            }
            NotificationEvent::AnswerCreated { question, answer } => {
                let question_author = self.user_with_preferences(&question.user_id).await?;
                let answerers = self.answerers(&question.id).await?;
                let admins = self.user_repo.find_admins().await?;
                Ok(recipients::for_new_answer(
                    question,
                    answer,
                    &question_author,
                    &answerers,
                    &admins,
                ))
            }
            NotificationEvent::AnswerUpdated {
                question,
                answer,
                modified_by,
            } => {
                let answer_author = self.user_with_preferences(&answer.user_id).await?;
                let question_author = self.user_with_preferences(&question.user_id).await?;
                let answerers = self.answerers(&question.id).await?;
                let admins = self.user_repo.find_admins().await?;
                Ok(recipients::for_answer_updated(
                    answer,
                    modified_by,
                    &answer_author,
                    &question_author,
                    &answerers,
                    &admins,
                ))
            }
            NotificationEvent::AnswerMarkedOfficial { question, answer } => {
                let question_author = self.user_with_preferences(&question.user_id).await?;
                let mut ids = self.answer_repo.find_answerer_ids(&question.id).await?;
                if !ids.contains(&answer.user_id) {
                    ids.push(answer.user_id.clone());
                }
                let participants = self.user_repo.find_by_ids_with_preferences(&ids).await?;
                Ok(recipients::for_answer_marked_official(
                    question,
                    &question_author,
                    &participants,
                ))
            }
        }
    }

    async fn user_with_preferences(&self, user_id: &str) -> AppResult<UserWithPreferences> {
        self.user_repo
            .find_by_ids_with_preferences(&[user_id.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| clubdesk_common::AppError::UserNotFound(user_id.to_string()))
    }

    async fn answerers(&self, question_id: &str) -> AppResult<Vec<UserWithPreferences>> {
        let ids = self.answer_repo.find_answerer_ids(question_id).await?;
        self.user_repo.find_by_ids_with_preferences(&ids).await
    }
}
