//! Business logic services.

#![allow(missing_docs)]

pub mod answer;
pub mod answer_vote;
pub mod category;
pub mod email;
pub mod file;
pub mod localization;
pub mod notification;
pub mod question;
pub mod recipients;
pub mod user;

pub use answer::{AnswerService, AnswerView, CreateAnswerInput, SetAnswerStatusInput, UpdateAnswerInput};
pub use answer_vote::{AnswerVoteService, VoteState};
pub use category::CategoryService;
pub use email::{BatchReport, EmailMessage, LogMailer, Mailer, RecordingMailer, SmtpMailer, send_batch};
pub use file::{FileContent, FileService};
pub use localization::{Locale, Localizer, Template};
pub use notification::{NotificationEvent, NotificationService};
pub use question::{CreateQuestionInput, QuestionService, QuestionView, UpdateQuestionInput};
pub use recipients::Recipient;
pub use user::{CreateUserInput, UpdatePreferencesInput, UserService};

use clubdesk_common::{AppError, AppResult};
use clubdesk_db::entities::{question as question_entity, user as user_entity};
use clubdesk_db::filters::QuestionScope;
use serde::{Deserialize, Deserializer};

/// Which questions a caller may read.
pub(crate) fn scope_for(viewer: Option<&user_entity::Model>) -> QuestionScope {
    match viewer {
        None => QuestionScope::PublicOnly,
        Some(user) if user.is_admin() => QuestionScope::All,
        Some(user) => QuestionScope::PublicOrAuthoredBy(user.id.clone()),
    }
}

/// Hide questions the caller may not read behind a not-found error.
pub(crate) fn ensure_visible(question: &question_entity::Model, viewer: Option<&user_entity::Model>) -> AppResult<()> {
    if question.is_visible_to(viewer) {
        Ok(())
    } else {
        Err(AppError::QuestionNotFound(question.id.clone()))
    }
}

/// Only the owner or an admin may change a resource.
pub(crate) fn ensure_owner_or_admin(actor: &user_entity::Model, owner_id: &str, what: &str) -> AppResult<()> {
    if actor.is_admin() || actor.id == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Only the author or an admin can modify this {what}")))
    }
}

pub(crate) fn ensure_admin(actor: &user_entity::Model) -> AppResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin role required".to_string()))
    }
}

/// Tell an explicit `null` apart from a missing field.
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use clubdesk_db::entities::{answer, question, user};

    pub fn user(id: &str, club: &str, role: user::Role) -> user::Model {
        user::Model {
            id: id.to_string(),
            name: format!("User {id}"),
            email: format!("{id}@example.com"),
            club: club.to_string(),
            role,
            microsite: None,
            photo: None,
            token: format!("token-{id}"),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    pub fn question(id: &str, user_id: &str) -> question::Model {
        question::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: "Wifi down".to_string(),
            content: "Cannot connect".to_string(),
            visibility: question::Visibility::Public,
            status: question::QuestionStatus::Open,
            attachment: None,
            modified_by: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    pub fn answer(id: &str, question_id: &str, user_id: &str) -> answer::Model {
        answer::Model {
            id: id.to_string(),
            question_id: question_id.to_string(),
            user_id: user_id.to_string(),
            content: "Restart the router".to_string(),
            status: answer::AnswerStatus::Pending,
            attachment: None,
            modified_by: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubdesk_db::entities::{question::Visibility, user::Role};

    #[test]
    fn test_scope_for_callers() {
        assert_eq!(scope_for(None), QuestionScope::PublicOnly);
        assert_eq!(
            scope_for(Some(&fixtures::user("u1", "chess", Role::User))),
            QuestionScope::PublicOrAuthoredBy("u1".to_string())
        );
        assert_eq!(
            scope_for(Some(&fixtures::user("a1", "chess", Role::Admin))),
            QuestionScope::All
        );
    }

    #[test]
    fn test_private_question_hidden_from_others() {
        let mut question = fixtures::question("q1", "author");
        question.visibility = Visibility::Private;

        let author = fixtures::user("author", "chess", Role::User);
        let other = fixtures::user("other", "chess", Role::User);
        let admin = fixtures::user("admin", "go", Role::Admin);

        assert!(ensure_visible(&question, Some(&author)).is_ok());
        assert!(ensure_visible(&question, Some(&admin)).is_ok());
        assert!(matches!(
            ensure_visible(&question, Some(&other)),
            Err(AppError::QuestionNotFound(_))
        ));
        assert!(ensure_visible(&question, None).is_err());
    }

    #[test]
    fn test_owner_or_admin() {
        let owner = fixtures::user("u1", "chess", Role::User);
        let other = fixtures::user("u2", "chess", Role::User);
        let admin = fixtures::user("a1", "go", Role::Admin);

        assert!(ensure_owner_or_admin(&owner, "u1", "question").is_ok());
        assert!(ensure_owner_or_admin(&admin, "u1", "question").is_ok());
        assert!(matches!(
            ensure_owner_or_admin(&other, "u1", "question"),
            Err(AppError::Forbidden(_))
        ));
        assert!(ensure_admin(&owner).is_err());
    }
}
