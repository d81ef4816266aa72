//! Who gets an email for each notification event.
//!
//! Pure functions over already-loaded users and preferences. A user with no
//! stored preference row is treated as having every flag enabled. Each user
//! appears at most once per event; when several rules match, the first one
//! pushed wins, and the rules addressed to "my question" or "my answer" are
//! pushed first.

use std::collections::HashSet;

use clubdesk_db::entities::{answer, answer::AnswerStatus, notification_preference, question, user};
use clubdesk_db::repositories::UserWithPreferences;

use super::localization::Template;

/// One email to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub user: user::Model,
    pub template: Template,
}

/// Accumulates recipients, one per user.
#[derive(Debug, Default)]
struct RecipientSet {
    seen: HashSet<String>,
    recipients: Vec<Recipient>,
}

impl RecipientSet {
    fn push(&mut self, user: &user::Model, template: Template) {
        if self.seen.insert(user.id.clone()) {
            self.recipients.push(Recipient {
                user: user.clone(),
                template,
            });
        }
    }

    fn into_vec(self) -> Vec<Recipient> {
        self.recipients
    }
}

fn prefs_of(entry: &UserWithPreferences) -> notification_preference::Model {
    entry
        .1
        .clone()
        .unwrap_or_else(|| notification_preference::Model::defaults_for(&entry.0.id))
}

/// A question was created.
///
/// `audience` holds candidate club members and admins. The author always gets
/// a confirmation.
#[must_use]
pub fn for_new_question(
    author: &UserWithPreferences,
    audience: &[UserWithPreferences],
) -> Vec<Recipient> {
    let mut set = RecipientSet::default();
    set.push(&author.0, Template::NewQuestionConfirmation);

    for entry in audience {
        let candidate = &entry.0;
        if candidate.id == author.0.id {
            continue;
        }
        let in_scope = candidate.is_admin() || candidate.club == author.0.club;
        let wants = candidate.is_admin() || prefs_of(entry).notify_on_new_club_question;
        if in_scope && wants {
            set.push(candidate, Template::NewClubQuestion);
        }
    }

    set.into_vec()
}

/// A question was edited by `modifier_id`.
#[must_use]
pub fn for_question_updated(
    question: &question::Model,
    modifier_id: &str,
    author: &UserWithPreferences,
    answerers: &[UserWithPreferences],
) -> Vec<Recipient> {
    let mut set = RecipientSet::default();

    if modifier_id != question.user_id
        && prefs_of(author).notify_on_my_question_or_answer_modified_by_admin
    {
        set.push(&author.0, Template::QuestionModifiedByAdmin);
    }

    for entry in answerers {
        if entry.0.id != modifier_id && prefs_of(entry).notify_on_related_question_modified_by_author
        {
            set.push(&entry.0, Template::RelatedQuestionModified);
        }
    }

    set.into_vec()
}

/// An answer was edited by `modifier_id`.
///
/// Edits to an official answer go to every admin, the question author and
/// every answerer, regardless of preferences.
#[must_use]
pub fn for_answer_updated(
    answer: &answer::Model,
    modifier_id: &str,
    answer_author: &UserWithPreferences,
    question_author: &UserWithPreferences,
    answerers: &[UserWithPreferences],
    admins: &[UserWithPreferences],
) -> Vec<Recipient> {
    let mut set = RecipientSet::default();

    if modifier_id != answer.user_id
        && prefs_of(answer_author).notify_on_my_question_or_answer_modified_by_admin
    {
        set.push(&answer_author.0, Template::AnswerModifiedByAdmin);
    }

    if answer.status == AnswerStatus::Official {
        set.push(&question_author.0, Template::OfficialAnswerUpdated);
        for entry in admins.iter().chain(answerers) {
            set.push(&entry.0, Template::OfficialAnswerUpdated);
        }
    }

    set.into_vec()
}

/// A new answer was posted.
///
/// The answer's author never hears about their own answer.
#[must_use]
pub fn for_new_answer(
    question: &question::Model,
    answer: &answer::Model,
    question_author: &UserWithPreferences,
    answerers: &[UserWithPreferences],
    admins: &[UserWithPreferences],
) -> Vec<Recipient> {
    let mut set = RecipientSet::default();

    if question.user_id != answer.user_id
        && prefs_of(question_author).notify_on_answer_published_on_my_question
    {
        set.push(&question_author.0, Template::AnswerPublishedOnMyQuestion);
    }

    for entry in answerers.iter().chain(admins) {
        if entry.0.id != answer.user_id && prefs_of(entry).notify_on_new_answer_in_related_question {
            set.push(&entry.0, Template::NewAnswerInRelatedQuestion);
        }
    }

    set.into_vec()
}

/// An answer was marked official.
///
/// `participants` holds the official answer's author and every answerer.
#[must_use]
pub fn for_answer_marked_official(
    question: &question::Model,
    question_author: &UserWithPreferences,
    participants: &[UserWithPreferences],
) -> Vec<Recipient> {
    let mut set = RecipientSet::default();

    if prefs_of(question_author).notify_on_answer_to_my_question_marked_official {
        set.push(&question_author.0, Template::MyQuestionAnswerMarkedOfficial);
    }

    for entry in participants {
        if entry.0.id != question.user_id
            && prefs_of(entry).notify_on_any_official_answer_in_related_question
        {
            set.push(&entry.0, Template::OfficialAnswerInRelatedQuestion);
        }
    }

    set.into_vec()
}
