//! Repositories: thin persistence adapters over the entities.

mod answer;
mod answer_vote;
mod category;
mod notification_preference;
mod question;
mod user;

pub use answer::AnswerRepository;
pub use answer_vote::{AnswerVoteRepository, VoteCount};
pub use category::CategoryRepository;
pub use notification_preference::NotificationPreferenceRepository;
pub use question::QuestionRepository;
pub use user::{UserRepository, UserWithPreferences};

use crate::filters::QuestionScope;
use crate::entities::question::{self as question_entity, Visibility};
use sea_orm::{ColumnTrait, Condition};

/// Visibility condition on the question table for a caller scope.
///
/// `None` means no restriction.
pub(crate) fn question_scope_condition(scope: &QuestionScope) -> Option<Condition> {
    match scope {
        QuestionScope::All => None,
        QuestionScope::PublicOnly => {
            Some(Condition::all().add(question_entity::Column::Visibility.eq(Visibility::Public)))
        }
        QuestionScope::PublicOrAuthoredBy(user_id) => Some(
            Condition::any()
                .add(question_entity::Column::Visibility.eq(Visibility::Public))
                .add(question_entity::Column::UserId.eq(user_id.as_str())),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_scope_condition() {
        assert!(question_scope_condition(&QuestionScope::All).is_none());
        assert!(question_scope_condition(&QuestionScope::PublicOnly).is_some());
        assert!(
            question_scope_condition(&QuestionScope::PublicOrAuthoredBy("u1".to_string()))
                .is_some()
        );
    }
}
