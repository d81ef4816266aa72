//! Question entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::answer::AnswerStatus;

/// Who can read a question.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[sea_orm(string_value = "public")]
    Public,
    #[sea_orm(string_value = "private")]
    Private,
}

/// Question status, derived from the answer lifecycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "resolved")]
    Resolved,
}

impl QuestionStatus {
    /// Status after an answer is posted.
    ///
    /// Only an `Open` question moves; pending and resolved ones keep their
    /// status.
    #[must_use]
    pub const fn after_answer_created(self) -> Self {
        match self {
            Self::Open => Self::Pending,
            other => other,
        }
    }

    /// Status after one of the question's answers changes status.
    #[must_use]
    pub const fn after_answer_status_changed(new_answer_status: AnswerStatus) -> Self {
        match new_answer_status {
            AnswerStatus::Official => Self::Resolved,
            AnswerStatus::Pending | AnswerStatus::Archived => Self::Pending,
        }
    }

    /// Status after an answer is deleted.
    ///
    /// Only the deleted answer's status and the remaining count are looked
    /// at: removing a non-official answer keeps the current status even if
    /// an official answer is among the survivors.
    #[must_use]
    pub const fn after_answer_deleted(self, remaining: u64, deleted_status: AnswerStatus) -> Self {
        if remaining == 0 {
            Self::Open
        } else if matches!(deleted_status, AnswerStatus::Official) {
            Self::Pending
        } else {
            self
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "question")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author user ID
    #[sea_orm(indexed)]
    pub user_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub visibility: Visibility,

    pub status: QuestionStatus,

    /// Attached file key
    #[sea_orm(nullable)]
    pub attachment: Option<String>,

    /// Last user to edit the question
    #[sea_orm(nullable)]
    pub modified_by: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether `user` may read this question.
    #[must_use]
    pub fn is_visible_to(&self, user: Option<&super::user::Model>) -> bool {
        match self.visibility {
            Visibility::Public => true,
            Visibility::Private => user.is_some_and(|u| u.is_admin() || u.id == self.user_id),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::answer::Entity")]
    Answers,

    #[sea_orm(has_many = "super::question_category::Entity")]
    QuestionCategories,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answers.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        super::question_category::Relation::Category.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::question_category::Relation::Question.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_answer_moves_open_to_pending() {
        assert_eq!(
            QuestionStatus::Open.after_answer_created(),
            QuestionStatus::Pending
        );
        assert_eq!(
            QuestionStatus::Pending.after_answer_created(),
            QuestionStatus::Pending
        );
        assert_eq!(
            QuestionStatus::Resolved.after_answer_created(),
            QuestionStatus::Resolved
        );
    }

    #[test]
    fn test_official_answer_resolves() {
        assert_eq!(
            QuestionStatus::after_answer_status_changed(AnswerStatus::Official),
            QuestionStatus::Resolved
        );
        assert_eq!(
            QuestionStatus::after_answer_status_changed(AnswerStatus::Pending),
            QuestionStatus::Pending
        );
        assert_eq!(
            QuestionStatus::after_answer_status_changed(AnswerStatus::Archived),
            QuestionStatus::Pending
        );
    }

    #[test]
    fn test_deleting_last_answer_reopens() {
        for status in [
            AnswerStatus::Pending,
            AnswerStatus::Official,
            AnswerStatus::Archived,
        ] {
            assert_eq!(
                QuestionStatus::Resolved.after_answer_deleted(0, status),
                QuestionStatus::Open
            );
        }
    }

    #[test]
    fn test_deleting_official_answer_with_survivors() {
        assert_eq!(
            QuestionStatus::Resolved.after_answer_deleted(2, AnswerStatus::Official),
            QuestionStatus::Pending
        );
    }

    #[test]
    fn test_deleting_non_official_answer_keeps_status() {
        // Even when the survivors include the official answer
        assert_eq!(
            QuestionStatus::Resolved.after_answer_deleted(1, AnswerStatus::Pending),
            QuestionStatus::Resolved
        );
        assert_eq!(
            QuestionStatus::Pending.after_answer_deleted(3, AnswerStatus::Archived),
            QuestionStatus::Pending
        );
    }

    #[test]
    fn test_wifi_scenario() {
        let status = QuestionStatus::Open;
        let status = status.after_answer_created();
        assert_eq!(status, QuestionStatus::Pending);
        let status = QuestionStatus::after_answer_status_changed(AnswerStatus::Official);
        assert_eq!(status, QuestionStatus::Resolved);
        let status = status.after_answer_deleted(0, AnswerStatus::Official);
        assert_eq!(status, QuestionStatus::Open);
    }
}
