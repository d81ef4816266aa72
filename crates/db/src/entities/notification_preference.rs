//! Notification preference entity (one row per user, email opt-ins).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification_preference")]
pub struct Model {
    /// Same as user.id (1:1 relationship)
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    /// New question posted in my club
    #[sea_orm(default_value = true)]
    pub notify_on_new_club_question: bool,

    /// A question I answered was edited by its author
    #[sea_orm(default_value = true)]
    pub notify_on_related_question_modified_by_author: bool,

    /// Someone else (an admin) edited my question or answer
    #[sea_orm(default_value = true)]
    pub notify_on_my_question_or_answer_modified_by_admin: bool,

    /// New answer on a question I answered
    #[sea_orm(default_value = true)]
    pub notify_on_new_answer_in_related_question: bool,

    /// New answer on my question
    #[sea_orm(default_value = true)]
    pub notify_on_answer_published_on_my_question: bool,

    /// An answer became official on a question I answered
    #[sea_orm(default_value = true)]
    pub notify_on_any_official_answer_in_related_question: bool,

    /// An answer on my question became official
    #[sea_orm(default_value = true)]
    pub notify_on_answer_to_my_question_marked_official: bool,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Preferences a new user starts with: everything on.
    #[must_use]
    pub fn defaults_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            notify_on_new_club_question: true,
            notify_on_related_question_modified_by_author: true,
            notify_on_my_question_or_answer_modified_by_admin: true,
            notify_on_new_answer_in_related_question: true,
            notify_on_answer_published_on_my_question: true,
            notify_on_any_official_answer_in_related_question: true,
            notify_on_answer_to_my_question_marked_official: true,
            updated_at: None,
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
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
