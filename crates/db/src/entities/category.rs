//! Category entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Name as first submitted
    pub name: String,

    /// Lowercased name, used for lookups
    #[sea_orm(unique)]
    pub name_lower: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::question_category::Entity")]
    QuestionCategories,
}

impl Related<super::question_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuestionCategories.def()
    }
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        super::question_category::Relation::Question.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::question_category::Relation::Category.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
