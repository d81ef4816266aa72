//! Create question/category join table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QuestionCategory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuestionCategory::QuestionId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(QuestionCategory::CategoryId)
                            .string_len(32)
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(QuestionCategory::QuestionId)
                            .col(QuestionCategory::CategoryId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_category_question")
                            .from(QuestionCategory::Table, QuestionCategory::QuestionId)
                            .to(Question::Table, Question::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_category_category")
                            .from(QuestionCategory::Table, QuestionCategory::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: category_id (questions in a category)
        manager
            .create_index(
                Index::create()
                    .name("idx_question_category_category_id")
                    .table(QuestionCategory::Table)
                    .col(QuestionCategory::CategoryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QuestionCategory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum QuestionCategory {
    Table,
    QuestionId,
    CategoryId,
}

#[derive(Iden)]
enum Question {
    Table,
    Id,
}

#[derive(Iden)]
enum Category {
    Table,
    Id,
}
