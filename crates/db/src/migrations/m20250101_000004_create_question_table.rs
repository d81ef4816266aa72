//! Create question table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Question::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Question::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Question::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Question::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Question::Content).text().not_null())
                    .col(
                        ColumnDef::new(Question::Visibility)
                            .string_len(16)
                            .not_null()
                            .default("public"),
                    )
                    .col(
                        ColumnDef::new(Question::Status)
                            .string_len(16)
                            .not_null()
                            .default("open"),
                    )
                    .col(ColumnDef::new(Question::Attachment).string_len(64))
                    .col(ColumnDef::new(Question::ModifiedBy).string_len(32))
                    .col(
                        ColumnDef::new(Question::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Question::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_user")
                            .from(Question::Table, Question::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: user_id (questions by author)
        manager
            .create_index(
                Index::create()
                    .name("idx_question_user_id")
                    .table(Question::Table)
                    .col(Question::UserId)
                    .to_owned(),
            )
            .await?;

        // Index: status (filtering open/pending/resolved)
        manager
            .create_index(
                Index::create()
                    .name("idx_question_status")
                    .table(Question::Table)
                    .col(Question::Status)
                    .to_owned(),
            )
            .await?;

        // Index: created_at (default ordering)
        manager
            .create_index(
                Index::create()
                    .name("idx_question_created_at")
                    .table(Question::Table)
                    .col(Question::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Question::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Question {
    Table,
    Id,
    UserId,
    Title,
    Content,
    Visibility,
    Status,
    Attachment,
    ModifiedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
