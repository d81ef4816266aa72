//! Create answer vote table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AnswerVote::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AnswerVote::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(AnswerVote::AnswerId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AnswerVote::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // One vote per user per answer
                    .primary_key(
                        Index::create()
                            .col(AnswerVote::UserId)
                            .col(AnswerVote::AnswerId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_answer_vote_user")
                            .from(AnswerVote::Table, AnswerVote::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_answer_vote_answer")
                            .from(AnswerVote::Table, AnswerVote::AnswerId)
                            .to(Answer::Table, Answer::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: answer_id (vote counts)
        manager
            .create_index(
                Index::create()
                    .name("idx_answer_vote_answer_id")
                    .table(AnswerVote::Table)
                    .col(AnswerVote::AnswerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AnswerVote::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AnswerVote {
    Table,
    UserId,
    AnswerId,
    CreatedAt,
}

#[derive(Iden)]
enum Answer {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
