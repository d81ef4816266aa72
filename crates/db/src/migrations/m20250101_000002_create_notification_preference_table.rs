//! Create notification preference table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NotificationPreference::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NotificationPreference::UserId)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(flag(NotificationPreference::NotifyOnNewClubQuestion))
                    .col(flag(
                        NotificationPreference::NotifyOnRelatedQuestionModifiedByAuthor,
                    ))
                    .col(flag(
                        NotificationPreference::NotifyOnMyQuestionOrAnswerModifiedByAdmin,
                    ))
                    .col(flag(
                        NotificationPreference::NotifyOnNewAnswerInRelatedQuestion,
                    ))
                    .col(flag(
                        NotificationPreference::NotifyOnAnswerPublishedOnMyQuestion,
                    ))
                    .col(flag(
                        NotificationPreference::NotifyOnAnyOfficialAnswerInRelatedQuestion,
                    ))
                    .col(flag(
                        NotificationPreference::NotifyOnAnswerToMyQuestionMarkedOfficial,
                    ))
                    .col(
                        ColumnDef::new(NotificationPreference::UpdatedAt)
                            .timestamp_with_time_zone(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_preference_user")
                            .from(NotificationPreference::Table, NotificationPreference::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(NotificationPreference::Table)
                    .to_owned(),
            )
            .await
    }
}

fn flag(column: NotificationPreference) -> ColumnDef {
    ColumnDef::new(column)
        .boolean()
        .not_null()
        .default(true)
        .to_owned()
}

#[derive(Iden, Clone, Copy)]
enum NotificationPreference {
    Table,
    UserId,
    NotifyOnNewClubQuestion,
    NotifyOnRelatedQuestionModifiedByAuthor,
    NotifyOnMyQuestionOrAnswerModifiedByAdmin,
    NotifyOnNewAnswerInRelatedQuestion,
    NotifyOnAnswerPublishedOnMyQuestion,
    NotifyOnAnyOfficialAnswerInRelatedQuestion,
    NotifyOnAnswerToMyQuestionMarkedOfficial,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
