//! Migration: weekly work logs. Durations are stored in whole minutes.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;
use super::m20240102_000002_create_activities::Activities;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WorkLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(WorkLogs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(WorkLogs::UserId).uuid().not_null())
                    .col(ColumnDef::new(WorkLogs::ActivityId).uuid().null())
                    .col(ColumnDef::new(WorkLogs::WeekStart).date().not_null())
                    .col(ColumnDef::new(WorkLogs::Minutes).integer().not_null())
                    .col(ColumnDef::new(WorkLogs::Notes).text().null())
                    .col(
                        ColumnDef::new(WorkLogs::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(WorkLogs::ApprovedBy).uuid().null())
                    .col(
                        ColumnDef::new(WorkLogs::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WorkLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(WorkLogs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_work_logs_user")
                            .from(WorkLogs::Table, WorkLogs::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_work_logs_activity")
                            .from(WorkLogs::Table, WorkLogs::ActivityId)
                            .to(Activities::Table, Activities::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_work_logs_approved_by")
                            .from(WorkLogs::Table, WorkLogs::ApprovedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_work_logs_user_week")
                    .table(WorkLogs::Table)
                    .col(WorkLogs::UserId)
                    .col(WorkLogs::WeekStart)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_work_logs_status")
                    .table(WorkLogs::Table)
                    .col(WorkLogs::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WorkLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum WorkLogs {
    Table,
    Id,
    UserId,
    ActivityId,
    WeekStart,
    Minutes,
    Notes,
    Status,
    ApprovedBy,
    ApprovedAt,
    CreatedAt,
    UpdatedAt,
}
