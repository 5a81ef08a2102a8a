//! Migration: activities, unique by title within a project.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;
use super::m20240102_000001_create_projects::Projects;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Activities::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Activities::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Activities::Title).string().not_null())
                    .col(ColumnDef::new(Activities::Description).text().null())
                    .col(ColumnDef::new(Activities::Date).date().not_null())
                    .col(ColumnDef::new(Activities::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(Activities::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Activities::Status)
                            .string_len(16)
                            .not_null()
                            .default("planned"),
                    )
                    .col(
                        ColumnDef::new(Activities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Activities::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activities_project")
                            .from(Activities::Table, Activities::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activities_created_by")
                            .from(Activities::Table, Activities::CreatedBy)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_activities_project_title")
                    .table(Activities::Table)
                    .col(Activities::ProjectId)
                    .col(Activities::Title)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activities_date")
                    .table(Activities::Table)
                    .col(Activities::Date)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Activities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(super) enum Activities {
    Table,
    Id,
    Title,
    Description,
    Date,
    ProjectId,
    CreatedBy,
    Status,
    CreatedAt,
    UpdatedAt,
}
