//! Migration: projects and their volunteer memberships.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Projects::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Projects::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Projects::Description).text().null())
                    .col(ColumnDef::new(Projects::ManagerId).uuid().null())
                    .col(ColumnDef::new(Projects::CreatedBy).uuid().not_null())
                    .col(ColumnDef::new(Projects::StartDate).date().null())
                    .col(ColumnDef::new(Projects::EndDate).date().null())
                    .col(
                        ColumnDef::new(Projects::Status)
                            .string_len(16)
                            .not_null()
                            .default("planned"),
                    )
                    .col(
                        ColumnDef::new(Projects::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Projects::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_manager")
                            .from(Projects::Table, Projects::ManagerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_projects_created_by")
                            .from(Projects::Table, Projects::CreatedBy)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_projects_manager")
                    .table(Projects::Table)
                    .col(Projects::ManagerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProjectVolunteers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ProjectVolunteers::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(ProjectVolunteers::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(ProjectVolunteers::AssignedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ProjectVolunteers::AssignedBy).uuid().null())
                    .primary_key(
                        Index::create()
                            .col(ProjectVolunteers::ProjectId)
                            .col(ProjectVolunteers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_volunteers_project")
                            .from(ProjectVolunteers::Table, ProjectVolunteers::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_volunteers_user")
                            .from(ProjectVolunteers::Table, ProjectVolunteers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_volunteers_assigned_by")
                            .from(ProjectVolunteers::Table, ProjectVolunteers::AssignedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_volunteers_user")
                    .table(ProjectVolunteers::Table)
                    .col(ProjectVolunteers::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProjectVolunteers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(super) enum Projects {
    Table,
    Id,
    Name,
    Description,
    ManagerId,
    CreatedBy,
    StartDate,
    EndDate,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ProjectVolunteers {
    Table,
    ProjectId,
    UserId,
    AssignedAt,
    AssignedBy,
}
