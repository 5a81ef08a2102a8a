//! Migration: skill catalog and volunteer assignments.

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
                    .table(Skills::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Skills::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Skills::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Skills::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Skills::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_skills_created_by")
                            .from(Skills::Table, Skills::CreatedBy)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SkillVolunteers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SkillVolunteers::SkillId).uuid().not_null())
                    .col(ColumnDef::new(SkillVolunteers::UserId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(SkillVolunteers::SkillId)
                            .col(SkillVolunteers::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_skill_volunteers_skill")
                            .from(SkillVolunteers::Table, SkillVolunteers::SkillId)
                            .to(Skills::Table, Skills::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_skill_volunteers_user")
                            .from(SkillVolunteers::Table, SkillVolunteers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SkillVolunteers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Skills::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Skills {
    Table,
    Id,
    Name,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SkillVolunteers {
    Table,
    SkillId,
    UserId,
}
