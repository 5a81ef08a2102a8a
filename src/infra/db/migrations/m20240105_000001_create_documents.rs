//! Migration: documents and their classification lookups.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(lookup_table(DocumentCategories::Table))
            .await?;
        manager
            .create_table(lookup_table(DocumentResourceTypes::Table))
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Documents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Documents::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Documents::UserId).uuid().not_null())
                    .col(ColumnDef::new(Documents::Filename).string().not_null())
                    .col(ColumnDef::new(Documents::Mimetype).string().not_null())
                    .col(ColumnDef::new(Documents::StoragePath).string().not_null())
                    .col(
                        ColumnDef::new(Documents::DocType)
                            .string_len(64)
                            .not_null()
                            .default("OTHER"),
                    )
                    .col(ColumnDef::new(Documents::CategoryId).uuid().null())
                    .col(ColumnDef::new(Documents::ResourceTypeId).uuid().null())
                    .col(ColumnDef::new(Documents::Description).text().null())
                    .col(
                        ColumnDef::new(Documents::Tags)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(ColumnDef::new(Documents::SizeBytes).big_integer().not_null())
                    .col(
                        ColumnDef::new(Documents::Downloads)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Documents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_documents_user")
                            .from(Documents::Table, Documents::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_documents_category")
                            .from(Documents::Table, Documents::CategoryId)
                            .to(DocumentCategories::Table, Lookup::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_documents_resource_type")
                            .from(Documents::Table, Documents::ResourceTypeId)
                            .to(DocumentResourceTypes::Table, Lookup::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Documents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DocumentResourceTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DocumentCategories::Table).to_owned())
            .await
    }
}

/// `(id, name unique)` table shared by categories and resource types.
fn lookup_table<T: IntoIden + 'static>(table: T) -> TableCreateStatement {
    Table::create()
        .table(table)
        .if_not_exists()
        .col(ColumnDef::new(Lookup::Id).uuid().not_null().primary_key())
        .col(ColumnDef::new(Lookup::Name).string().not_null().unique_key())
        .to_owned()
}

#[derive(DeriveIden)]
enum Lookup {
    Id,
    Name,
}

#[derive(DeriveIden)]
enum DocumentCategories {
    Table,
}

#[derive(DeriveIden)]
enum DocumentResourceTypes {
    Table,
}

#[derive(DeriveIden)]
enum Documents {
    Table,
    Id,
    UserId,
    Filename,
    Mimetype,
    StoragePath,
    DocType,
    CategoryId,
    ResourceTypeId,
    Description,
    Tags,
    SizeBytes,
    Downloads,
    CreatedAt,
}
