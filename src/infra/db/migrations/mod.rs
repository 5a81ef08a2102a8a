//! Database migrations.
//!
//! Each migration is a separate module following SeaORM conventions.
//! Migration names follow the pattern: m{YYYYMMDD}_{NNNNNN}_{description}

use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users_table;
mod m20240101_000002_create_auth_tokens;
mod m20240102_000001_create_projects;
mod m20240102_000002_create_activities;
mod m20240103_000001_create_work_logs;
mod m20240104_000001_create_skills;
mod m20240105_000001_create_documents;
mod m20240106_000001_create_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_auth_tokens::Migration),
            Box::new(m20240102_000001_create_projects::Migration),
            Box::new(m20240102_000002_create_activities::Migration),
            Box::new(m20240103_000001_create_work_logs::Migration),
            Box::new(m20240104_000001_create_skills::Migration),
            Box::new(m20240105_000001_create_documents::Migration),
            Box::new(m20240106_000001_create_notifications::Migration),
        ]
    }
}
