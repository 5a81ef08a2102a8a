//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod activity;
pub mod document;
pub mod document_category;
pub mod document_resource_type;
pub mod notification;
pub mod password_reset_token;
pub mod project;
pub mod project_volunteer;
pub mod refresh_token;
pub mod skill;
pub mod skill_volunteer;
pub mod user;
pub mod work_log;
