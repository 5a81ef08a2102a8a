//! HTTP request handlers.

pub mod activity_handler;
pub mod auth_handler;
pub mod dashboard_handler;
pub mod document_handler;
pub mod health_handler;
pub mod notification_handler;
pub mod project_handler;
pub mod skill_handler;
pub mod user_handler;
pub mod work_log_handler;

pub use activity_handler::activity_routes;
pub use auth_handler::{auth_routes, session_routes};
pub use dashboard_handler::dashboard_routes;
pub use document_handler::document_routes;
pub use health_handler::{health, root};
pub use notification_handler::notification_routes;
pub use project_handler::project_routes;
pub use skill_handler::{skill_public_routes, skill_routes};
pub use user_handler::user_routes;
pub use work_log_handler::work_log_routes;
