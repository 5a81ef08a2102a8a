//! Voluntalia - volunteer management REST API.
//!
//! Coordinators run projects, project managers approve the hours their
//! volunteers log, and everyone shares documents and notifications.
//!
//! # Layers
//!
//! - **domain**: entities, the authorization table and work-log rules
//! - **services**: use cases, each running inside one unit of work
//! - **infra**: SeaORM repositories, migrations, rate limiting, file storage
//! - **api**: axum handlers, middleware, routes and the OpenAPI document
//! - **jobs**: e-mail delivery, in-process or through the apalis queue
//! - **cli** / **commands**: `serve`, `migrate` and `jobs`
//!
//! ```bash
//! voluntalia migrate up
//! voluntalia serve --port 4000
//! voluntalia jobs work
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod jobs;
pub mod services;
pub mod types;

pub use api::AppState;
pub use config::Config;
pub use domain::{Actor, Password, Role, User};
pub use errors::{AppError, AppResult};
