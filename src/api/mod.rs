//! HTTP surface: routing, bearer authentication, per-IP throttling and the
//! Swagger document. Handlers stay thin and forward the caller's [`Actor`]
//! to the service layer, which owns every permission decision.
//!
//! [`Actor`]: crate::domain::Actor

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
