//! Shared request/response types.

mod pagination;
mod patch;
mod response;

pub use pagination::{Paginated, PaginationMeta, PaginationParams, UserPage};
pub use patch::nullable;
pub use response::{Created, MessageResponse};
