//! Command-line interface.
//!
//! - `serve` - Start the HTTP server
//! - `migrate` - Database migrations
//! - `jobs` - E-mail queue worker and maintenance

pub mod args;

pub use args::{Cli, Commands};
