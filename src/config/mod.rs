//! Runtime settings read from the environment, plus fixed limits.

mod constants;
mod settings;

pub use constants::*;
pub use settings::Config;
