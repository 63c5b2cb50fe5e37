//! Utility modules for configuration, error handling, and startup tuning.

pub mod config;
pub mod errors;
pub mod limits;

pub use config::*;
pub use errors::*;
pub use limits::*;
