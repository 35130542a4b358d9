//! Scholar Pulse core: publication stubs, canonical records, batch summaries, config.

pub mod config;
pub mod error;
pub mod models;

pub use config::AppConfig;
pub use error::{PulseError, Result};
pub use models::*;
