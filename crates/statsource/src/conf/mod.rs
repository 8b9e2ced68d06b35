//! Conf module — configuration model, loading, and checkpoint write-back.

pub mod model;
pub mod load;

pub use load::ConfigError;
pub use model::{AppConfig, ServerConfig};
