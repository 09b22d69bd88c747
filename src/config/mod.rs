/// Configuration loading and validation
#[allow(clippy::module_inception)]
pub mod config;

pub use config::{Config, GenerationConfig, ReportsConfig, ServerConfig, SourceConfig};
