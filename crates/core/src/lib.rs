pub mod config;
pub mod domain;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LlmConfig, LoadOptions, LoggingConfig};
pub use domain::context::ActivityContext;
pub use domain::extraction::ExtractionResult;
pub use domain::message::{Message, Role};
