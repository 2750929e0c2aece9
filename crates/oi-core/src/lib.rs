pub mod app_config;
pub mod article;
pub mod config;
pub mod timestamp;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use article::{is_linkable_url, ArticleField, ArticleRow, UnknownFieldError};
pub use config::{load_app_config, load_app_config_from_env};
pub use timestamp::{format_timestamp, parse_timestamp};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
