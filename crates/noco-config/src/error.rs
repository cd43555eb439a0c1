use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(noco_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(noco_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Failed to parse TOML: {0}")]
    #[diagnostic(code(noco_config::toml))]
    Toml(#[from] toml_edit::TomlError),

    #[error("Configuration file already exists: {}", .0.display())]
    #[diagnostic(
        code(noco_config::already_exists),
        help("Remove the existing config file or use a different location")
    )]
    ConfigAlreadyExists(PathBuf),

    #[error("Invalid base URL: {url}")]
    #[diagnostic(
        code(noco_config::invalid_base_url),
        help("Use an absolute URL such as https://app.nocodb.com")
    )]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("max_page_size must be greater than zero")]
    #[diagnostic(code(noco_config::zero_page_size))]
    ZeroPageSize,

    #[error("max_batch_size must be greater than zero")]
    #[diagnostic(code(noco_config::zero_batch_size))]
    ZeroBatchSize,

    #[error("Invalid duration: {0}")]
    #[diagnostic(
        code(noco_config::invalid_duration),
        help("Durations combine a number with s, m, h or d, e.g. 30s or 1m30s")
    )]
    InvalidDuration(String),

    #[error("Invalid value for {key}: {value}")]
    #[diagnostic(code(noco_config::invalid_env_value))]
    InvalidEnvValue { key: String, value: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(noco_config::io))]
    IoError(#[from] std::io::Error),

    #[error("Encountered unexpected TOML item: {0}")]
    #[diagnostic(code(noco_config::unexpected_toml_item))]
    UnexpectedTomlItem(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
