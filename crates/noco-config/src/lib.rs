pub mod annotations;
pub mod config;
pub mod error;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

pub use config::{
    config_path, generate_default_config, Config, DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_PAGE_SIZE,
};
pub use error::{ConfigError, Result};
