use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};
use toml_edit::DocumentMut;
use tracing::{debug, info};
use url::Url;

use crate::{
    annotations::annotate_toml_table,
    error::{ConfigError, Result},
    utils::{parse_duration, xdg_config_home},
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_MAX_PAGE_SIZE: usize = 100;
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Client configuration
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Config {
    /// Base URL of the service, without the `api/v2` suffix.
    /// Default: http://localhost:8080
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Largest number of records requested in one page.
    /// The service rejects larger pages.
    /// Default: 100
    pub max_page_size: Option<usize>,

    /// Largest number of records sent in one bulk write.
    /// Default: 100
    pub max_batch_size: Option<usize>,

    /// Timeout for a whole request, e.g. "30s" or "1m30s".
    /// Default: no timeout
    pub timeout: Option<String>,

    /// Maximum number of redirects to follow.
    /// Default: the HTTP agent's own default
    pub max_redirects: Option<u32>,

    /// User agent sent with every request.
    /// Default: noco/<version>
    pub user_agent: Option<String>,

    /// Static headers attached verbatim to every request,
    /// e.g. the service token as `xc-token`.
    pub headers: Option<BTreeMap<String, String>>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

pub fn default_user_agent() -> String {
    format!("noco/{}", env!("CARGO_PKG_VERSION"))
}

/// Location of the configuration file.
///
/// `$NOCO_CONFIG` wins; otherwise `noco/config.toml` under the XDG config
/// directory.
pub fn config_path() -> PathBuf {
    match env::var("NOCO_CONFIG") {
        Ok(path) => PathBuf::from(path),
        Err(_) => xdg_config_home().join("noco").join("config.toml"),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            max_page_size: Some(DEFAULT_MAX_PAGE_SIZE),
            max_batch_size: Some(DEFAULT_MAX_BATCH_SIZE),
            timeout: None,
            max_redirects: None,
            user_agent: Some(default_user_agent()),
            headers: None,
        }
    }
}

impl Config {
    /// Loads the configuration from [`config_path`].
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Loads the configuration from `path`, then applies environment
    /// overrides and resolves defaults. A missing file yields the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                Self::default()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.apply_env_overrides()?;
        config.resolve()?;

        Ok(config)
    }

    /// Parses and resolves a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.resolve()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(url) = env::var("NOCO_BASE_URL") {
            self.base_url = url;
        }
        if let Some(size) = env_usize("NOCO_PAGE_SIZE")? {
            self.max_page_size = Some(size);
        }
        if let Some(size) = env_usize("NOCO_BATCH_SIZE")? {
            self.max_batch_size = Some(size);
        }
        Ok(())
    }

    /// Fills unset values with their defaults and validates the rest.
    pub fn resolve(&mut self) -> Result<()> {
        let trimmed = self.base_url.trim_end_matches('/').to_string();
        Url::parse(&trimmed).map_err(|source| {
            ConfigError::InvalidBaseUrl {
                url: self.base_url.clone(),
                source,
            }
        })?;
        self.base_url = trimmed;

        if *self.max_page_size.get_or_insert(DEFAULT_MAX_PAGE_SIZE) == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if *self.max_batch_size.get_or_insert(DEFAULT_MAX_BATCH_SIZE) == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }

        self.timeout_duration()?;
        self.user_agent.get_or_insert_with(default_user_agent);

        Ok(())
    }

    pub fn page_size(&self) -> usize {
        self.max_page_size.unwrap_or(DEFAULT_MAX_PAGE_SIZE)
    }

    pub fn batch_size(&self) -> usize {
        self.max_batch_size.unwrap_or(DEFAULT_MAX_BATCH_SIZE)
    }

    pub fn timeout_duration(&self) -> Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|value| {
                parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration(value.into()))
            })
            .transpose()
    }

    pub fn to_annotated_document(&self) -> Result<DocumentMut> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut doc = toml_string.parse::<DocumentMut>()?;

        annotate_toml_table::<Config>(doc.as_table_mut(), true)?;

        Ok(doc)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let serialized = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serialized)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Writes the default configuration, annotated with field docs, to `path`.
/// Refuses to overwrite an existing file.
pub fn generate_default_config(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Err(ConfigError::ConfigAlreadyExists(path.to_path_buf()));
    }

    let annotated_doc = Config::default().to_annotated_document()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, annotated_doc.to_string())?;
    info!(
        "Default configuration file generated with documentation at: {}",
        path.display()
    );
    Ok(())
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map(Some).map_err(|_| {
            ConfigError::InvalidEnvValue {
                key: key.to_string(),
                value,
            }
        }),
        Err(_) => Ok(None),
    }
}
