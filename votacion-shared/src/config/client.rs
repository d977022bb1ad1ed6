//! Client settings and how they are loaded.

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use strum::{Display, EnumString};
use tracing::debug;
use url::Url;

/// Deadline applied to every backend request, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

const DEFAULT_API_ROOT: &str = "http://localhost:3000/";
const DEFAULT_APP_BASE_URL: &str = "http://localhost:2025/";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors raised while loading or validating the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid for its format.
    #[error("failed to parse configuration file {path}: {message}")]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
    /// The file extension names no supported format.
    #[error("unsupported configuration format for {0}. Use 'yaml', 'json' or 'toml'.")]
    UnsupportedFormat(PathBuf),
    /// A setting holds a value the client cannot use.
    #[error("invalid value for {name}: {message}")]
    InvalidValue {
        /// Setting or environment variable name.
        name: String,
        /// What is wrong with the value.
        message: String,
    },
}

impl ConfigError {
    fn invalid(name: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Client configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Root of the REST backend (the `/api/...` paths are joined onto it).
    pub api_root: Url,

    /// Public address of the web client, used to build share links.
    pub app_base_url: Url,

    /// Per-request deadline in milliseconds.
    pub timeout_ms: u64,

    /// Directory holding the durable session storage.
    pub storage_dir: PathBuf,

    /// Default log level, used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Output format of the logs.
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Config {
    /// Generates a default configuration.
    ///
    /// # Panics
    /// Never in practice: the default URLs are compile-time constants that parse.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            api_root: Url::parse(DEFAULT_API_ROOT).expect("default API root parses"),
            app_base_url: Url::parse(DEFAULT_APP_BASE_URL).expect("default app URL parses"),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            storage_dir: default_storage_dir(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::Text,
        }
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// Values read from the file win over `VOTACION_*` environment variables,
    /// which only fill in settings still at their default. The API root
    /// override (command line) wins over both.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when the file cannot be read or parsed, an
    /// environment variable holds an invalid value, or validation fails.
    pub fn load_config(
        config_path: Option<&Path>,
        api_root_override: Option<Url>,
    ) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, api_root_override, |name| env::var(name).ok())
    }

    /// Same as [`load_config`](Self::load_config), reading variables through `lookup`.
    fn load_with_env(
        config_path: Option<&Path>,
        api_root_override: Option<Url>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::with_defaults();
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => defaults.clone(),
        };

        if config.api_root == defaults.api_root {
            if let Some(value) = lookup("VOTACION_API_ROOT") {
                config.api_root = parse_url("VOTACION_API_ROOT", &value)?;
            }
        }
        if config.app_base_url == defaults.app_base_url {
            if let Some(value) = lookup("VOTACION_APP_BASE_URL") {
                config.app_base_url = parse_url("VOTACION_APP_BASE_URL", &value)?;
            }
        }
        if config.timeout_ms == defaults.timeout_ms {
            if let Some(value) = lookup("VOTACION_TIMEOUT_MS") {
                config.timeout_ms = value.parse().map_err(|_| {
                    ConfigError::invalid("VOTACION_TIMEOUT_MS", "must be a number of milliseconds")
                })?;
            }
        }
        if config.storage_dir == defaults.storage_dir {
            if let Some(value) = lookup("VOTACION_STORAGE_DIR") {
                config.storage_dir = PathBuf::from(value);
            }
        }
        if config.log_level == defaults.log_level {
            if let Some(value) = lookup("VOTACION_LOG_LEVEL") {
                config.log_level = value;
            }
        }

        if let Some(api_root) = api_root_override {
            config.api_root = api_root;
        }

        config.api_root = with_trailing_slash(config.api_root);
        config.app_base_url = with_trailing_slash(config.app_base_url);
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "reading configuration file");
        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => {
                serde_yml::from_str(&content).map_err(|err| parse_error(err.to_string()))
            }
            Some("json") => {
                serde_json::from_str(&content).map_err(|err| parse_error(err.to_string()))
            }
            Some("toml") => toml::from_str(&content).map_err(|err| parse_error(err.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Checks the values that would make every request fail.
    ///
    /// # Errors
    /// Returns the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "timeout_ms",
                "must be greater than 0",
            ));
        }
        for (name, url) in [("api_root", &self.api_root), ("app_base_url", &self.app_base_url)] {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::invalid(name, "must be an http or https URL"));
            }
        }
        Ok(())
    }

    /// Link to the public voting page of a survey.
    ///
    /// The uuid is escaped as a single path segment.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] when `app_base_url` cannot carry a path.
    pub fn share_link(&self, uuid: &str) -> Result<Url, ConfigError> {
        let mut url = self.app_base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ConfigError::invalid("app_base_url", "cannot be a base URL"))?
            .pop_if_empty()
            .extend(["votacion", uuid]);
        Ok(url)
    }
}

/// Default location of the durable session storage.
#[must_use]
pub fn default_storage_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("votacion"))
        .unwrap_or_else(|| PathBuf::from("./.votacion"))
}

fn parse_url(name: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|err| ConfigError::invalid(name, err.to_string()))
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
