//! Project configuration read from `waterui.toml`.

use std::{
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use waterui_bridge_core::BridgeConfig;

/// Environment variable overriding `logging.level`.
pub const LOG_ENV: &str = "WATERUI_LOG";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {}", path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The file is not valid configuration.
    #[error("failed to parse {}", path.display())]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// The log level is not one of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    #[error("unknown log level `{0}`")]
    InvalidLevel(String),
}

/// Contents of `waterui.toml` relevant to the bridge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Settings handed to every [`Bridge`](waterui_bridge_core::Bridge).
    #[serde(default)]
    pub bridge: BridgeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: Logging,
}

/// The `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logging {
    /// Minimum level printed when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

impl Config {
    /// Loads `waterui.toml` from `root`, applying [`LOG_ENV`].
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        Self::load_with_level(root, std::env::var(LOG_ENV).ok())
    }

    /// Like [`Config::load`], with an explicit level override instead of the
    /// environment.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load_with_level(root: &Path, level: Option<String>) -> Result<Self, ConfigError> {
        let path = Self::path(root);
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&path, &contents)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        if let Some(level) = level.filter(|level| !level.trim().is_empty()) {
            config.logging.level = level;
        }
        Ok(config)
    }

    fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Location of the configuration file under `root`.
    #[must_use]
    pub fn path(root: &Path) -> PathBuf {
        root.join("waterui.toml")
    }

    /// The configured level as a filter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLevel`] for an unknown level name.
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(self.logging.level.trim())
            .map_err(|_| ConfigError::InvalidLevel(self.logging.level.clone()))
    }

    /// Installs tracing at the configured level, along with the panic forwarder.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLevel`] for an unknown level name.
    pub fn install_logging(&self) -> Result<(), ConfigError> {
        crate::logging::install_tracing(self.level_filter()?);
        crate::logging::install_panic_forwarder();
        Ok(())
    }
}
