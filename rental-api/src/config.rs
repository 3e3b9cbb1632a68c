//! Server configuration.
//!
//! Values come from, lowest priority first: built-in defaults, an optional
//! TOML file, then command-line flags. `RUST_LOG` overrides `log` when set.
//!
//! ```toml
//! bind = "127.0.0.1:8080"
//! backend = "sqlite"
//! database = "rental.db"
//! default_year = 2024
//! log = "info,rental_core=debug"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,

    /// Name of a registered repository backend.
    pub backend: String,

    /// Connection string handed to the backend.
    pub database: String,

    /// Fiscal year used when a request does not name one.
    pub default_year: i32,

    /// `EnvFilter` directive.
    pub log: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            backend: "sqlite".to_string(),
            database: "rental.db".to_string(),
            default_year: 2024,
            log: "info".to_string(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub bind: Option<String>,
    pub backend: Option<String>,
    pub database: Option<String>,
    pub default_year: Option<i32>,
    pub log: Option<String>,
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Defaults, then `path` if given, then `overrides`.
    pub fn load(
        path: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(overrides))
    }

    pub fn with_overrides(
        mut self,
        overrides: ConfigOverrides,
    ) -> Self {
        if let Some(bind) = overrides.bind {
            self.bind = bind;
        }
        if let Some(backend) = overrides.backend {
            self.backend = backend;
        }
        if let Some(database) = overrides.database {
            self.database = database;
        }
        if let Some(year) = overrides.default_year {
            self.default_year = year;
        }
        if let Some(log) = overrides.log {
            self.log = log;
        }
        self
    }
}
