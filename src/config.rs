//! Configuration for the `icep` tooling
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (icep.toml)
//! - Environment variables (ICEP_*)
//!
//! ## Example config file (icep.toml):
//! ```toml
//! [schemas]
//! dir = "./schemas"
//!
//! [event_log]
//! sync = true
//!
//! [examples]
//! dir = "./examples"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IcepConfig {
    #[serde(default)]
    pub schemas: SchemasConfig,

    #[serde(default)]
    pub event_log: EventLogConfig,

    #[serde(default)]
    pub examples: ExamplesConfig,
}

/// Where the schema registry is loaded from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemasConfig {
    #[serde(default = "default_schema_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogConfig {
    /// fsync after every append
    #[serde(default = "default_true")]
    pub sync: bool,
}

/// Sample payloads checked by `check-examples`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamplesConfig {
    #[serde(default = "default_examples_dir")]
    pub dir: PathBuf,
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from("schemas")
}

fn default_examples_dir() -> PathBuf {
    PathBuf::from("examples")
}

fn default_true() -> bool {
    true
}

impl Default for SchemasConfig {
    fn default() -> Self {
        Self {
            dir: default_schema_dir(),
        }
    }
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self { sync: true }
    }
}

impl Default for ExamplesConfig {
    fn default() -> Self {
        Self {
            dir: default_examples_dir(),
        }
    }
}

impl IcepConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        for location in ["icep.toml", ".icep.toml", "config/icep.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "icep", "icep") {
            let xdg_config = dirs.config_dir().join("icep.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // ICEP_SCHEMAS__DIR, ICEP_EVENT_LOG__SYNC, ...
        builder = builder.add_source(
            Environment::with_prefix("ICEP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Schema directory, relative paths resolved against the working directory
    pub fn schema_dir(&self) -> PathBuf {
        absolute(&self.schemas.dir)
    }

    pub fn examples_dir(&self) -> PathBuf {
        absolute(&self.examples.dir)
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}
