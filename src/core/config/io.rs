use crate::core::config::data::{path_display, Config};
use crate::core::config::keys::CONFIG_KEYS;
use directories::ProjectDirs;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Errors that can occur when loading, validating or editing configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    Read {
        /// Path to the configuration file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the configuration file as valid TOML.
    Parse {
        /// Path to the configuration file with invalid TOML.
        path: PathBuf,
        /// The TOML deserialization error.
        source: toml::de::Error,
    },

    /// A split trigger is not a valid regular expression.
    InvalidTrigger {
        pattern: String,
        source: regex::Error,
    },

    /// No platform configuration directory could be determined.
    NoConfigDir,

    UnknownKey(String),

    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn display_path(path: &Path) -> String {
        path_display(path)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(
                    f,
                    "Failed to read config at {}: {}",
                    Self::display_path(path),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse config at {}: {}",
                    Self::display_path(path),
                    source
                )
            }
            ConfigError::InvalidTrigger { pattern, source } => {
                write!(f, "Invalid split trigger `{pattern}`: {source}")
            }
            ConfigError::NoConfigDir => write!(f, "Failed to determine config directory"),
            ConfigError::UnknownKey(key) => write!(
                f,
                "Unknown config key: {key} (expected one of: {})",
                CONFIG_KEYS.join(", ")
            ),
            ConfigError::InvalidValue { key, value, reason } => {
                write!(f, "Invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::InvalidTrigger { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Config, Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(config_path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
                path: config_path.to_path_buf(),
                source,
            })?;
            let config: Config =
                toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: config_path.to_path_buf(),
                    source,
                })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path()?;
        self.save_to_path(&config_path)
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let parent = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };

        temp_file.write_all(contents.as_bytes())?;
        temp_file.as_file_mut().sync_all()?;
        temp_file
            .persist(config_path)
            .map_err(|err| -> Box<dyn std::error::Error> { Box::new(err) })?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let proj_dirs =
            ProjectDirs::from("org", "causette", "causette").ok_or(ConfigError::NoConfigDir)?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}
