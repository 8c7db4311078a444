//! Engine configuration

use std::{fs, path::Path};

use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ingest::PaperSettings, titles::AbbreviationTable, users::ActivityPolicy};

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the configuration file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Unknown IANA time zone name
    #[error("Unknown time zone {name:?}: {source}")]
    TimeZone {
        /// Configured name
        name: String,

        /// Lookup error
        source: jiff::Error,
    },
}

/// Engine configuration, usually loaded from YAML. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// IANA zone used for calendar dates; the system zone when absent
    pub time_zone: Option<String>,

    /// Paper flyer ingestion
    pub paper: PaperSettings,

    /// Product name abbreviations used for shortened titles
    pub abbreviations: AbbreviationTable,

    /// User activity thresholds
    pub activity: ActivityPolicy,
}

impl EngineConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_norway::from_str(contents)?)
    }

    /// Resolve the configured time zone
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::TimeZone`] if the name is not in the time zone database.
    pub fn time_zone(&self) -> Result<TimeZone, ConfigError> {
        let Some(name) = self.time_zone.as_deref() else {
            return Ok(TimeZone::system());
        };

        TimeZone::get(name).map_err(|source| ConfigError::TimeZone {
            name: name.to_string(),
            source,
        })
    }
}
