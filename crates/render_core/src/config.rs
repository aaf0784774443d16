//! Configuration loading and saving
//!
//! Small file-backed configuration layer shared by anything in the crate that
//! carries tunable capacities. Supports TOML and RON, picked by file
//! extension.

use std::path::Path;

pub use serde::{Deserialize, Serialize};

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error while reading or writing the file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error in the file contents
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error while writing
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// File extension is not a supported configuration format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Trait for file-backed configuration types
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` or `.ron` file
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the file cannot be read, parsed, or has an
    /// unsupported extension.
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => {
                toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to a `.toml` or `.ron` file
    ///
    /// # Errors
    /// Returns [`ConfigError`] when serialization or the write fails, or the
    /// extension is unsupported.
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents)?;
        Ok(())
    }
}
