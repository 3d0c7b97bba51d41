use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating, reading or writing the configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The OS documents folder could not be resolved
    #[error("could not determine the user documents directory")]
    NoDocumentsDir,

    /// The file exists but cannot be read or does not match the schema
    #[error("configuration file {path} is unreadable: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    /// The file or its directory is missing or not writable
    #[error("failed to write configuration file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tracked name that cannot be used as a directory name
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}
