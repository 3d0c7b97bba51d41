use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by a backup run or recorded against a single target
#[derive(Debug, Error)]
pub enum BackupError {
    /// The game data root is missing, so the whole category is skipped
    #[error("source directory does not exist or is not a directory: {}", path.display())]
    SourceDirectoryMissing { path: PathBuf },

    #[error("source and target directories cannot be the same: {}", path.display())]
    SameSourceAndTarget { path: PathBuf },

    /// A name that would resolve outside its backup directory
    #[error("invalid target name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// A name that cannot be turned into a file pattern
    #[error("invalid file pattern for '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: globset::Error,
    },

    /// A destination directory could not be created, including a backup
    /// folder that already exists for the same second
    #[error("failed to create destination directory {}: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to copy {} for '{target}': {source}", file.display())]
    CopyFailed {
        target: String,
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write changelog {}: {source}", path.display())]
    Changelog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
