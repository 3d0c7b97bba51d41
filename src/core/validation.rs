use std::path::Path;
use tracing::debug;

use super::error::BackupError;
use super::paths::{kind_directory, Kind};

#[derive(Debug)]
pub struct ValidationResult {
    pub warnings: Vec<String>,
}

/// Preconditions for a backup run of `kind`.
///
/// A missing source root fails the whole run; anything that only affects
/// individual targets is reported as a warning.
pub async fn validate_run(source: &Path, target: &Path, kind: Kind) -> Result<ValidationResult, BackupError> {
    let mut warnings = Vec::new();

    debug!("Validating {} backup: {:?} -> {:?}", kind, source, target);

    match tokio::fs::metadata(source).await {
        Ok(metadata) if metadata.is_dir() => {}
        _ => {
            return Err(BackupError::SourceDirectoryMissing {
                path: source.to_path_buf(),
            });
        }
    }

    if source == target {
        return Err(BackupError::SameSourceAndTarget {
            path: source.to_path_buf(),
        });
    }

    let kind_dir = kind_directory(source, kind);
    if !kind_dir.is_dir() {
        warnings.push(format!("Source has no {} directory: {}", kind, kind_dir.display()));
    }

    if target.starts_with(source) {
        warnings.push(format!(
            "Target directory {} is inside the game data directory",
            target.display()
        ));
    }

    if target.exists() && !target.is_dir() {
        warnings.push(format!("Target path exists but is not a directory: {}", target.display()));
    }

    Ok(ValidationResult { warnings })
}
