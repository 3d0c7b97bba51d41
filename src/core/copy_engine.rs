use globset::{GlobBuilder, GlobMatcher};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::error::BackupError;
use super::paths::Kind;

#[derive(Debug, Default)]
pub struct CopyProgress {
    pub bytes_copied: u64,
    pub files_copied: u64,
    pub files_skipped: u64,
    pub failures: Vec<BackupError>,
}

/// Copies save files into a backup folder.
///
/// Existing destination files are never overwritten, and a failed copy is
/// recorded in the progress without stopping the remaining files.
#[derive(Debug, Default)]
pub struct CopyEngine;

impl CopyEngine {
    pub fn new() -> Self {
        Self
    }

    /// Matcher for `<name>.plr*` or `<name>.wld*`, applied to file names only
    pub fn save_file_matcher(kind: Kind, name: &str) -> Result<GlobMatcher, BackupError> {
        let pattern = format!("{}{}*", globset::escape(name), kind.extension());

        GlobBuilder::new(&pattern)
            .literal_separator(true)
            .case_insensitive(cfg!(windows))
            .build()
            .map(|glob| glob.compile_matcher())
            .map_err(|source| BackupError::InvalidPattern {
                name: name.to_string(),
                source,
            })
    }

    /// Copy the regular files directly inside `source_dir` whose name matches
    /// `matcher` into `target_dir`
    pub async fn copy_matching(
        &self,
        target: &str,
        source_dir: &Path,
        matcher: &GlobMatcher,
        target_dir: &Path,
        progress: &mut CopyProgress,
    ) {
        let files = match Self::list_files(source_dir).await {
            Ok(files) => files,
            Err(source) => {
                warn!("Cannot read source directory {}: {}", source_dir.display(), source);
                progress.failures.push(BackupError::CopyFailed {
                    target: target.to_string(),
                    file: source_dir.to_path_buf(),
                    source,
                });
                return;
            }
        };

        for file in files {
            let Some(file_name) = file.file_name() else {
                continue;
            };

            if matcher.is_match(Path::new(file_name)) {
                self.copy_file(target, &file, &target_dir.join(file_name), progress).await;
            }
        }
    }

    /// Copy every regular file directly inside `source_dir` into `target_dir`
    pub async fn copy_directory_files(
        &self,
        target: &str,
        source_dir: &Path,
        target_dir: &Path,
        progress: &mut CopyProgress,
    ) {
        let files = match Self::list_files(source_dir).await {
            Ok(files) => files,
            Err(source) => {
                warn!("Cannot read directory {}: {}", source_dir.display(), source);
                progress.failures.push(BackupError::CopyFailed {
                    target: target.to_string(),
                    file: source_dir.to_path_buf(),
                    source,
                });
                return;
            }
        };

        for file in files {
            if let Some(file_name) = file.file_name() {
                self.copy_file(target, &file, &target_dir.join(file_name), progress).await;
            }
        }
    }

    async fn copy_file(&self, target: &str, source: &Path, destination: &Path, progress: &mut CopyProgress) {
        if destination.exists() {
            debug!("Destination already exists, skipping: {}", destination.display());
            progress.files_skipped += 1;
            return;
        }

        match tokio::fs::copy(source, destination).await {
            Ok(bytes) => {
                info!("copy: {}", destination.display());
                progress.bytes_copied += bytes;
                progress.files_copied += 1;
            }
            Err(e) => {
                warn!("Failed to copy file {}: {}", source.display(), e);
                progress.failures.push(BackupError::CopyFailed {
                    target: target.to_string(),
                    file: source.to_path_buf(),
                    source: e,
                });
            }
        }
    }

    /// Regular files directly inside `dir`, sorted by path
    async fn list_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => files.push(entry.path()),
                Ok(_) => {}
                Err(e) => warn!("Cannot access file metadata {}: {}", entry.path().display(), e),
            }
        }

        files.sort();
        Ok(files)
    }
}
