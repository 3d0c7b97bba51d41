use std::path::Path;
use tracing::{debug, error, info, warn};

use super::clock::{Clock, LocalClock};
use super::copy_engine::{CopyEngine, CopyProgress};
use super::error::BackupError;
use super::paths::{
    backup_folder_name, check_target_name, destination_path, kind_directory, source_file_path,
    target_directory, Kind,
};
use super::report::{RunReport, TargetOutcome, TargetStatus};
use super::validation::validate_run;
use crate::config::Configuration;

/// File written next to the world files by an interactive backup
pub const CHANGELOG_FILE_NAME: &str = "changelog.txt";

/// Runs backups for every configured player or world.
///
/// Targets are processed one after another; a target that is skipped or
/// fails never prevents the next one from being attempted.
pub struct BackupEngine<C: Clock = LocalClock> {
    copy_engine: CopyEngine,
    clock: C,
}

impl BackupEngine {
    pub fn new() -> Self {
        Self::with_clock(LocalClock)
    }
}

impl Default for BackupEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> BackupEngine<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            copy_engine: CopyEngine::new(),
            clock,
        }
    }

    pub async fn run_player_backups(&self, config: &Configuration) -> Result<RunReport, BackupError> {
        self.run(config, Kind::Players).await
    }

    pub async fn run_world_backups(&self, config: &Configuration) -> Result<RunReport, BackupError> {
        self.run(config, Kind::Worlds).await
    }

    /// Players then worlds; the world run is attempted even if the player
    /// run could not start
    pub async fn run_all(&self, config: &Configuration) -> Vec<(Kind, Result<RunReport, BackupError>)> {
        vec![
            (Kind::Players, self.run_player_backups(config).await),
            (Kind::Worlds, self.run_world_backups(config).await),
        ]
    }

    /// Back up every configured target of `kind`
    pub async fn run(&self, config: &Configuration, kind: Kind) -> Result<RunReport, BackupError> {
        info!(
            "Starting {} backup ({} -> {})",
            kind,
            config.source_directory.display(),
            config.target_directory.display()
        );

        self.check_run(config, kind).await?;

        let mut report = RunReport::new(kind);
        let targets = config.targets(kind);

        if targets.is_empty() {
            warn!("No {} configured for backup", kind.directory().to_lowercase());
            return Ok(report);
        }

        for name in targets {
            let outcome = self.backup_target(config, kind, name).await;
            report.outcomes.push(outcome);
        }

        info!(
            "{} backup finished: {} completed, {} skipped, {} failed",
            kind,
            report.completed(),
            report.skipped(),
            report.failed()
        );

        Ok(report)
    }

    /// Back up a single world and store `note` as its changelog
    pub async fn backup_world_with_changelog(
        &self,
        config: &Configuration,
        name: &str,
        note: &str,
    ) -> Result<TargetOutcome, BackupError> {
        self.check_run(config, Kind::Worlds).await?;

        let mut outcome = self.backup_target(config, Kind::Worlds, name).await;

        let note = note.trim();
        if note.is_empty() {
            return Ok(outcome);
        }

        if let TargetStatus::Completed { folder, failures, .. } = &mut outcome.status {
            let path = folder.join(CHANGELOG_FILE_NAME);
            let mut content = note.to_string();
            content.push('\n');

            match tokio::fs::write(&path, content).await {
                Ok(()) => info!("Changelog written: {}", path.display()),
                Err(source) => {
                    warn!("Failed to write changelog {}: {}", path.display(), source);
                    failures.push(BackupError::Changelog { path, source });
                }
            }
        }

        Ok(outcome)
    }

    /// Back up one target; never fails, the result is in the outcome
    pub async fn backup_target(&self, config: &Configuration, kind: Kind, name: &str) -> TargetOutcome {
        let status = match self.try_backup_target(config, kind, name).await {
            Ok(status) => status,
            Err(e) => {
                error!("Backup of {} '{}' failed: {}", kind.singular(), name, e);
                TargetStatus::Failed { error: e }
            }
        };

        TargetOutcome {
            name: name.to_string(),
            status,
        }
    }

    async fn check_run(&self, config: &Configuration, kind: Kind) -> Result<(), BackupError> {
        let validation = validate_run(&config.source_directory, &config.target_directory, kind)
            .await
            .inspect_err(|e| error!("{} backup skipped: {}", kind, e))?;

        for warning in &validation.warnings {
            warn!("Validation warning: {}", warning);
        }

        Ok(())
    }

    async fn try_backup_target(
        &self,
        config: &Configuration,
        kind: Kind,
        name: &str,
    ) -> Result<TargetStatus, BackupError> {
        check_target_name(name).map_err(|reason| BackupError::InvalidName {
            name: name.to_string(),
            reason,
        })?;

        let source_file = source_file_path(&config.source_directory, kind, name);
        if !source_file.is_file() {
            warn!("No {} '{}' files found at {}", kind.singular(), name, source_file.display());
            return Ok(TargetStatus::SourceMissing { path: source_file });
        }

        let matcher = CopyEngine::save_file_matcher(kind, name)?;

        let target_root = &config.target_directory;
        Self::ensure_directory(target_root).await?;
        Self::ensure_directory(&kind_directory(target_root, kind)).await?;
        Self::ensure_directory(&target_directory(target_root, kind, name)).await?;

        // Non-recursive create: a folder from the same second is an error
        let folder_name = backup_folder_name(name, &self.clock.now());
        let folder = destination_path(target_root, kind, name, &folder_name);
        tokio::fs::create_dir(&folder)
            .await
            .map_err(|source| BackupError::Destination {
                path: folder.clone(),
                source,
            })?;

        info!("Backing up {} '{}' into {}", kind.singular(), name, folder.display());

        let source_dir = kind_directory(&config.source_directory, kind);
        let mut progress = CopyProgress::default();

        self.copy_engine
            .copy_matching(name, &source_dir, &matcher, &folder, &mut progress)
            .await;

        if kind.has_companion_directory() {
            self.copy_companion_directory(name, &source_dir, &folder, &mut progress).await;
        }

        Ok(TargetStatus::Completed {
            folder,
            files_copied: progress.files_copied,
            files_skipped: progress.files_skipped,
            bytes_copied: progress.bytes_copied,
            failures: progress.failures,
        })
    }

    /// Mirror `<source>/<name>/` into `<folder>/<name>/` when it exists
    async fn copy_companion_directory(
        &self,
        name: &str,
        source_dir: &Path,
        folder: &Path,
        progress: &mut CopyProgress,
    ) {
        let companion = source_dir.join(name);
        if !companion.is_dir() {
            debug!("No companion directory for '{}', skipping", name);
            return;
        }

        let destination = folder.join(name);
        if let Err(source) = tokio::fs::create_dir(&destination).await {
            warn!("Failed to create {}: {}", destination.display(), source);
            progress.failures.push(BackupError::Destination {
                path: destination,
                source,
            });
            return;
        }

        self.copy_engine
            .copy_directory_files(name, &companion, &destination, progress)
            .await;
    }

    async fn ensure_directory(path: &Path) -> Result<(), BackupError> {
        if path.is_dir() {
            return Ok(());
        }

        info!("Destination directory does not exist, creating: {}", path.display());
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|source| BackupError::Destination {
                path: path.to_path_buf(),
                source,
            })
    }
}
