use std::path::PathBuf;

use super::error::BackupError;
use super::paths::Kind;

/// Result of one backup run over every target of a kind
#[derive(Debug)]
pub struct RunReport {
    pub kind: Kind,
    pub outcomes: Vec<TargetOutcome>,
}

#[derive(Debug)]
pub struct TargetOutcome {
    pub name: String,
    pub status: TargetStatus,
}

/// Terminal state of a single target
#[derive(Debug)]
pub enum TargetStatus {
    /// A new backup folder was created; individual copy failures, if any,
    /// are listed in `failures`
    Completed {
        folder: PathBuf,
        files_copied: u64,
        files_skipped: u64,
        bytes_copied: u64,
        failures: Vec<BackupError>,
    },

    /// The `<name>.plr` / `<name>.wld` source file does not exist
    SourceMissing { path: PathBuf },

    /// The target could not be backed up at all
    Failed { error: BackupError },
}

impl TargetOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self.status, TargetStatus::Completed { .. })
    }

    /// Backup folder created for this target, if any
    pub fn folder(&self) -> Option<&PathBuf> {
        match &self.status {
            TargetStatus::Completed { folder, .. } => Some(folder),
            _ => None,
        }
    }
}

impl RunReport {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            outcomes: Vec::new(),
        }
    }

    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_completed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, TargetStatus::SourceMissing { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, TargetStatus::Failed { .. }))
            .count()
    }

    /// True if any target failed or any file could not be copied
    pub fn has_errors(&self) -> bool {
        self.outcomes.iter().any(|o| match &o.status {
            TargetStatus::Completed { failures, .. } => !failures.is_empty(),
            TargetStatus::SourceMissing { .. } => false,
            TargetStatus::Failed { .. } => true,
        })
    }

    pub fn outcome(&self, name: &str) -> Option<&TargetOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}
