use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::Kind;

const DEFAULT_SOURCE_DIRECTORY: &str = "Path to game data";
const DEFAULT_TARGET_DIRECTORY: &str = "Path to target backup directory";
const DEFAULT_LANGUAGE: &str = "en";

/// Application settings, persisted as `tab_config.json`
///
/// Field names follow the on-disk schema so existing config files load
/// unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Configuration {
    /// Game data root containing `Players/` and `Worlds/`
    #[serde(rename = "GameDataDirectory")]
    pub source_directory: PathBuf,

    /// Backup destination root
    #[serde(rename = "BackupTargetDirectory")]
    pub target_directory: PathBuf,

    /// Player names to back up, in insertion order
    #[serde(rename = "BackupPlayersTargets")]
    pub tracked_players: Vec<String>,

    /// World names to back up, in insertion order
    #[serde(rename = "BackupWorldsTargets")]
    pub tracked_worlds: Vec<String>,

    /// Stored only; the tool itself never registers with the OS
    #[serde(rename = "LaunchSystemStartup")]
    pub launch_at_startup: bool,

    #[serde(
        rename = "AvailableLanguages",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub available_languages: Option<Vec<String>>,

    #[serde(
        rename = "SelectedLanguage",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub selected_language: Option<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            source_directory: PathBuf::from(DEFAULT_SOURCE_DIRECTORY),
            target_directory: PathBuf::from(DEFAULT_TARGET_DIRECTORY),
            tracked_players: Vec::new(),
            tracked_worlds: Vec::new(),
            launch_at_startup: false,
            available_languages: Some(Vec::new()),
            selected_language: Some(DEFAULT_LANGUAGE.to_string()),
        }
    }
}

impl Configuration {
    /// Targets configured for the given kind
    pub fn targets(&self, kind: Kind) -> &[String] {
        match kind {
            Kind::Players => &self.tracked_players,
            Kind::Worlds => &self.tracked_worlds,
        }
    }

    pub(crate) fn targets_mut(&mut self, kind: Kind) -> &mut Vec<String> {
        match kind {
            Kind::Players => &mut self.tracked_players,
            Kind::Worlds => &mut self.tracked_worlds,
        }
    }

    /// Language code, falling back to English when unset
    pub fn language(&self) -> &str {
        self.selected_language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }
}
