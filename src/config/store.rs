use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::error::ConfigError;
use super::models::Configuration;
use crate::core::{check_target_name, Kind};

/// Application folder created inside the user's documents directory
pub const APP_DIR_NAME: &str = "TerrariaAutoBackupper";
pub const CONFIG_FILE_NAME: &str = "tab_config.json";

/// A temp file younger than this may belong to a save still in progress
const STALE_TEMP_AGE: Duration = Duration::from_secs(60);

/// Owns the in-memory configuration and its backing file.
///
/// Every mutation is written through to disk immediately. The in-memory
/// configuration only changes once that write has succeeded.
pub struct ConfigStore {
    path: PathBuf,
    config: Configuration,
}

impl ConfigStore {
    /// `<documents>/TerrariaAutoBackupper`
    pub fn app_directory() -> Result<PathBuf, ConfigError> {
        dirs::document_dir()
            .map(|docs| docs.join(APP_DIR_NAME))
            .ok_or(ConfigError::NoDocumentsDir)
    }

    /// `<documents>/TerrariaAutoBackupper/tab_config.json`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::app_directory()?.join(CONFIG_FILE_NAME))
    }

    /// Load the configuration at `path`, writing defaults on first run
    pub async fn load(path: PathBuf) -> Result<Self, ConfigError> {
        Self::remove_stale_temp(&path).await;

        if !path.exists() {
            warn!("Configuration file not found, creating defaults: {}", path.display());

            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(|source| ConfigError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }

            let store = Self {
                path,
                config: Configuration::default(),
            };
            store.save().await?;
            return Ok(store);
        }

        debug!("Loading configuration from: {}", path.display());

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            ConfigError::Unreadable {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;

        let config: Configuration = serde_json::from_str(&content).map_err(|e| {
            ConfigError::Unreadable {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;

        info!(
            "Configuration loaded: {} players, {} worlds",
            config.tracked_players.len(),
            config.tracked_worlds.len()
        );

        Ok(Self { path, config })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the current configuration.
    ///
    /// The content is written to an exclusively created sibling file, synced,
    /// then renamed over the config file.
    pub async fn save(&self) -> Result<(), ConfigError> {
        self.write_config(&self.config).await
    }

    async fn write_config(&self, config: &Configuration) -> Result<(), ConfigError> {
        let mut json = serde_json::to_string_pretty(config)?;
        json.push('\n');

        let temp_path = Self::temp_path(&self.path);
        let write_err = |source| ConfigError::Write {
            path: self.path.clone(),
            source,
        };

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .await
            .map_err(write_err)?;

        let written = async {
            file.write_all(json.as_bytes()).await?;
            file.sync_all().await
        }
        .await;
        drop(file);

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(write_err(e));
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(write_err(e));
        }

        debug!("Configuration saved to: {}", self.path.display());
        Ok(())
    }

    /// Append `name` to the list for `kind`. Returns false, without writing,
    /// when the name is already tracked.
    pub async fn add_target(&mut self, kind: Kind, name: &str) -> Result<bool, ConfigError> {
        check_target_name(name).map_err(|reason| ConfigError::InvalidName {
            name: name.to_string(),
            reason,
        })?;

        if self.config.targets(kind).iter().any(|t| t == name) {
            debug!("{} '{}' is already tracked", kind.singular(), name);
            return Ok(false);
        }

        let mut updated = self.config.clone();
        updated.targets_mut(kind).push(name.to_string());
        self.commit(updated).await?;
        info!("Added {} '{}'", kind.singular(), name);
        Ok(true)
    }

    /// Remove `name` from the list for `kind`. A name that is not tracked is
    /// a no-op and nothing is written.
    pub async fn remove_target(&mut self, kind: Kind, name: &str) -> Result<bool, ConfigError> {
        let Some(index) = self.config.targets(kind).iter().position(|t| t == name) else {
            return Ok(false);
        };

        let mut updated = self.config.clone();
        updated.targets_mut(kind).remove(index);
        self.commit(updated).await?;
        info!("Removed {} '{}'", kind.singular(), name);
        Ok(true)
    }

    pub async fn add_player(&mut self, name: &str) -> Result<bool, ConfigError> {
        self.add_target(Kind::Players, name).await
    }

    pub async fn remove_player(&mut self, name: &str) -> Result<bool, ConfigError> {
        self.remove_target(Kind::Players, name).await
    }

    pub async fn add_world(&mut self, name: &str) -> Result<bool, ConfigError> {
        self.add_target(Kind::Worlds, name).await
    }

    pub async fn remove_world(&mut self, name: &str) -> Result<bool, ConfigError> {
        self.remove_target(Kind::Worlds, name).await
    }

    pub async fn set_source_directory(&mut self, path: impl Into<PathBuf>) -> Result<(), ConfigError> {
        let mut updated = self.config.clone();
        updated.source_directory = path.into();
        self.commit(updated).await
    }

    pub async fn set_target_directory(&mut self, path: impl Into<PathBuf>) -> Result<(), ConfigError> {
        let mut updated = self.config.clone();
        updated.target_directory = path.into();
        self.commit(updated).await
    }

    pub async fn set_launch_at_startup(&mut self, enabled: bool) -> Result<(), ConfigError> {
        let mut updated = self.config.clone();
        updated.launch_at_startup = enabled;
        self.commit(updated).await
    }

    /// Write `updated` and adopt it; on error the current state is kept
    async fn commit(&mut self, updated: Configuration) -> Result<(), ConfigError> {
        self.write_config(&updated).await?;
        self.config = updated;
        Ok(())
    }

    fn temp_path(path: &Path) -> PathBuf {
        path.with_extension("json.tmp")
    }

    /// A temp file left behind by an interrupted save would block every
    /// later save, so it is cleared before the first one. A recent one may
    /// belong to another instance mid-save and is left alone.
    async fn remove_stale_temp(path: &Path) {
        let temp_path = Self::temp_path(path);
        let Ok(metadata) = tokio::fs::metadata(&temp_path).await else {
            return;
        };

        let age = metadata.modified().ok().and_then(|m| m.elapsed().ok());
        if !age.is_some_and(|age| age >= STALE_TEMP_AGE) {
            debug!("Keeping recent temporary config file: {}", temp_path.display());
            return;
        }

        warn!("Removing leftover temporary config file: {}", temp_path.display());
        if let Err(e) = tokio::fs::remove_file(&temp_path).await {
            warn!("Failed to remove {}: {}", temp_path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_first_run_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(APP_DIR_NAME).join(CONFIG_FILE_NAME);

        let store = ConfigStore::load(path.clone()).await.unwrap();

        assert!(path.exists());
        assert_eq!(store.config(), &Configuration::default());

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Configuration = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, Configuration::default());
        assert!(content.ends_with("}\n"));
    }

    #[tokio::test]
    async fn test_save_load_round_trip_is_byte_identical() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let original = r#"{
  "GameDataDirectory": "C:\\Users\\Player\\Documents\\My Games\\Terraria",
  "BackupTargetDirectory": "K:\\Backups\\Terraria",
  "BackupPlayersTargets": [
    "Alice",
    "Bob"
  ],
  "BackupWorldsTargets": [
    "MyCozyWorld"
  ],
  "LaunchSystemStartup": false,
  "AvailableLanguages": [
    "en",
    "ru"
  ],
  "SelectedLanguage": "en"
}
"#;
        std::fs::write(&path, original).unwrap();

        let store = ConfigStore::load(path.clone()).await.unwrap();
        store.save().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[tokio::test]
    async fn test_round_trip_without_language_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let original = r#"{
  "GameDataDirectory": "/src",
  "BackupTargetDirectory": "/dst",
  "BackupPlayersTargets": [],
  "BackupWorldsTargets": [],
  "LaunchSystemStartup": true
}
"#;
        std::fs::write(&path, original).unwrap();

        let store = ConfigStore::load(path.clone()).await.unwrap();
        store.save().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[tokio::test]
    async fn test_invalid_json_is_unreadable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        let result = ConfigStore::load(path.clone()).await;
        assert!(matches!(result, Err(ConfigError::Unreadable { .. })));

        // Not auto-recovered
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_unreadable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{ "GameDataDirectory": 42 }"#).unwrap();

        let result = ConfigStore::load(path).await;
        assert!(matches!(result, Err(ConfigError::Unreadable { .. })));
    }

    #[tokio::test]
    async fn test_mutations_are_persisted_immediately() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut store = ConfigStore::load(path.clone()).await.unwrap();
        assert!(store.add_player("Alice").await.unwrap());
        assert!(store.add_world("Forest").await.unwrap());
        store.set_source_directory("/games/terraria").await.unwrap();
        store.set_target_directory("/backups").await.unwrap();
        store.set_launch_at_startup(true).await.unwrap();

        let reloaded = ConfigStore::load(path).await.unwrap();
        let config = reloaded.config();
        assert_eq!(config.tracked_players, vec!["Alice".to_string()]);
        assert_eq!(config.tracked_worlds, vec!["Forest".to_string()]);
        assert_eq!(config.source_directory, PathBuf::from("/games/terraria"));
        assert_eq!(config.target_directory, PathBuf::from("/backups"));
        assert!(config.launch_at_startup);
    }

    #[tokio::test]
    async fn test_remove_missing_name_does_not_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut store = ConfigStore::load(path.clone()).await.unwrap();
        store.add_player("Alice").await.unwrap();

        // Replace the file so any write would be visible
        std::fs::write(&path, "sentinel").unwrap();

        assert!(!store.remove_player("Bob").await.unwrap());
        assert!(!store.remove_world("Nowhere").await.unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "sentinel");

        assert!(store.remove_player("Alice").await.unwrap());
        assert_ne!(std::fs::read_to_string(&path).unwrap(), "sentinel");
        assert!(store.config().tracked_players.is_empty());
    }

    #[tokio::test]
    async fn test_add_existing_name_keeps_single_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut store = ConfigStore::load(path).await.unwrap();
        assert!(store.add_world("Forest").await.unwrap());
        assert!(!store.add_world("Forest").await.unwrap());

        assert_eq!(store.config().tracked_worlds, vec!["Forest".to_string()]);
    }

    #[tokio::test]
    async fn test_save_fails_when_directory_is_gone() {
        let dir = tempdir().unwrap();
        let app_dir = dir.path().join(APP_DIR_NAME);
        let path = app_dir.join(CONFIG_FILE_NAME);

        let mut store = ConfigStore::load(path).await.unwrap();
        std::fs::remove_dir_all(&app_dir).unwrap();

        let result = store.add_player("Alice").await;
        assert!(matches!(result, Err(ConfigError::Write { .. })));
    }

    #[tokio::test]
    async fn test_failed_save_leaves_state_unchanged_and_retry_persists() {
        let dir = tempdir().unwrap();
        let app_dir = dir.path().join(APP_DIR_NAME);
        let path = app_dir.join(CONFIG_FILE_NAME);

        let mut store = ConfigStore::load(path.clone()).await.unwrap();
        std::fs::remove_dir_all(&app_dir).unwrap();

        assert!(store.add_player("Alice").await.is_err());
        assert!(store.set_target_directory("/backups").await.is_err());
        assert_eq!(store.config(), &Configuration::default());

        std::fs::create_dir_all(&app_dir).unwrap();
        assert!(store.add_player("Alice").await.unwrap());

        let reloaded = ConfigStore::load(path).await.unwrap();
        assert_eq!(reloaded.config().tracked_players, vec!["Alice".to_string()]);
    }

    #[tokio::test]
    async fn test_add_rejects_names_that_escape_backup_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut store = ConfigStore::load(path.clone()).await.unwrap();
        for name in ["../Escape", "a/b", "..", ""] {
            let result = store.add_player(name).await;
            assert!(matches!(result, Err(ConfigError::InvalidName { .. })), "{:?}", name);
        }

        assert!(store.config().tracked_players.is_empty());
        let reloaded = ConfigStore::load(path).await.unwrap();
        assert!(reloaded.config().tracked_players.is_empty());
    }

    #[tokio::test]
    async fn test_load_clears_old_leftover_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let temp = ConfigStore::temp_path(&path);
        std::fs::write(&temp, "partial").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&temp)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(600))
            .unwrap();

        let mut store = ConfigStore::load(path).await.unwrap();
        assert!(!temp.exists());
        store.add_player("Alice").await.unwrap();
        assert!(!temp.exists());
    }

    #[tokio::test]
    async fn test_load_keeps_recent_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        ConfigStore::load(path.clone()).await.unwrap();

        // Another instance in the middle of a save
        let temp = ConfigStore::temp_path(&path);
        std::fs::write(&temp, "in progress").unwrap();

        let mut store = ConfigStore::load(path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&temp).unwrap(), "in progress");

        let result = store.add_player("Alice").await;
        assert!(matches!(result, Err(ConfigError::Write { .. })));
        assert!(store.config().tracked_players.is_empty());
    }
}
