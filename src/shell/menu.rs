use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::render::{render_configuration, render_outcome, render_report, render_run_error};
use crate::config::{ConfigError, ConfigStore};
use crate::core::{BackupEngine, Clock, Kind, LocalClock};

const MAIN_MENU: [&str; 7] = [
    "Configuration menu",
    "Manual backup players",
    "Manual backup worlds",
    "Interactive backup world",
    "Help",
    "About",
    "Quit",
];

const CONFIGURATION_MENU: [&str; 9] = [
    "Change game data directory",
    "Change target directory",
    "Add player",
    "Delete player",
    "Add world",
    "Delete world",
    "Change launch system startup",
    "Show current configuration",
    "Main menu",
];

const BACK_OR_MAIN: [&str; 2] = ["Back", "Main Menu"];

/// Where control goes after a menu action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Stay in the current menu
    Stay,
    /// Return to the main menu
    Back,
    /// Input closed or interrupted
    Quit,
}

#[derive(Debug, Clone, Copy)]
enum DirectoryField {
    Source,
    Target,
}

/// Interactive console menu.
///
/// Reads lines from `input` and writes prompts to `output`. End of input
/// and cancellation both end the session like choosing Quit.
pub struct Shell<R, W, C: Clock = LocalClock> {
    store: ConfigStore,
    engine: BackupEngine<C>,
    input: R,
    output: W,
    cancellation: CancellationToken,
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(store: ConfigStore, input: R, output: W, cancellation: CancellationToken) -> Self {
        Self::with_engine(store, BackupEngine::new(), input, output, cancellation)
    }
}

impl<R, W, C> Shell<R, W, C>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    C: Clock,
{
    pub fn with_engine(
        store: ConfigStore,
        engine: BackupEngine<C>,
        input: R,
        output: W,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            store,
            engine,
            input,
            output,
            cancellation,
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Run until the user quits. Errors are only returned when the output
    /// cannot be written.
    pub async fn run(&mut self) -> Result<()> {
        writeln!(
            self.output,
            "Hello. This is an application for automatically backing up game files such as game character files and worlds.\n"
        )?;

        loop {
            let Some(choice) = self.choose("Select item number:", &MAIN_MENU).await? else {
                break;
            };

            let flow = match choice {
                1 => self.configuration_menu().await?,
                2 => self.backup_all_of(Kind::Players).await?,
                3 => self.backup_all_of(Kind::Worlds).await?,
                4 => self.interactive_world_backup().await?,
                5 => self.help_menu().await?,
                6 => self.about().await?,
                _ => Flow::Quit,
            };

            if flow == Flow::Quit {
                break;
            }
        }

        info!("Leaving the menu");
        writeln!(self.output, "Goodbye.")?;
        self.output.flush()?;
        Ok(())
    }

    async fn configuration_menu(&mut self) -> Result<Flow> {
        loop {
            let Some(choice) = self.choose("Select item number:", &CONFIGURATION_MENU).await? else {
                return Ok(Flow::Quit);
            };

            let flow = match choice {
                1 => self.change_directory(DirectoryField::Source).await?,
                2 => self.change_directory(DirectoryField::Target).await?,
                3 => self.add_target(Kind::Players).await?,
                4 => self.remove_target(Kind::Players).await?,
                5 => self.add_target(Kind::Worlds).await?,
                6 => self.remove_target(Kind::Worlds).await?,
                7 => self.change_launch_at_startup().await?,
                8 => self.show_configuration().await?,
                _ => Flow::Back,
            };

            if flow != Flow::Stay {
                return Ok(flow);
            }
        }
    }

    async fn change_directory(&mut self, field: DirectoryField) -> Result<Flow> {
        let prompt = match field {
            DirectoryField::Source => "Enter the directory where the game data is located.",
            DirectoryField::Target => "Enter the destination directory.",
        };

        let Some(value) = self.ask(prompt).await? else {
            return Ok(Flow::Quit);
        };
        if value.is_empty() {
            writeln!(self.output, "Nothing entered, the directory was not changed.")?;
            return Ok(Flow::Stay);
        }

        let result = match field {
            DirectoryField::Source => self.store.set_source_directory(value.as_str()).await,
            DirectoryField::Target => self.store.set_target_directory(value.as_str()).await,
        };

        match result {
            Ok(()) => writeln!(self.output, "Saved.")?,
            Err(e) => {
                warn!("Failed to save configuration: {}", e);
                writeln!(self.output, "Failed to save configuration: {}", e)?;
            }
        }
        Ok(Flow::Stay)
    }

    async fn add_target(&mut self, kind: Kind) -> Result<Flow> {
        let Some(name) = self.ask_target_name(kind).await? else {
            return Ok(Flow::Quit);
        };
        if name.is_empty() {
            return Ok(Flow::Stay);
        }

        match self.store.add_target(kind, &name).await {
            Ok(true) => writeln!(self.output, "Added {} \"{}\".", kind.singular(), name)?,
            Ok(false) => writeln!(self.output, "\"{}\" is already in the list.", name)?,
            Err(e @ ConfigError::InvalidName { .. }) => writeln!(self.output, "Not added: {}.", e)?,
            Err(e) => writeln!(self.output, "Failed to save configuration: {}", e)?,
        }
        Ok(Flow::Stay)
    }

    async fn remove_target(&mut self, kind: Kind) -> Result<Flow> {
        let Some(name) = self.ask_target_name(kind).await? else {
            return Ok(Flow::Quit);
        };
        if name.is_empty() {
            return Ok(Flow::Stay);
        }

        match self.store.remove_target(kind, &name).await {
            Ok(true) => writeln!(self.output, "Removed {} \"{}\".", kind.singular(), name)?,
            Ok(false) => writeln!(self.output, "\"{}\" is not in the list.", name)?,
            Err(e) => writeln!(self.output, "Failed to save configuration: {}", e)?,
        }
        Ok(Flow::Stay)
    }

    async fn ask_target_name(&mut self, kind: Kind) -> Result<Option<String>> {
        let prompt = match kind {
            Kind::Players => "Enter player nickname.",
            Kind::Worlds => "Enter world name.",
        };
        self.ask(prompt).await
    }

    async fn change_launch_at_startup(&mut self) -> Result<Flow> {
        let options = [
            "Run the program at system startup.",
            "Do not run the program at system startup.",
        ];
        let Some(choice) = self.choose("Select the autorun option:", &options).await? else {
            return Ok(Flow::Quit);
        };

        if let Err(e) = self.store.set_launch_at_startup(choice == 1).await {
            writeln!(self.output, "Failed to save configuration: {}", e)?;
        }
        Ok(Flow::Stay)
    }

    async fn show_configuration(&mut self) -> Result<Flow> {
        let text = render_configuration(self.store.config());
        writeln!(self.output, "{}", text)?;

        match self.choose("", &BACK_OR_MAIN).await? {
            Some(1) => Ok(Flow::Stay),
            Some(_) => Ok(Flow::Back),
            None => Ok(Flow::Quit),
        }
    }

    async fn backup_all_of(&mut self, kind: Kind) -> Result<Flow> {
        let text = match self.engine.run(self.store.config(), kind).await {
            Ok(report) => render_report(&report),
            Err(e) => render_run_error(kind, &e),
        };
        write!(self.output, "{}", text)?;

        self.pause().await
    }

    async fn interactive_world_backup(&mut self) -> Result<Flow> {
        let worlds = self.store.config().tracked_worlds.clone();
        if worlds.is_empty() {
            writeln!(self.output, "No worlds for backup.")?;
            return self.pause().await;
        }

        let names: Vec<&str> = worlds.iter().map(String::as_str).collect();
        let Some(choice) = self.choose("Select a world for backup:", &names).await? else {
            return Ok(Flow::Quit);
        };
        let world = &worlds[choice - 1];

        let Some(note) = self.ask("Enter text changelog:").await? else {
            return Ok(Flow::Quit);
        };

        let text = match self
            .engine
            .backup_world_with_changelog(self.store.config(), world, &note)
            .await
        {
            Ok(outcome) => render_outcome(Kind::Worlds, &outcome),
            Err(e) => render_run_error(Kind::Worlds, &e),
        };
        write!(self.output, "{}", text)?;

        self.pause().await
    }

    async fn help_menu(&mut self) -> Result<Flow> {
        loop {
            let options = ["Data entry example.", "Main Menu"];
            match self.choose("Help menu:", &options).await? {
                Some(1) => {}
                Some(_) => return Ok(Flow::Back),
                None => return Ok(Flow::Quit),
            }

            writeln!(self.output, "Source data directory:")?;
            writeln!(self.output, r"C:\Users\UserDirectory\Documents\My Games\Terraria")?;
            writeln!(self.output, "Destination directory:")?;
            writeln!(self.output, r"K:\SomeFolder\Other\TerrariaBackup")?;
            writeln!(self.output, "Player name:")?;
            writeln!(self.output, "PlayerName")?;
            writeln!(self.output, "World name:")?;
            writeln!(self.output, "MyCozyWorld\n")?;

            match self.choose("", &BACK_OR_MAIN).await? {
                Some(1) => {}
                Some(_) => return Ok(Flow::Back),
                None => return Ok(Flow::Quit),
            }
        }
    }

    async fn about(&mut self) -> Result<Flow> {
        writeln!(self.output, "TerrariaAutoBackupper v{}", env!("CARGO_PKG_VERSION"))?;
        writeln!(
            self.output,
            "A program for conveniently backing up game data such as player data and world data."
        )?;
        self.pause().await
    }

    /// Print a numbered menu and read until a valid item number is entered
    async fn choose(&mut self, title: &str, options: &[&str]) -> Result<Option<usize>> {
        loop {
            if !title.is_empty() {
                writeln!(self.output, "{}", title)?;
            }
            for (i, option) in options.iter().enumerate() {
                writeln!(self.output, "{}. {}", i + 1, option)?;
            }
            self.output.flush()?;

            let Some(line) = self.read_line().await? else {
                return Ok(None);
            };

            match line.trim().parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(Some(n)),
                _ => {
                    debug!("Rejected menu input: {:?}", line);
                    writeln!(self.output, "Incorrect value.")?;
                }
            }
        }
    }

    /// Print `prompt` and read one trimmed line
    async fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        writeln!(self.output, "{}", prompt)?;
        self.output.flush()?;
        Ok(self.read_line().await?.map(|line| line.trim().to_string()))
    }

    async fn pause(&mut self) -> Result<Flow> {
        writeln!(self.output, "Enter something to return to the main menu ...")?;
        self.output.flush()?;
        Ok(match self.read_line().await? {
            Some(_) => Flow::Back,
            None => Flow::Quit,
        })
    }

    /// Next input line without its line ending, or None on end of input or
    /// cancellation
    async fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();

        let read = tokio::select! {
            result = self.input.read_line(&mut line) => result?,
            _ = self.cancellation.cancelled() => {
                info!("Input interrupted");
                return Ok(None);
            }
        };

        if read == 0 {
            debug!("End of input");
            return Ok(None);
        }

        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::core::FixedClock;
    use chrono::NaiveDate;
    use std::path::Path;
    use tempfile::tempdir;
    use tokio::io::BufReader;

    async fn run_shell(config_path: &Path, input: &str) -> (String, ConfigStore) {
        let store = ConfigStore::load(config_path.to_path_buf()).await.unwrap();
        let time = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(10, 7, 2).unwrap();

        let mut output = Vec::new();
        let mut shell = Shell::with_engine(
            store,
            BackupEngine::with_clock(FixedClock(time)),
            BufReader::new(input.as_bytes()),
            &mut output,
            CancellationToken::new(),
        );
        shell.run().await.unwrap();
        drop(shell);

        let store = ConfigStore::load(config_path.to_path_buf()).await.unwrap();
        (String::from_utf8(output).unwrap(), store)
    }

    #[tokio::test]
    async fn test_quit_ends_session() {
        let dir = tempdir().unwrap();
        let (output, _) = run_shell(&dir.path().join("tab_config.json"), "7\n").await;

        assert!(output.contains("1. Configuration menu"));
        assert!(output.ends_with("Goodbye.\n"));
    }

    #[tokio::test]
    async fn test_end_of_input_behaves_like_quit() {
        let dir = tempdir().unwrap();
        let (output, _) = run_shell(&dir.path().join("tab_config.json"), "").await;

        assert!(output.ends_with("Goodbye.\n"));
    }

    #[tokio::test]
    async fn test_invalid_input_reprompts_without_recursion() {
        let dir = tempdir().unwrap();
        let mut input = "abc\n0\n99\n".repeat(500);
        input.push_str("7\n");

        let (output, _) = run_shell(&dir.path().join("tab_config.json"), &input).await;

        assert_eq!(output.matches("Incorrect value.").count(), 1500);
        assert!(output.ends_with("Goodbye.\n"));
    }

    #[tokio::test]
    async fn test_configuration_menu_edits_are_saved() {
        let dir = tempdir().unwrap();
        let input = [
            "1", // configuration menu
            "1", "/games/terraria",
            "2", "/backups",
            "3", "Alice",
            "3", "Bob",
            "4", "Bob",
            "5", "Forest",
            "7", "1",
            "9", // main menu
            "7", // quit
        ]
        .join("\n");

        let (_, store) = run_shell(&dir.path().join("tab_config.json"), &input).await;
        let config = store.config();

        assert_eq!(config.source_directory, Path::new("/games/terraria"));
        assert_eq!(config.target_directory, Path::new("/backups"));
        assert_eq!(config.tracked_players, vec!["Alice".to_string()]);
        assert_eq!(config.tracked_worlds, vec!["Forest".to_string()]);
        assert!(config.launch_at_startup);
    }

    #[tokio::test]
    async fn test_name_with_path_separator_is_not_added() {
        let dir = tempdir().unwrap();
        let input = "1\n3\n../Escape\n9\n7\n";

        let (output, store) = run_shell(&dir.path().join("tab_config.json"), input).await;

        assert!(output.contains("Not added: invalid name '../Escape': name contains a path separator."));
        assert!(store.config().tracked_players.is_empty());
    }

    #[tokio::test]
    async fn test_show_configuration_then_main_menu() {
        let dir = tempdir().unwrap();
        let input = "1\n3\nAlice\n8\n2\n7\n";

        let (output, _) = run_shell(&dir.path().join("tab_config.json"), input).await;

        assert!(output.contains("Selected players for backup:\n\"Alice\""));
        assert!(output.ends_with("Goodbye.\n"));
    }

    async fn write_config(path: &Path, config: &Configuration) {
        let mut store = ConfigStore::load(path.to_path_buf()).await.unwrap();
        store.set_source_directory(config.source_directory.clone()).await.unwrap();
        store.set_target_directory(config.target_directory.clone()).await.unwrap();
        for player in &config.tracked_players {
            store.add_player(player).await.unwrap();
        }
        for world in &config.tracked_worlds {
            store.add_world(world).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_manual_player_backup_from_menu() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        std::fs::create_dir_all(src.join("Players")).unwrap();
        std::fs::write(src.join("Players/Alice.plr"), b"alice").unwrap();

        let config_path = dir.path().join("tab_config.json");
        write_config(
            &config_path,
            &Configuration {
                source_directory: src,
                target_directory: dst.clone(),
                tracked_players: vec!["Alice".into(), "Ghost".into()],
                ..Configuration::default()
            },
        )
        .await;

        let (output, _) = run_shell(&config_path, "2\n\n7\n").await;

        assert!(dst.join("Players/Alice/Alice_5-3-2024_10-7-2/Alice.plr").exists());
        assert!(output.contains("No player \"Ghost\" files found"));
        assert!(output.contains("1 completed, 1 skipped, 0 failed"));
    }

    #[tokio::test]
    async fn test_world_backup_without_source_directory_reports_and_continues() {
        let dir = tempdir().unwrap();
        let (output, _) = run_shell(&dir.path().join("tab_config.json"), "3\n\n7\n").await;

        assert!(output.contains("Worlds backup skipped"));
        assert!(output.ends_with("Goodbye.\n"));
    }

    #[tokio::test]
    async fn test_interactive_world_backup_writes_changelog() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        std::fs::create_dir_all(src.join("Worlds")).unwrap();
        std::fs::write(src.join("Worlds/Desert.wld"), b"desert").unwrap();

        let config_path = dir.path().join("tab_config.json");
        write_config(
            &config_path,
            &Configuration {
                source_directory: src,
                target_directory: dst.clone(),
                tracked_worlds: vec!["Forest".into(), "Desert".into()],
                ..Configuration::default()
            },
        )
        .await;

        let (_, _) = run_shell(&config_path, "4\n5\n2\nDefeated the Wall of Flesh\n\n7\n").await;

        let folder = dst.join("Worlds/Desert/Desert_5-3-2024_10-7-2");
        assert!(folder.join("Desert.wld").exists());
        assert_eq!(
            std::fs::read_to_string(folder.join("changelog.txt")).unwrap(),
            "Defeated the Wall of Flesh\n"
        );
    }

    #[tokio::test]
    async fn test_cancelled_session_quits() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::load(dir.path().join("tab_config.json")).await.unwrap();
        let cancellation = CancellationToken::new();
        cancellation.cancel();

        // A reader that never yields a line
        let (reader, _writer) = tokio::io::duplex(64);
        let mut output = Vec::new();
        let mut shell = Shell::new(store, BufReader::new(reader), &mut output, cancellation);
        shell.run().await.unwrap();
        drop(shell);

        assert!(String::from_utf8(output).unwrap().ends_with("Goodbye.\n"));
    }
}
