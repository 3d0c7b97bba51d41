use anyhow::{bail, Result};
use std::path::PathBuf;

const DEFAULT_LOG_LEVEL: &str = "info";

/// What the process should do after startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Interactive menu
    Menu,
    /// Back up players and worlds, then exit
    Run,
    BackupPlayers,
    BackupWorlds,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub action: Action,
    pub config_path: Option<PathBuf>,
    pub log_level: String,
    pub verbose: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            action: Action::Menu,
            config_path: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            verbose: false,
        }
    }
}

impl CliArgs {
    /// Parse arguments, excluding the program name
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let Some(path) = args.next() else {
                        bail!("--config requires a file path");
                    };
                    parsed.config_path = Some(PathBuf::from(path));
                }
                "--log-level" => {
                    let Some(level) = args.next() else {
                        bail!("--log-level requires a value (trace, debug, info, warn, error)");
                    };
                    parsed.log_level = level;
                }
                "--verbose" | "-v" => parsed.verbose = true,
                "--run" => parsed.set_action(Action::Run)?,
                "--backup-players" => parsed.set_action(Action::BackupPlayers)?,
                "--backup-worlds" => parsed.set_action(Action::BackupWorlds)?,
                "--help" | "-h" => parsed.set_action(Action::Help)?,
                other => bail!("Unknown argument: {}\n\nRun with --help for usage.", other),
            }
        }

        Ok(parsed)
    }

    fn set_action(&mut self, action: Action) -> Result<()> {
        if self.action != Action::Menu && self.action != action {
            bail!("Only one of --run, --backup-players, --backup-worlds, --help may be given");
        }
        self.action = action;
        Ok(())
    }
}

pub fn print_help() {
    println!("TerrariaAutoBackupper v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("USAGE:");
    println!("  tab [OPTIONS]                 Open the interactive menu");
    println!("  tab --run                     Back up all players and worlds, then exit");
    println!("  tab --backup-players          Back up all configured players, then exit");
    println!("  tab --backup-worlds           Back up all configured worlds, then exit");
    println!("  tab --help                    Show this help");
    println!();
    println!("OPTIONS:");
    println!("  -c, --config FILE             Use FILE instead of <Documents>/TerrariaAutoBackupper/tab_config.json");
    println!("      --log-level LEVEL         trace, debug, info, warn or error (RUST_LOG takes precedence)");
    println!("  -v, --verbose                 Also print log output to stderr");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs> {
        CliArgs::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_no_arguments_opens_menu() {
        assert_eq!(parse(&[]).unwrap(), CliArgs::default());
    }

    #[test]
    fn test_options_and_action() {
        let args = parse(&["--config", "/tmp/tab.json", "--run", "-v", "--log-level", "debug"]).unwrap();

        assert_eq!(args.action, Action::Run);
        assert_eq!(args.config_path, Some(PathBuf::from("/tmp/tab.json")));
        assert_eq!(args.log_level, "debug");
        assert!(args.verbose);
    }

    #[test]
    fn test_missing_option_value() {
        assert!(parse(&["--config"]).is_err());
        assert!(parse(&["--log-level"]).is_err());
    }

    #[test]
    fn test_conflicting_actions() {
        assert!(parse(&["--run", "--backup-worlds"]).is_err());
        assert_eq!(parse(&["--run", "--run"]).unwrap().action, Action::Run);
    }

    #[test]
    fn test_unknown_argument() {
        assert!(parse(&["--install"]).is_err());
    }
}
