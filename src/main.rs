use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use terraria_backupper::{
    cli::{print_help, Action, CliArgs},
    config::ConfigStore,
    core::{BackupEngine, BackupError, Kind, RunReport},
    observability::{init_logging, shutdown_logging, LogOptions},
    shell::{render_report, render_run_error, setup_interrupt_handler, Shell},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const LOG_DIR_NAME: &str = "logs";

fn main() -> Result<()> {
    let args = CliArgs::parse(std::env::args().skip(1))?;

    if args.action == Action::Help {
        print_help();
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let result = runtime.block_on(run(args));

    // A stdin read may still be pending after Ctrl+C; do not wait for it
    runtime.shutdown_background();
    shutdown_logging();

    result
}

async fn run(args: CliArgs) -> Result<()> {
    let config_path = match args.config_path {
        Some(path) => path,
        None => ConfigStore::default_path().context("Failed to locate configuration")?,
    };

    let log_dir = log_directory(&config_path);
    init_logging(&LogOptions {
        level: &args.log_level,
        log_dir: Some(&log_dir),
        console: args.verbose,
    })?;

    info!("TerrariaAutoBackupper v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", config_path.display());

    let store = ConfigStore::load(config_path.clone())
        .await
        .inspect_err(|e| error!("{}", e))
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    match args.action {
        Action::Menu => {
            let cancellation = CancellationToken::new();
            setup_interrupt_handler(cancellation.clone());

            let input = tokio::io::BufReader::new(tokio::io::stdin());
            let mut shell = Shell::new(store, input, std::io::stdout(), cancellation);
            shell.run().await
        }
        Action::Run => {
            let engine = BackupEngine::new();
            let results = engine.run_all(store.config()).await;
            print_results(results)
        }
        Action::BackupPlayers => {
            let engine = BackupEngine::new();
            let result = engine.run_player_backups(store.config()).await;
            print_results(vec![(Kind::Players, result)])
        }
        Action::BackupWorlds => {
            let engine = BackupEngine::new();
            let result = engine.run_world_backups(store.config()).await;
            print_results(vec![(Kind::Worlds, result)])
        }
        Action::Help => Ok(()),
    }
}

/// Log files live next to the configuration file
fn log_directory(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(LOG_DIR_NAME),
        _ => PathBuf::from(LOG_DIR_NAME),
    }
}

/// Print each report; any failed run, target or file makes the exit code
/// non-zero
fn print_results(results: Vec<(Kind, Result<RunReport, BackupError>)>) -> Result<()> {
    let mut had_errors = false;

    for (kind, result) in results {
        match result {
            Ok(report) => {
                print!("{}", render_report(&report));
                had_errors |= report.has_errors();
            }
            Err(e) => {
                print!("{}", render_run_error(kind, &e));
                had_errors = true;
            }
        }
    }

    if had_errors {
        bail!("Backup finished with errors");
    }
    Ok(())
}
