use std::fmt::Write;

use crate::config::Configuration;
use crate::core::{BackupError, Kind, RunReport, TargetOutcome, TargetStatus};

/// Human-readable summary of a backup run
pub fn render_report(report: &RunReport) -> String {
    let mut out = String::new();

    if report.outcomes.is_empty() {
        let _ = writeln!(out, "{}", no_targets_message(report.kind));
        return out;
    }

    for outcome in &report.outcomes {
        out.push_str(&render_outcome(report.kind, outcome));
    }

    let _ = writeln!(
        out,
        "{} backup finished: {} completed, {} skipped, {} failed.",
        report.kind,
        report.completed(),
        report.skipped(),
        report.failed()
    );
    out
}

pub fn render_outcome(kind: Kind, outcome: &TargetOutcome) -> String {
    let mut out = String::new();
    let name = &outcome.name;

    match &outcome.status {
        TargetStatus::Completed {
            folder,
            files_copied,
            files_skipped,
            failures,
            ..
        } => {
            let _ = write!(out, "\"{}\": {} file(s) copied to {}", name, files_copied, folder.display());
            if *files_skipped > 0 {
                let _ = write!(out, " ({} already present)", files_skipped);
            }
            out.push('\n');
            for failure in failures {
                let _ = writeln!(out, "  error: {}", failure);
            }
        }
        TargetStatus::SourceMissing { path } => {
            let _ = writeln!(
                out,
                "No {} \"{}\" files found ({}), skipped.",
                kind.singular(),
                name,
                path.display()
            );
        }
        TargetStatus::Failed { error } => {
            let _ = writeln!(out, "\"{}\": backup failed: {}", name, error);
        }
    }

    out
}

/// Message for a run that could not start
pub fn render_run_error(kind: Kind, error: &BackupError) -> String {
    match error {
        BackupError::SourceDirectoryMissing { path } => format!(
            "{} backup skipped: the shared directory with the source data does not exist or the path is incorrect ({}).\n",
            kind,
            path.display()
        ),
        other => format!("{} backup skipped: {}\n", kind, other),
    }
}

pub fn no_targets_message(kind: Kind) -> &'static str {
    match kind {
        Kind::Players => "There are no game characters in the configuration to backup their data files.",
        Kind::Worlds => "There are no worlds in the configuration to backup their data files.",
    }
}

pub fn render_configuration(config: &Configuration) -> String {
    let quoted = |names: &[String]| {
        names
            .iter()
            .map(|n| format!("\"{}\"", n))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut out = String::new();
    let _ = writeln!(out, "Current configuration:\n");
    let _ = writeln!(out, "Source data directory:\n{}", config.source_directory.display());
    let _ = writeln!(out, "Destination directory:\n{}", config.target_directory.display());
    let _ = writeln!(out, "Selected players for backup:\n{}", quoted(&config.tracked_players));
    let _ = writeln!(out, "Selected worlds for backup:\n{}", quoted(&config.tracked_worlds));
    let _ = writeln!(
        out,
        "Launching the program at system startup: {}",
        config.launch_at_startup
    );
    out
}
