use chrono::{Datelike, NaiveDateTime, Timelike};
use std::fmt;
use std::path::{Path, PathBuf};

/// Category of backup target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Players,
    Worlds,
}

impl Kind {
    /// Directory segment under both the source and target roots
    pub fn directory(self) -> &'static str {
        match self {
            Kind::Players => "Players",
            Kind::Worlds => "Worlds",
        }
    }

    /// Save file extension, including the dot
    pub fn extension(self) -> &'static str {
        match self {
            Kind::Players => ".plr",
            Kind::Worlds => ".wld",
        }
    }

    /// Players keep map data in a directory named after the character
    pub fn has_companion_directory(self) -> bool {
        matches!(self, Kind::Players)
    }

    pub fn singular(self) -> &'static str {
        match self {
            Kind::Players => "player",
            Kind::Worlds => "world",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directory())
    }
}

/// Backup folder name for `name` at `now`.
///
/// Components are written without zero padding (`Alice_5-3-2024_10-7-2`),
/// matching folders produced by earlier versions of the tool.
pub fn backup_folder_name(name: &str, now: &NaiveDateTime) -> String {
    format!(
        "{}_{}-{}-{}_{}-{}-{}",
        name,
        now.day(),
        now.month(),
        now.year(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// Reject names that would leave `<target>/<Kind>/<name>/` once joined
/// into a path.
pub fn check_target_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("name is empty");
    }
    if name == "." || name == ".." {
        return Err("name is a relative path component");
    }
    if name.contains(['/', '\\']) {
        return Err("name contains a path separator");
    }
    if name.chars().any(char::is_control) {
        return Err("name contains a control character");
    }
    Ok(())
}

/// `<root>/<Kind>`
pub fn kind_directory(root: &Path, kind: Kind) -> PathBuf {
    root.join(kind.directory())
}

/// `<target>/<Kind>/<name>`
pub fn target_directory(target_root: &Path, kind: Kind, name: &str) -> PathBuf {
    kind_directory(target_root, kind).join(name)
}

/// `<target>/<Kind>/<name>/<folder_name>`
pub fn destination_path(target_root: &Path, kind: Kind, name: &str, folder_name: &str) -> PathBuf {
    target_directory(target_root, kind, name).join(folder_name)
}

/// `<source>/<Kind>/<name>.plr` or `<source>/<Kind>/<name>.wld`
pub fn source_file_path(source_root: &Path, kind: Kind, name: &str) -> PathBuf {
    kind_directory(source_root, kind).join(format!("{}{}", name, kind.extension()))
}
