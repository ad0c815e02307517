//! Chat log discovery.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use koscheck_core::{KosError, TailError};

use crate::config::{ConfigError, KosConfig};
use crate::error::CliError;

/// The newest `Fleet_*.txt` log in `dir`, preferring logs opened on `today`.
///
/// Log names embed their start time (`Fleet_YYYYMMDD_HHMMSS.txt`), so name
/// order is chronological.
pub fn newest_fleet_log(dir: &Path, today: NaiveDate) -> io::Result<Option<PathBuf>> {
    let today_prefix = format!("Fleet_{}_", today.format("%Y%m%d"));
    let mut newest_today: Option<String> = None;
    let mut newest: Option<String> = None;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !name.starts_with("Fleet_") || !name.ends_with(".txt") {
            continue;
        }
        if name.starts_with(&today_prefix) {
            newest_today = newest_today.max(Some(name.clone()));
        }
        newest = newest.max(Some(name));
    }

    Ok(newest_today.or(newest).map(|name| dir.join(name)))
}

/// The chat log the configuration points at.
pub fn locate_chat_log(config: &KosConfig, today: NaiveDate) -> Result<PathBuf, CliError> {
    if let Some(path) = &config.log_path {
        return Ok(path.clone());
    }
    let Some(dir) = &config.log_dir else {
        return Err(ConfigError::InvalidValue {
            field: "log_path",
            reason: "log_path or log_dir must be provided".to_string(),
        }
        .into());
    };

    let found = newest_fleet_log(dir, today).map_err(|e| {
        KosError::from(TailError::Io {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })
    })?;
    let path = found.ok_or_else(|| CliError::NoChatLog {
        dir: dir.display().to_string(),
    })?;
    tracing::info!(path = %path.display(), "Selected newest fleet log");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) {
        fs::write(dir.path().join(name), b"").expect("write should succeed");
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
    }

    #[test]
    fn test_prefers_newest_log_of_today() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        touch(&dir, "Fleet_20261018_220000.txt");
        touch(&dir, "Fleet_20261019_080000.txt");
        touch(&dir, "Fleet_20261019_193000.txt");
        touch(&dir, "Local_20261019_200000.txt");

        let found = newest_fleet_log(dir.path(), today()).expect("scan should succeed");
        assert_eq!(found, Some(dir.path().join("Fleet_20261019_193000.txt")));
    }

    #[test]
    fn test_falls_back_to_newest_of_any_day() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        touch(&dir, "Fleet_20261001_120000.txt");
        touch(&dir, "Fleet_20261017_090000.txt");
        fs::create_dir(dir.path().join("Fleet_20261018_000000.txt")).expect("mkdir should succeed");

        let found = newest_fleet_log(dir.path(), today()).expect("scan should succeed");
        assert_eq!(found, Some(dir.path().join("Fleet_20261017_090000.txt")));
    }

    #[test]
    fn test_empty_dir_has_no_log() {
        let dir = TempDir::new().expect("TempDir creation should succeed");
        touch(&dir, "Corp_20261019_120000.txt");
        assert_eq!(newest_fleet_log(dir.path(), today()).expect("scan should succeed"), None);
    }

    #[test]
    fn test_missing_dir_is_io_error() {
        assert!(newest_fleet_log(Path::new("/nonexistent/Chatlogs"), today()).is_err());
    }
}
