//! Append-only error log mirroring what the user sees in error dialogs.

use std::{
    env,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Local;
use log::warn;

/// Returns the default error log path (`error.log` in the working directory).
pub fn default_error_log_path() -> PathBuf {
    env::current_dir()
        .map(|dir| dir.join("error.log"))
        .unwrap_or_else(|_| PathBuf::from("error.log"))
}

/// Append one timestamped `[YYYY-MM-DD HH:MM:SS] {kind}: {detail}` line.
///
/// The file is created on first use. Write failures are logged at warn level
/// and swallowed; error logging must never take the application down.
pub fn append_error_log(path: &Path, kind: &str, detail: &str) {
    let line = format!(
        "[{}] {}: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        kind,
        detail
    );
    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| file.write_all(line.as_bytes()));
    if let Err(err) = result {
        warn!("failed to append to error log {}: {err}", path.display());
    }
}
