//! Configuration management.
//!
//! This module provides functions for locating crmsync directories,
//! resolving the database path, and loading settings.
//!
//! # Layout
//!
//! - **Database**: `~/.crmsync/data/crmsync.db`
//! - **Settings**: `~/.crmsync/config.json`
//! - **Exports**: the current directory unless `exportDir` is configured

mod settings;

pub use settings::{ExtractorSettings, Settings};

use std::path::{Path, PathBuf};

/// Get the global crmsync directory.
#[must_use]
pub fn global_crmsync_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".crmsync"))
}

/// Path of the settings file.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    global_crmsync_dir().map(|dir| dir.join("config.json"))
}

/// Check if test mode is enabled.
///
/// Test mode is enabled by setting `CRMSYNC_TEST_DB=1` (or any non-empty
/// value other than `0`/`false`). It redirects the database to an isolated
/// location.
#[must_use]
pub fn is_test_mode() -> bool {
    std::env::var("CRMSYNC_TEST_DB").is_ok_and(|v| is_truthy(&v))
}

fn is_truthy(value: &str) -> bool {
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Get the test database path: `~/.crmsync/test/crmsync.db`.
#[must_use]
pub fn test_db_path() -> Option<PathBuf> {
    global_crmsync_dir().map(|dir| dir.join("test").join("crmsync.db"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. `explicit_path` (the `--db` flag, which also reads `CRMSYNC_DB`)
/// 2. `CRMSYNC_TEST_DB` set → the test database
/// 3. Global location: `~/.crmsync/data/crmsync.db`
///
/// Returns `None` if no home directory can be determined.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    if is_test_mode() {
        return test_db_path();
    }

    global_crmsync_dir().map(|dir| dir.join("data").join("crmsync.db"))
}

/// Directory export files go to when no `--output` is given.
#[must_use]
pub fn default_export_dir(settings: &Settings) -> PathBuf {
    settings
        .export_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."))
}
