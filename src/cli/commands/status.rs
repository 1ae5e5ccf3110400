//! Show record counts and last sync times.

use crate::cli::commands::Workspace;
use crate::error::Result;
use crate::sync::{CacheStatus, print_status};
use std::path::PathBuf;

/// Execute the status command.
///
/// # Errors
///
/// Returns an error if the cache cannot be opened or read.
pub fn execute(db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let workspace = Workspace::open(db_path)?;
    let snapshot = workspace.store.snapshot()?;
    let status = CacheStatus::from_snapshot(
        &snapshot,
        workspace.db_path.display().to_string(),
        workspace.backend.bytes_in_use()?,
    );

    if json {
        println!("{}", serde_json::to_string(&status)?);
    } else if crate::is_silent() {
        println!("{}", status.total);
    } else {
        print_status(&status);
    }

    Ok(())
}
