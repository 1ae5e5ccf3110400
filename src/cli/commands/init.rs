//! Create the local cache database.
//!
//! The database lives at `~/.crmsync/data/crmsync.db` unless `--db` (or
//! `CRMSYNC_DB`) points elsewhere; with `CRMSYNC_TEST_DB=1` it goes to
//! `~/.crmsync/test/crmsync.db` instead.

use crate::cli::commands::Workspace;
use crate::config::{Settings, resolve_db_path};
use crate::error::{Error, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    reinitialized: bool,
    dry_run: bool,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` if the database exists and `force` is not
/// set, or an error if the directory or database cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or_else(|| {
        Error::Config("Could not determine the crmsync data directory".to_string())
    })?;
    init_at(&db_path, force, json)
}

fn init_at(db_path: &Path, force: bool, json: bool) -> Result<()> {
    let existed = db_path.exists();
    if existed && !force {
        return Err(Error::AlreadyInitialized {
            path: db_path.to_path_buf(),
        });
    }

    let dry_run = crate::is_dry_run();
    if !dry_run {
        if existed {
            remove_database(db_path)?;
        }
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let workspace = Workspace::open_at(db_path, Settings::default())?;
        workspace.store.initialize()?;
    }

    if json {
        let output = InitOutput {
            database: db_path.to_path_buf(),
            reinitialized: existed,
            dry_run,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if crate::is_silent() {
        println!("{}", db_path.display());
    } else {
        let verb = match (dry_run, existed) {
            (true, _) => "Would initialize",
            (false, true) => "Reinitialized",
            (false, false) => "Initialized",
        };
        println!("{verb} crmsync cache");
        println!("  Database: {}", db_path.display());
        if !dry_run {
            println!();
            println!("Next: run 'crmsync sync --from <capture.json>' to load records.");
        }
    }

    Ok(())
}

// The WAL and shared-memory files go with the database.
fn remove_database(db_path: &Path) -> Result<()> {
    fs::remove_file(db_path)?;
    for suffix in ["-wal", "-shm"] {
        let mut side = db_path.as_os_str().to_os_string();
        side.push(suffix);
        let side = PathBuf::from(side);
        if side.exists() {
            fs::remove_file(side)?;
        }
    }
    Ok(())
}
