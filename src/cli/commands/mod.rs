//! Command implementations.

pub mod completions;
pub mod export;
pub mod import;
pub mod init;
pub mod records;
pub mod status;
pub mod sync;
pub mod version;
pub mod watch;

use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Settings, resolve_db_path};
use crate::error::{Error, Result};
use crate::model::ObjectKind;
use crate::storage::SqliteBackend;
use crate::store::RecordStore;

/// An opened cache: database handle, store and settings.
pub struct Workspace {
    pub db_path: PathBuf,
    pub backend: Arc<SqliteBackend>,
    pub store: Arc<RecordStore>,
    pub settings: Settings,
}

impl Workspace {
    /// Open the cache at the resolved database path.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotInitialized` if the database does not exist, or
    /// the settings/database error.
    pub fn open(db_path: Option<&PathBuf>) -> Result<Self> {
        let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or(Error::NotInitialized)?;
        if !db_path.exists() {
            return Err(Error::NotInitialized);
        }
        Self::open_at(&db_path, Settings::load()?)
    }

    /// Open (creating if needed) the database at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns the database error.
    pub fn open_at(db_path: &Path, settings: Settings) -> Result<Self> {
        let backend = Arc::new(SqliteBackend::open(db_path)?.with_quota(settings.quota()));
        let store = Arc::new(RecordStore::new(Arc::clone(&backend) as _));
        Ok(Self {
            db_path: db_path.to_path_buf(),
            backend,
            store,
            settings,
        })
    }
}

/// Parse a kind argument.
///
/// # Errors
///
/// Returns `Error::UnknownKind` for anything but a known kind name.
pub fn parse_kind(kind: &str) -> Result<ObjectKind> {
    kind.parse()
}

/// Ask for confirmation before a destructive command.
///
/// `--yes` confirms up front. Without it the user is prompted on a TTY;
/// with no TTY to ask, the command is refused.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` if no TTY is available, or an I/O error.
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }

    if !std::io::stdin().is_terminal() {
        return Err(Error::InvalidArgument(
            "confirmation required: pass --yes to run non-interactively".to_string(),
        ));
    }

    eprint!("{prompt} [y/N] ");
    std::io::stderr().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES" | "Yes"))
}
