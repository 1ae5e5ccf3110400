//! Merge an exported JSON snapshot back into the cache.

use crate::cli::commands::Workspace;
use crate::error::{Error, Result};
use crate::export::parse_json;
use crate::model::ObjectKind;
use crate::store::MergeStats;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Serialize)]
struct KindImport {
    kind: ObjectKind,
    added: usize,
    updated: usize,
}

#[derive(Serialize)]
struct ImportOutput {
    file: PathBuf,
    kinds: Vec<KindImport>,
    added: usize,
    updated: usize,
    dry_run: bool,
}

/// Execute the import command.
///
/// Each non-empty collection of the file is merged with the same rules as a
/// sync, one kind at a time.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a merge fails.
/// Kinds merged before a failed one stay merged.
pub fn execute(file: &Path, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let text = fs::read_to_string(file).map_err(|e| {
        Error::InvalidArgument(format!("cannot read {}: {e}", file.display()))
    })?;
    let mut imported = parse_json(&text)?;
    let workspace = Workspace::open(db_path)?;

    let dry_run = crate::is_dry_run();
    let mut kinds = Vec::new();
    for kind in ObjectKind::ALL {
        let records = std::mem::take(imported.collection_mut(kind));
        if records.is_empty() {
            continue;
        }
        let stats: MergeStats = if dry_run {
            workspace.store.preview_merge(kind, &records)?
        } else {
            workspace.store.merge(kind, records)?
        };
        info!(%kind, added = stats.added, updated = stats.updated, dry_run, "imported");
        kinds.push(KindImport {
            kind,
            added: stats.added,
            updated: stats.updated,
        });
    }

    let output = ImportOutput {
        file: file.to_path_buf(),
        added: kinds.iter().map(|k| k.added).sum(),
        updated: kinds.iter().map(|k| k.updated).sum(),
        kinds,
        dry_run,
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
    } else if crate::is_silent() {
        println!("{}", output.added + output.updated);
    } else if output.kinds.is_empty() {
        println!("No records in {}", file.display());
    } else {
        let verb = if dry_run { "Would import" } else { "Imported" };
        println!("{verb} from {}:", file.display());
        for kind in &output.kinds {
            println!(
                "  {:<14} {} added, {} updated",
                format!("{}:", kind.kind.label()),
                kind.added,
                kind.updated
            );
        }
    }

    Ok(())
}
