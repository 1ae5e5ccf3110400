//! Export the cache to JSON or CSV files.

use crate::cli::ExportCommands;
use crate::cli::commands::{Workspace, parse_kind};
use crate::config::default_export_dir;
use crate::error::Result;
use crate::export::{
    ExportedFile, JSON_EXPORT_FILE, csv_file_name, export_csv_files, export_json_file, to_csv,
    to_json,
};
use crate::model::ObjectKind;
use crate::sync::format_size;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ExportOutput {
    files: Vec<ExportedFile>,
    dry_run: bool,
}

/// Execute an export subcommand.
///
/// # Errors
///
/// Returns an error if the cache cannot be read or a file cannot be written.
pub fn execute(command: &ExportCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let workspace = Workspace::open(db_path)?;
    let snapshot = workspace.store.snapshot()?;
    let export_dir = default_export_dir(&workspace.settings);
    let dry_run = crate::is_dry_run();

    let files = match command {
        ExportCommands::Json { output } => {
            let path = output
                .clone()
                .unwrap_or_else(|| export_dir.join(JSON_EXPORT_FILE));
            if dry_run {
                vec![ExportedFile {
                    records: snapshot.total_records(),
                    bytes: to_json(&snapshot)?.len(),
                    path,
                }]
            } else {
                vec![export_json_file(&snapshot, &path)?]
            }
        }
        ExportCommands::Csv { kind, output } => {
            let kinds = match kind {
                Some(kind) => vec![parse_kind(kind)?],
                None => ObjectKind::ALL.to_vec(),
            };
            let dir = output.clone().unwrap_or(export_dir);
            if dry_run {
                kinds
                    .iter()
                    .map(|&kind| ExportedFile {
                        path: dir.join(csv_file_name(kind)),
                        records: snapshot.collection(kind).len(),
                        bytes: to_csv(&snapshot, kind).len(),
                    })
                    .collect()
            } else {
                export_csv_files(&snapshot, &dir, &kinds)?
            }
        }
    };

    if json {
        println!("{}", serde_json::to_string(&ExportOutput { files, dry_run })?);
    } else if crate::is_silent() {
        for file in &files {
            println!("{}", file.path.display());
        }
    } else {
        let verb = if dry_run { "Would write" } else { "Wrote" };
        for file in &files {
            println!(
                "{verb} {} ({} records, {})",
                file.path.display(),
                file.records,
                format_size(file.bytes)
            );
        }
    }

    Ok(())
}
