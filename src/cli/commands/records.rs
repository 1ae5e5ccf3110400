//! Record commands: list, show, delete, clear.

use crate::cli::commands::{Workspace, confirm, parse_kind};
use crate::error::{Error, Result};
use crate::export::to_csv;
use crate::model::{ObjectKind, Record};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// Widest column in table output.
const MAX_COLUMN_WIDTH: usize = 32;

#[derive(Serialize)]
struct ListOutput<'a> {
    kind: ObjectKind,
    count: usize,
    records: &'a [Record],
}

#[derive(Serialize)]
struct DeleteOutput<'a> {
    kind: ObjectKind,
    id: &'a str,
    deleted: bool,
    dry_run: bool,
}

#[derive(Serialize)]
struct ClearOutput {
    cleared: usize,
    dry_run: bool,
}

/// List the records of one kind.
///
/// # Errors
///
/// Returns an error if the kind is unknown or the cache cannot be read.
pub fn list(kind: &str, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let kind = parse_kind(kind)?;
    let workspace = Workspace::open(db_path)?;
    let snapshot = workspace.store.snapshot()?;
    let records = snapshot.collection(kind);

    if crate::is_csv() {
        print!("{}", to_csv(&snapshot, kind));
    } else if json {
        let output = ListOutput {
            kind,
            count: records.len(),
            records,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if records.is_empty() {
        println!("No {} cached.", kind.label().to_lowercase());
    } else {
        println!("{} ({} cached):", kind.label().bold(), records.len());
        println!();
        print_table(kind, records);
    }

    Ok(())
}

/// Show one record.
///
/// # Errors
///
/// Returns `RecordNotFound` if no record has this id.
pub fn show(kind: &str, id: &str, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let kind = parse_kind(kind)?;
    let workspace = Workspace::open(db_path)?;
    let record = workspace
        .store
        .get_record(kind, id)?
        .ok_or_else(|| Error::RecordNotFound {
            kind: kind.as_str().to_string(),
            id: id.to_string(),
        })?;

    if json {
        println!("{}", serde_json::to_string(&record)?);
        return Ok(());
    }

    println!("{} {}", kind.label().bold(), record.id);
    for field in kind.fields().iter().skip(1) {
        println!("  {:<16} {}", format!("{field}:"), record.get(field).unwrap_or("-"));
    }
    let extra: Vec<_> = record
        .fields
        .iter()
        .filter(|(name, _)| !kind.fields().contains(&name.as_str()))
        .collect();
    if !extra.is_empty() {
        println!("  {}", "Other fields:".dimmed());
        for (name, value) in extra {
            println!("  {:<16} {}", format!("{name}:"), value.as_deref().unwrap_or("-"));
        }
    }
    Ok(())
}

/// Delete one record, after confirmation.
///
/// A missing record is reported, not treated as an error.
///
/// # Errors
///
/// Returns an error if confirmation cannot be obtained or the write fails.
pub fn delete(
    kind: &str,
    id: &str,
    yes: bool,
    db_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let kind = parse_kind(kind)?;
    let workspace = Workspace::open(db_path)?;

    let dry_run = crate::is_dry_run();
    let deleted = if dry_run {
        workspace.store.get_record(kind, id)?.is_some()
    } else {
        if !confirm(&format!("Delete {} {id}?", kind.as_str()), yes)? {
            println!("Cancelled.");
            return Ok(());
        }
        workspace.store.delete_record(kind, id)?
    };

    if json {
        let output = DeleteOutput {
            kind,
            id,
            deleted,
            dry_run,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if crate::is_silent() {
        if deleted {
            println!("{id}");
        }
    } else if !deleted {
        println!("No {} record with id {id}; nothing deleted.", kind.as_str());
    } else if dry_run {
        println!("Would delete {} {id}", kind.as_str());
    } else {
        println!("Deleted {} {id}", kind.as_str());
    }

    Ok(())
}

/// Delete every cached record, after confirmation.
///
/// # Errors
///
/// Returns an error if confirmation cannot be obtained or the write fails.
pub fn clear(yes: bool, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let workspace = Workspace::open(db_path)?;
    // A corrupt cache can still be cleared.
    let total = workspace
        .store
        .snapshot()
        .map_or(0, |snapshot| snapshot.total_records());

    let dry_run = crate::is_dry_run();
    if !dry_run {
        if !confirm(&format!("Delete all {total} cached records?"), yes)? {
            println!("Cancelled.");
            return Ok(());
        }
        workspace.store.clear_all()?;
    }

    if json {
        let output = ClearOutput {
            cleared: total,
            dry_run,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if crate::is_silent() {
        println!("{total}");
    } else if dry_run {
        println!("Would clear {total} records");
    } else {
        println!("Cleared {total} records");
    }

    Ok(())
}

fn print_table(kind: ObjectKind, records: &[Record]) {
    let fields = kind.fields();
    let cells: Vec<Vec<String>> = records
        .iter()
        .map(|record| {
            fields
                .iter()
                .map(|field| truncate(record.get(field).unwrap_or(""), MAX_COLUMN_WIDTH))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(field.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = fields
        .iter()
        .zip(&widths)
        .map(|(field, width)| format!("{field:<width$}"))
        .collect();
    println!("{}", header.join("  ").trim_end().bold());

    for row in cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad(cell, *width))
            .collect();
        println!("{}", line.join("  ").trim_end());
    }
}

fn truncate(value: &str, max: usize) -> String {
    let single_line = value.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let cut: String = single_line.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

fn pad(cell: &str, width: usize) -> String {
    let len = cell.chars().count();
    format!("{cell}{}", " ".repeat(width.saturating_sub(len)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly ten", 11), "exactly ten");
        assert_eq!(truncate("a much longer value", 10), "a much ...");
        assert_eq!(truncate("two\nlines", 20), "two lines");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("Zürich Großhandel GmbH", 10), "Zürich ...");
    }

    #[test]
    fn test_pad() {
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("abcdef", 4), "abcdef");
    }
}
