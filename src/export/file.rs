//! Export files on disk.
//!
//! Every file is written atomically: content goes to a temp file next to
//! the target, is synced to disk, then renamed over the target. A failed
//! export leaves any previous file untouched.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use super::format::{to_csv, to_json};
use crate::error::Result;
use crate::model::{ObjectKind, Snapshot};

/// Default name of the JSON export.
pub const JSON_EXPORT_FILE: &str = "crm_data.json";

/// File name of a kind's CSV export, e.g. `leads.csv`.
#[must_use]
pub fn csv_file_name(kind: ObjectKind) -> String {
    format!("{}.csv", kind.as_str())
}

/// One written export file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub records: usize,
    pub bytes: usize,
}

/// Write content to a file atomically.
///
/// Creates the parent directory if needed.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    write_via_temp(path, |writer| writer.write_all(content.as_bytes()))
}

/// Write `path` through `<name>.tmp`. The temp file is removed on every
/// failure, whichever step failed.
fn write_via_temp<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let written = File::create(&temp_path).and_then(|file| {
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()
    });

    if let Err(e) = written.and_then(|()| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}

/// Write the snapshot as JSON to `path`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn export_json_file(snapshot: &Snapshot, path: &Path) -> Result<ExportedFile> {
    let json = to_json(snapshot)?;
    atomic_write(path, &json)?;
    debug!(path = %path.display(), bytes = json.len(), "wrote json export");
    Ok(ExportedFile {
        path: path.to_path_buf(),
        records: snapshot.total_records(),
        bytes: json.len(),
    })
}

/// Write one CSV file per kind into `dir`.
///
/// Every requested kind gets a file, including empty ones (header only).
///
/// # Errors
///
/// Returns an error on the first failed write. Files written before it are
/// kept.
pub fn export_csv_files(
    snapshot: &Snapshot,
    dir: &Path,
    kinds: &[ObjectKind],
) -> Result<Vec<ExportedFile>> {
    let mut written = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let path = dir.join(csv_file_name(kind));
        let csv = to_csv(snapshot, kind);
        atomic_write(&path, &csv)?;
        debug!(%kind, path = %path.display(), "wrote csv export");
        written.push(ExportedFile {
            path,
            records: snapshot.collection(kind).len(),
            bytes: csv.len(),
        });
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_replaces_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.json");

        atomic_write(&path, "first").unwrap();
        atomic_write(&path, "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!temp_dir.path().join("out.json.tmp").exists());
    }

    #[test]
    fn test_atomic_write_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/deeper/out.csv");

        atomic_write(&path, "x").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "x");
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.json");
        atomic_write(&path, "kept").unwrap();

        // A directory squatting on the temp name makes the write fail.
        fs::create_dir(temp_dir.path().join("out.json.tmp")).unwrap();
        assert!(atomic_write(&path, "lost").is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "kept");
    }

    #[test]
    fn test_failed_write_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("leads.csv");
        atomic_write(&path, "previous").unwrap();

        let err = write_via_temp(&path, |writer| {
            writer.write_all(b"partial")?;
            writer.flush()?;
            Err(io::Error::other("disk full"))
        })
        .unwrap_err();

        assert!(matches!(err, crate::error::Error::Io(_)));
        assert!(!temp_dir.path().join("leads.csv.tmp").exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous");
    }

    #[test]
    fn test_export_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(JSON_EXPORT_FILE);
        let mut snapshot = Snapshot::empty();
        snapshot.accounts.push(Record::new("a1").with_field("accountName", "Acme"));

        let file = export_json_file(&snapshot, &path).unwrap();

        assert_eq!(file.records, 1);
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(crate::export::parse_json(&text).unwrap(), snapshot);
    }

    #[test]
    fn test_export_csv_files_writes_every_kind() {
        let temp_dir = TempDir::new().unwrap();
        let mut snapshot = Snapshot::empty();
        snapshot.tasks.push(Record::new("t1").with_field("subject", "Call"));

        let files = export_csv_files(&snapshot, temp_dir.path(), &ObjectKind::ALL).unwrap();

        assert_eq!(files.len(), 5);
        let leads = fs::read_to_string(temp_dir.path().join("leads.csv")).unwrap();
        assert_eq!(leads, "id,name,company,email,phone,status\n");
        let tasks = fs::read_to_string(temp_dir.path().join("tasks.csv")).unwrap();
        assert_eq!(tasks.lines().nth(1), Some("t1,Call,,,,"));
    }
}
