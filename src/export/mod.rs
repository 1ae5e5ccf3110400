//! Snapshot export.
//!
//! JSON and CSV rendering live in `format`, atomic export files in `file`.

mod file;
mod format;

pub use file::{
    ExportedFile, JSON_EXPORT_FILE, atomic_write, csv_file_name, export_csv_files,
    export_json_file,
};
pub use format::{parse_json, to_csv, to_json};
