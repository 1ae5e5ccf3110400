//! crmsync - a local, incrementally-updated cache of extracted CRM records
//!
//! This crate provides the reconciliation engine behind the `crmsync` CLI.
//!
//! # Architecture
//!
//! - [`storage`] - Key-value persistence backends (SQLite, in-memory)
//! - [`model`] - Data types (`ObjectKind`, `Record`, `Snapshot`)
//! - [`store`] - The record store: merge, delete, clear, snapshot reads
//! - [`notify`] - Push and poll change notification for readers
//! - [`export`] - JSON and CSV export
//! - [`extract`] - Extractor adapters (file, command, HTTP)
//! - [`sync`] - Extract-then-merge orchestration and status
//! - [`config`] - Paths and the settings file
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod model;
pub mod notify;
pub mod storage;
pub mod store;
pub mod sync;

pub use error::{Error, Result};

/// Global silent mode flag for `--silent` output.
///
/// When set, mutating commands print only a count or id instead of full
/// output.
pub static SILENT: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Global dry-run flag for `--dry-run`.
///
/// When set, mutating commands preview what would happen without writing.
pub static DRY_RUN: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Global CSV output flag (set when `--format csv`).
pub static CSV_OUTPUT: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

/// Check if silent mode is active.
#[inline]
pub fn is_silent() -> bool {
    SILENT.load(std::sync::atomic::Ordering::Relaxed)
}

/// Check if dry-run mode is active.
#[inline]
pub fn is_dry_run() -> bool {
    DRY_RUN.load(std::sync::atomic::Ordering::Relaxed)
}

/// Check if CSV output is requested.
#[inline]
pub fn is_csv() -> bool {
    CSV_OUTPUT.load(std::sync::atomic::Ordering::Relaxed)
}

/// Escape a value for CSV output.
///
/// Values containing a comma, quote, CR or LF are wrapped in quotes with
/// inner quotes doubled; anything else is returned as is.
pub fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
