//! Error types for crmsync.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=persistence, 3=not_found, 4=validation, etc.)
//! - Retryability flags for scripted callers
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for crmsync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Persistence (exit 2)
    NotInitialized,
    AlreadyInitialized,
    PersistenceError,

    // Not Found (exit 3)
    RecordNotFound,

    // Validation (exit 4)
    UnknownKind,
    InvalidArgument,

    // Extraction (exit 6)
    ExtractionError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::PersistenceError => "PERSISTENCE_ERROR",
            Self::RecordNotFound => "RECORD_NOT_FOUND",
            Self::UnknownKind => "UNKNOWN_KIND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::ExtractionError => "EXTRACTION_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::PersistenceError => 2,
            Self::RecordNotFound => 3,
            Self::UnknownKind | Self::InvalidArgument => 4,
            Self::ExtractionError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether the same call may succeed when retried.
    ///
    /// Validation errors succeed once the input is corrected; a failed write
    /// or extraction may succeed once the backend or source recovers.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UnknownKind
                | Self::InvalidArgument
                | Self::PersistenceError
                | Self::ExtractionError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in crmsync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `crmsync init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Storage quota exceeded: write needs {needed} bytes, limit is {limit} bytes")]
    QuotaExceeded { needed: usize, limit: usize },

    #[error("Stored snapshot is corrupt: {0}")]
    CorruptSnapshot(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Sync failed: {message}")]
    SyncFailed { code: ErrorCode, message: String },

    #[error("Unknown object kind: {0}")]
    UnknownKind(String),

    #[error("Record not found: {kind}/{id}")]
    RecordNotFound { kind: String, id: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_)
            | Self::Persistence(_)
            | Self::QuotaExceeded { .. }
            | Self::CorruptSnapshot(_) => ErrorCode::PersistenceError,
            Self::Extraction(_) => ErrorCode::ExtractionError,
            Self::SyncFailed { code, .. } => *code,
            Self::UnknownKind(_) => ErrorCode::UnknownKind,
            Self::RecordNotFound { .. } => ErrorCode::RecordNotFound,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// True for every failure of the persistence layer.
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        matches!(self.error_code(), ErrorCode::PersistenceError)
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `crmsync init` to create the local cache".to_string())
            }

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::QuotaExceeded { .. } => Some(
                "Export and clear old data (`crmsync export json`, then `crmsync clear`), \
                 or raise `quotaBytes` in ~/.crmsync/config.json"
                    .to_string(),
            ),

            Self::CorruptSnapshot(_) => Some(
                "The stored cache could not be parsed. Run `crmsync clear --yes` to reset it."
                    .to_string(),
            ),

            Self::UnknownKind(_) => Some(
                "Valid kinds: leads, contacts, accounts, opportunities, tasks".to_string(),
            ),

            Self::RecordNotFound { kind, .. } => Some(format!(
                "Use `crmsync list {kind}` to see cached records."
            )),

            Self::SyncFailed {
                code: ErrorCode::ExtractionError,
                ..
            }
            | Self::Extraction(_) => Some(
                "Check the extractor settings in ~/.crmsync/config.json, \
                 or pass --from/--command/--url explicitly"
                    .to_string(),
            ),

            Self::Database(_)
            | Self::Persistence(_)
            | Self::SyncFailed { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_variants_share_code() {
        let errors = [
            Error::Persistence("backend unavailable".into()),
            Error::QuotaExceeded { needed: 10, limit: 5 },
            Error::CorruptSnapshot("eof".into()),
        ];
        for err in &errors {
            assert_eq!(err.error_code(), ErrorCode::PersistenceError);
            assert_eq!(err.exit_code(), 2);
            assert!(err.is_persistence());
        }
    }

    #[test]
    fn test_extraction_is_not_persistence() {
        let err = Error::Extraction("unsupported page".into());
        assert!(!err.is_persistence());
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn test_structured_json_includes_hint() {
        let err = Error::UnknownKind("cases".into());
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "UNKNOWN_KIND");
        assert_eq!(json["error"]["retryable"], true);
        assert!(json["error"]["hint"].as_str().unwrap().contains("opportunities"));
    }

    #[test]
    fn test_structured_json_without_hint() {
        let err = Error::Other("boom".into());
        let json = err.to_structured_json();
        assert_eq!(json["error"]["exit_code"], 1);
        assert!(json["error"].get("hint").is_none());
    }
}
