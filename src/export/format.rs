//! Snapshot serialization: JSON and per-kind CSV.

use crate::csv_escape;
use crate::error::{Error, Result};
use crate::model::{ObjectKind, Snapshot};

/// Serialize the full snapshot as pretty JSON.
///
/// The shape matches the persisted document, so the output can be fed back
/// through [`parse_json`] or `crmsync import`.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(snapshot: &Snapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Parse a snapshot previously produced by [`to_json`].
///
/// # Errors
///
/// Returns `Error::InvalidArgument` if the text is not a snapshot document.
pub fn parse_json(text: &str) -> Result<Snapshot> {
    serde_json::from_str(text)
        .map_err(|e| Error::InvalidArgument(format!("not a crmsync snapshot: {e}")))
}

/// Render one collection as CSV.
///
/// The header is the kind's known field set; every row ends with `\n`.
/// Fields outside the known set are left out and absent fields are empty.
#[must_use]
pub fn to_csv(snapshot: &Snapshot, kind: ObjectKind) -> String {
    let fields = kind.fields();
    let mut out = fields.join(",");
    out.push('\n');

    for record in snapshot.collection(kind) {
        let row: Vec<String> = fields
            .iter()
            .map(|field| record.get(field).map(csv_escape).unwrap_or_default())
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}
