//! Extractor wire contract and related types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::model::{ObjectKind, Record};

/// Available extractor adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    File,
    Command,
    Http,
}

impl ExtractorKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Command => "command",
            Self::Http => "http",
        }
    }
}

impl std::fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extractor metadata for logs and status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractorInfo {
    pub kind: ExtractorKind,
    /// Path, command line or URL the extractor reads from.
    pub source: String,
}

/// The document an extractor produces.
///
/// `{"success":true,"objectType":"leads","count":2,"records":[...]}` or
/// `{"success":false,"error":"..."}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractorResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default)]
    pub records: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractorResponse {
    /// Parse a response document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Extraction` if the text is not a response document.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| Error::Extraction(format!("malformed extractor response: {e}")))
    }

    /// Validate the response and normalize its records.
    ///
    /// # Errors
    ///
    /// Returns `Error::Extraction` if the extractor reported failure, the
    /// object type is missing or unknown, or any record is invalid. Nothing
    /// is returned for a partially valid batch.
    pub fn into_extraction(self) -> Result<Extraction> {
        if !self.success {
            let reason = self
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "extractor reported failure".to_string());
            return Err(Error::Extraction(reason));
        }

        let object_type = self
            .object_type
            .ok_or_else(|| Error::Extraction("response has no objectType".to_string()))?;
        let kind: ObjectKind = object_type
            .parse()
            .map_err(|_| Error::Extraction(format!("unknown object type: {object_type}")))?;

        let records = self
            .records
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                Record::from_json(value)
                    .map_err(|e| Error::Extraction(format!("record {index}: {}", inner(&e))))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(count) = self.count.filter(|&c| c != records.len()) {
            warn!(%kind, reported = count, actual = records.len(), "extractor count mismatch");
        }

        Ok(Extraction { kind, records })
    }
}

fn inner(err: &Error) -> String {
    match err {
        Error::Extraction(msg) => msg.clone(),
        other => other.to_string(),
    }
}

/// A validated batch of records of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub kind: ObjectKind,
    pub records: Vec<Record>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_response() {
        let response = ExtractorResponse::parse(
            r#"{"success":true,"objectType":"Leads","count":2,
                "records":[{"id":"1","name":"Alice"},{"id":2,"phone":null}]}"#,
        )
        .unwrap();

        let extraction = response.into_extraction().unwrap();
        assert_eq!(extraction.kind, ObjectKind::Lead);
        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.records[1].id, "2");
    }

    #[test]
    fn test_failure_response_carries_reason() {
        let response = ExtractorResponse::parse(r#"{"success":false,"error":"Not on a list page"}"#)
            .unwrap();
        let err = response.into_extraction().unwrap_err();
        assert_eq!(err.to_string(), "Extraction failed: Not on a list page");
    }

    #[test]
    fn test_failure_without_reason() {
        let err = ExtractorResponse::default().into_extraction().unwrap_err();
        assert!(matches!(err, Error::Extraction(msg) if msg == "extractor reported failure"));
    }

    #[test]
    fn test_unknown_object_type() {
        let response = ExtractorResponse {
            success: true,
            object_type: Some("campaigns".into()),
            ..Default::default()
        };
        let err = response.into_extraction().unwrap_err();
        assert!(matches!(err, Error::Extraction(msg) if msg.contains("campaigns")));
    }

    #[test]
    fn test_one_bad_record_fails_batch() {
        let response = ExtractorResponse {
            success: true,
            object_type: Some("tasks".into()),
            count: Some(2),
            records: vec![json!({"id": "t1"}), json!({"subject": "no id"})],
            error: None,
        };
        let err = response.into_extraction().unwrap_err();
        assert!(matches!(err, Error::Extraction(msg) if msg.starts_with("record 1")));
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            ExtractorResponse::parse("<html>"),
            Err(Error::Extraction(_))
        ));
    }
}
