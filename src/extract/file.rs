//! Extractor reading a captured response document from disk.

use std::path::PathBuf;

use tracing::debug;

use super::provider::Extractor;
use super::types::{ExtractorInfo, ExtractorKind, ExtractorResponse};
use crate::error::{Error, Result};

/// Reads an [`ExtractorResponse`] from a JSON file.
#[derive(Debug, Clone)]
pub struct FileExtractor {
    path: PathBuf,
}

impl FileExtractor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Extractor for FileExtractor {
    fn info(&self) -> ExtractorInfo {
        ExtractorInfo {
            kind: ExtractorKind::File,
            source: self.path.display().to_string(),
        }
    }

    async fn fetch(&self) -> Result<ExtractorResponse> {
        debug!(path = %self.path.display(), "reading extractor response");
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Extraction(format!("cannot read {}: {e}", self.path.display()))
        })?;
        ExtractorResponse::parse(&text)
    }
}
