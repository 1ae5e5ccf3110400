//! Extractor running a bridge program and reading its stdout.

use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use super::provider::Extractor;
use super::types::{ExtractorInfo, ExtractorKind, ExtractorResponse};
use crate::error::{Error, Result};

/// Default time a bridge program may run.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs `program args...` and parses its stdout as an [`ExtractorResponse`].
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandExtractor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Extractor for CommandExtractor {
    fn info(&self) -> ExtractorInfo {
        ExtractorInfo {
            kind: ExtractorKind::Command,
            source: self.command_line(),
        }
    }

    async fn fetch(&self) -> Result<ExtractorResponse> {
        debug!(command = %self.command_line(), "running extractor command");

        let output = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| {
                Error::Extraction(format!(
                    "`{}` timed out after {}s",
                    self.program,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| Error::Extraction(format!("cannot run `{}`: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Extraction(format!(
                "`{}` exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        ExtractorResponse::parse(&stdout)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::model::ObjectKind;

    fn sh(script: &str) -> CommandExtractor {
        CommandExtractor::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn test_parses_stdout() {
        let extraction = sh(r#"echo '{"success":true,"objectType":"opps","records":[{"id":"o1"}]}'"#)
            .extract()
            .await
            .unwrap();
        assert_eq!(extraction.kind, ObjectKind::Opportunity);
        assert_eq!(extraction.records.len(), 1);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_extraction_error() {
        let err = sh("echo boom >&2; exit 3").extract().await.unwrap_err();
        assert!(matches!(err, Error::Extraction(msg) if msg.contains("boom")));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = CommandExtractor::new("crmsync-no-such-bridge", Vec::new())
            .extract()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let err = sh("sleep 5")
            .with_timeout(Duration::from_millis(50))
            .extract()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extraction(msg) if msg.contains("timed out")));
    }
}
