//! Extractor factory.

use super::command::CommandExtractor;
use super::file::FileExtractor;
use super::http::HttpExtractor;
use super::provider::BoxedExtractor;
use super::types::ExtractorKind;
use crate::config::ExtractorSettings;
use crate::error::{Error, Result};

/// Create the extractor selected by `settings`.
///
/// # Errors
///
/// Returns `Error::Config` if no extractor is configured or the selected
/// one is missing its source.
pub fn create_extractor(settings: &ExtractorSettings) -> Result<BoxedExtractor> {
    let kind = settings.resolved_kind().ok_or_else(|| {
        Error::Config(
            "no extractor configured: pass --from, --command or --url, \
             or set `extractor` in ~/.crmsync/config.json"
                .to_string(),
        )
    })?;

    match kind {
        ExtractorKind::File => {
            let path = settings.path.clone().ok_or_else(|| missing(kind, "path"))?;
            Ok(BoxedExtractor::new(FileExtractor::new(path)))
        }
        ExtractorKind::Command => {
            let command = settings.command.clone().ok_or_else(|| missing(kind, "command"))?;
            let mut extractor = CommandExtractor::new(command, settings.args.clone());
            if let Some(timeout) = settings.timeout() {
                extractor = extractor.with_timeout(timeout);
            }
            Ok(BoxedExtractor::new(extractor))
        }
        ExtractorKind::Http => {
            let url = settings.url.clone().ok_or_else(|| missing(kind, "url"))?;
            let mut extractor = HttpExtractor::new(url);
            if let Some(timeout) = settings.timeout() {
                extractor = extractor.with_timeout(timeout);
            }
            Ok(BoxedExtractor::new(extractor))
        }
    }
}

fn missing(kind: ExtractorKind, member: &str) -> Error {
    Error::Config(format!("{kind} extractor needs `{member}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_configured() {
        let err = create_extractor(&ExtractorSettings::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_selects_by_settings() {
        let file = create_extractor(&ExtractorSettings::file("/tmp/capture.json")).unwrap();
        assert_eq!(file.info().kind, ExtractorKind::File);

        let command =
            create_extractor(&ExtractorSettings::command("bridge", vec!["leads".into()])).unwrap();
        assert_eq!(command.info().source, "bridge leads");

        let http = create_extractor(&ExtractorSettings::http("http://localhost/x")).unwrap();
        assert_eq!(http.info().kind, ExtractorKind::Http);
    }

    #[test]
    fn test_explicit_kind_without_source() {
        let settings = ExtractorSettings {
            kind: Some(ExtractorKind::Http),
            path: Some("/tmp/capture.json".into()),
            ..ExtractorSettings::default()
        };
        let err = create_extractor(&settings).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("url")));
    }
}
