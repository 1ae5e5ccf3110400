//! Extract the current batch of records and merge it into the cache.
//!
//! The extractor comes from the command line when `--from`, `--command` or
//! `--url` is given, otherwise from the `extractor` section of the settings.

use crate::cli::SyncArgs;
use crate::cli::commands::Workspace;
use crate::config::ExtractorSettings;
use crate::error::{Error, Result};
use crate::extract::create_extractor;
use crate::model::ObjectKind;
use crate::sync::SyncOrchestrator;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PreviewOutput {
    object_type: ObjectKind,
    would_add: usize,
    would_update: usize,
    dry_run: bool,
}

/// Execute the sync command.
///
/// # Errors
///
/// Returns an error if no extractor is configured, or a `SyncFailed` error
/// carrying the failure's category when extraction or the merge fails.
pub fn execute(args: &SyncArgs, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let workspace = Workspace::open(db_path)?;
    let extractor_settings = extractor_settings(args, &workspace.settings.extractor);
    let extractor = create_extractor(&extractor_settings)?;
    let orchestrator = SyncOrchestrator::new(Arc::clone(&workspace.store), extractor);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

    if crate::is_dry_run() {
        let (kind, stats) = rt.block_on(orchestrator.preview())?;
        if json {
            let output = PreviewOutput {
                object_type: kind,
                would_add: stats.added,
                would_update: stats.updated,
                dry_run: true,
            };
            println!("{}", serde_json::to_string(&output)?);
        } else if crate::is_silent() {
            println!("{}", stats.total());
        } else {
            println!(
                "Would sync {} {} ({} new, {} updated)",
                stats.total(),
                kind.as_str(),
                stats.added,
                stats.updated
            );
        }
        return Ok(());
    }

    let outcome = rt.block_on(orchestrator.sync_current());

    if json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else if crate::is_silent() {
        if outcome.success {
            println!("{}", outcome.count);
        }
    } else if outcome.success {
        println!("{}", orchestrator.status().unwrap_or_else(|| outcome.status_message()));
    }

    match outcome.to_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Command-line selection wins over the configured extractor.
///
/// A configured timeout carries over to a command-line command or URL.
fn extractor_settings(args: &SyncArgs, configured: &ExtractorSettings) -> ExtractorSettings {
    let selected = if let Some(path) = &args.from {
        ExtractorSettings::file(path.clone())
    } else if let Some(command) = &args.command {
        ExtractorSettings::command(command.clone(), args.args.clone())
    } else if let Some(url) = &args.url {
        ExtractorSettings::http(url.clone())
    } else {
        return configured.clone();
    };

    ExtractorSettings {
        timeout_secs: configured.timeout_secs,
        ..selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractorKind;

    #[test]
    fn test_configured_extractor_by_default() {
        let configured = ExtractorSettings::http("http://localhost:9000/extract");
        let settings = extractor_settings(&SyncArgs::default(), &configured);
        assert_eq!(settings, configured);
    }

    #[test]
    fn test_command_line_wins() {
        let configured = ExtractorSettings {
            timeout_secs: Some(5),
            ..ExtractorSettings::http("http://localhost:9000/extract")
        };
        let args = SyncArgs {
            command: Some("bridge".into()),
            args: vec!["--list".into()],
            ..SyncArgs::default()
        };

        let settings = extractor_settings(&args, &configured);

        assert_eq!(settings.resolved_kind(), Some(ExtractorKind::Command));
        assert_eq!(settings.command.as_deref(), Some("bridge"));
        assert_eq!(settings.args, vec!["--list".to_string()]);
        assert_eq!(settings.url, None);
        assert_eq!(settings.timeout_secs, Some(5));
    }

    #[test]
    fn test_from_file() {
        let args = SyncArgs {
            from: Some(PathBuf::from("capture.json")),
            ..SyncArgs::default()
        };
        let settings = extractor_settings(&args, &ExtractorSettings::default());
        assert_eq!(settings.resolved_kind(), Some(ExtractorKind::File));
        assert_eq!(settings.path, Some(PathBuf::from("capture.json")));
    }
}
