//! The settings file, `~/.crmsync/config.json`.
//!
//! Every member is optional. Environment variables override the file:
//! - `CRMSYNC_POLL_INTERVAL_MS` - watch poll interval
//! - `CRMSYNC_QUOTA_BYTES` - storage quota (`0` disables it)
//! - `CRMSYNC_EXTRACTOR_URL`, `CRMSYNC_EXTRACTOR_COMMAND` or
//!   `CRMSYNC_EXTRACTOR_FILE` - select that extractor (first one set wins)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::extract::ExtractorKind;
use crate::notify::DEFAULT_POLL_INTERVAL;
use crate::storage::DEFAULT_QUOTA_BYTES;

/// Extractor selection and its parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractorSettings {
    /// Adapter to use. Inferred from the other members when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ExtractorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ExtractorSettings {
    /// Settings for a file extractor.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: Some(ExtractorKind::File),
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Settings for a command extractor.
    #[must_use]
    pub fn command(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            kind: Some(ExtractorKind::Command),
            command: Some(command.into()),
            args,
            ..Self::default()
        }
    }

    /// Settings for an HTTP extractor.
    #[must_use]
    pub fn http(url: impl Into<String>) -> Self {
        Self {
            kind: Some(ExtractorKind::Http),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// The adapter these settings select.
    ///
    /// An explicit `kind` wins; otherwise `url`, then `command`, then `path`.
    #[must_use]
    pub fn resolved_kind(&self) -> Option<ExtractorKind> {
        self.kind.or_else(|| {
            if self.url.is_some() {
                Some(ExtractorKind::Http)
            } else if self.command.is_some() {
                Some(ExtractorKind::Command)
            } else if self.path.is_some() {
                Some(ExtractorKind::File)
            } else {
                None
            }
        })
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Contents of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_bytes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
    #[serde(default)]
    pub extractor: ExtractorSettings,
}

impl Settings {
    /// Load `~/.crmsync/config.json` and apply environment overrides.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file or an override cannot be parsed.
    pub fn load() -> Result<Self> {
        let mut settings = match super::config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(settings)
    }

    /// Load a settings file. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {e}")))
    }

    /// Write the settings file, creating its directory.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {e}")))
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Empty values are ignored. A selected extractor replaces the
    /// configured one entirely.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a numeric override does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(value) = get("CRMSYNC_POLL_INTERVAL_MS") {
            self.poll_interval_ms = Some(parse_number("CRMSYNC_POLL_INTERVAL_MS", &value)?);
        }
        if let Some(value) = get("CRMSYNC_QUOTA_BYTES") {
            self.quota_bytes = Some(parse_number("CRMSYNC_QUOTA_BYTES", &value)?);
        }

        if let Some(url) = get("CRMSYNC_EXTRACTOR_URL") {
            self.extractor = ExtractorSettings {
                timeout_secs: self.extractor.timeout_secs,
                ..ExtractorSettings::http(url)
            };
        } else if let Some(command) = get("CRMSYNC_EXTRACTOR_COMMAND") {
            self.extractor = ExtractorSettings {
                timeout_secs: self.extractor.timeout_secs,
                ..ExtractorSettings::command(command, Vec::new())
            };
        } else if let Some(path) = get("CRMSYNC_EXTRACTOR_FILE") {
            self.extractor = ExtractorSettings::file(path);
        }
        Ok(())
    }

    /// Poll interval for `watch`, 2 s by default.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_ms
            .map_or(DEFAULT_POLL_INTERVAL, Duration::from_millis)
    }

    /// Storage quota in bytes; `None` when disabled with `0`.
    #[must_use]
    pub fn quota(&self) -> Option<usize> {
        match self.quota_bytes {
            Some(0) => None,
            Some(bytes) => Some(bytes),
            None => Some(DEFAULT_QUOTA_BYTES),
        }
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{name} must be a non-negative integer, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.poll_interval(), Duration::from_millis(2000));
        assert_eq!(settings.quota(), Some(DEFAULT_QUOTA_BYTES));
        assert_eq!(settings.extractor.resolved_kind(), None);
    }

    #[test]
    fn test_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from(&temp_dir.path().join("config.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/config.json");
        let settings = Settings {
            poll_interval_ms: Some(500),
            quota_bytes: Some(0),
            export_dir: Some(PathBuf::from("/tmp/out")),
            extractor: ExtractorSettings::command("bridge", vec!["--leads".into()]),
        };

        settings.save_to(&path).unwrap();
        let loaded = Settings::load_from(&path).unwrap();

        assert_eq!(loaded, settings);
        assert_eq!(loaded.quota(), None);
        assert_eq!(loaded.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_parses_camel_case_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"pollIntervalMs":1000,"extractor":{"url":"http://localhost:7777/extract","timeoutSecs":5}}"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.poll_interval_ms, Some(1000));
        assert_eq!(settings.extractor.resolved_kind(), Some(ExtractorKind::Http));
        assert_eq!(settings.extractor.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "{").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings {
            extractor: ExtractorSettings::file("/captures/leads.json"),
            ..Settings::default()
        };
        settings
            .apply_overrides(env(&[
                ("CRMSYNC_POLL_INTERVAL_MS", "250"),
                ("CRMSYNC_EXTRACTOR_URL", "http://bridge/extract"),
                ("CRMSYNC_EXTRACTOR_FILE", "/ignored.json"),
            ]))
            .unwrap();

        assert_eq!(settings.poll_interval_ms, Some(250));
        assert_eq!(settings.extractor, ExtractorSettings::http("http://bridge/extract"));
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let mut settings = Settings::default();
        settings
            .apply_overrides(env(&[("CRMSYNC_QUOTA_BYTES", "  ")]))
            .unwrap();
        assert_eq!(settings.quota_bytes, None);
    }

    #[test]
    fn test_bad_number_override() {
        let mut settings = Settings::default();
        let err = settings
            .apply_overrides(env(&[("CRMSYNC_QUOTA_BYTES", "lots")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("CRMSYNC_QUOTA_BYTES")));
    }

    #[test]
    fn test_kind_inference_order() {
        let settings = ExtractorSettings {
            path: Some(PathBuf::from("x.json")),
            command: Some("bridge".into()),
            ..ExtractorSettings::default()
        };
        assert_eq!(settings.resolved_kind(), Some(ExtractorKind::Command));
    }
}
