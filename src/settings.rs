//! Client-side settings.
//!
//! Settings come from an optional YAML file and are then overridden by
//! command-line flags and environment variables (see [`crate::cli::Cli`]).
//!
//! ```yaml
//! api_base: http://127.0.0.1:8000
//! request_timeout_secs: 120
//! toast_ttl_ms: 3000
//! scrape_max_count: 10
//! ```

use crate::error::{ConsoleError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the backend service.
    pub api_base: String,
    /// Per-request timeout; absent means requests may hang indefinitely.
    pub request_timeout_secs: Option<u64>,
    pub toast_ttl_ms: u64,
    /// Items per source requested by a manual scrape.
    pub scrape_max_count: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_secs: None,
            toast_ttl_ms: 3000,
            scrape_max_count: 10,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or defaults when no path is given.
    #[instrument(level = "info", skip_all)]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("No settings file; using defaults");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)?;
        let settings = Self::from_yaml(&raw)
            .map_err(|e| ConsoleError::Settings(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), api_base = %settings.api_base, "Loaded settings");
        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn with_api_base(mut self, api_base: Option<String>) -> Self {
        if let Some(base) = api_base {
            self.api_base = base;
        }
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.api_base, DEFAULT_API_BASE);
        assert_eq!(s.request_timeout(), None);
        assert_eq!(s.toast_ttl(), Duration::from_millis(3000));
        assert_eq!(s.scrape_max_count, 10);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let s = Settings::from_yaml("api_base: http://backend:9000\nrequest_timeout_secs: 30\n")
            .unwrap();
        assert_eq!(s.api_base, "http://backend:9000");
        assert_eq!(s.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(s.scrape_max_count, 10);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Settings::from_yaml("  \n").unwrap(), Settings::default());
    }

    #[test]
    fn test_load_from_file_and_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_base: http://from-file:8000").unwrap();

        let s = Settings::load(Some(file.path())).unwrap();
        assert_eq!(s.api_base, "http://from-file:8000");

        let s = s.with_api_base(Some("http://from-flag:1".into()));
        assert_eq!(s.api_base, "http://from-flag:1");
    }

    #[test]
    fn test_load_invalid_yaml_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "toast_ttl_ms: [not, a, number]").unwrap();

        let err = Settings::load(Some(file.path())).unwrap_err();
        let path = file.path().display().to_string();
        assert!(matches!(err, ConsoleError::Settings(ref msg) if msg.starts_with(&path)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/newsroom.yaml"))).unwrap_err();
        assert!(matches!(err, ConsoleError::Io(_)));
    }
}
