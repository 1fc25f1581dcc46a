//! Settings layered from defaults, an optional file and the environment.
//!
//! Later sources override earlier ones:
//!
//! 1. built-in defaults
//! 2. the settings file (TOML, JSON or YAML, chosen by extension), if given
//!    and present
//! 3. `PIPETIMER_*` environment variables, e.g. `PIPETIMER_NOTABLE_RUNS=5`

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::data::Thresholds;
use crate::error::Result;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "PIPETIMER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Default `tracing` filter directive, e.g. `"info"` or `"pipetimer=debug"`.
    pub log_level: String,
    pub long_run_threshold_ms: i64,
    pub notable_runs: usize,
    pub error_excerpt_chars: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        Self {
            log_level: "info".to_string(),
            long_run_threshold_ms: thresholds.long_run_threshold_ms,
            notable_runs: thresholds.notable_runs,
            error_excerpt_chars: thresholds.error_excerpt_chars,
        }
    }
}

impl Settings {
    /// Load settings. A missing file is not an error; a malformed one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("log_level", defaults.log_level)?
            .set_default("long_run_threshold_ms", defaults.long_run_threshold_ms)?
            .set_default("notable_runs", defaults.notable_runs as i64)?
            .set_default("error_excerpt_chars", defaults.error_excerpt_chars as i64)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            long_run_threshold_ms: self.long_run_threshold_ms,
            notable_runs: self.notable_runs,
            error_excerpt_chars: self.error_excerpt_chars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use std::io::Write;
    use tempfile::Builder;

    fn settings_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.thresholds(), Thresholds::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = Settings::load(Some(Path::new("/nonexistent/pipetimer.toml"))).unwrap();
        assert_eq!(settings.long_run_threshold_ms, 7_200_000);
    }

    #[test]
    fn test_toml_file_overrides() {
        let file = settings_file(
            ".toml",
            "log_level = \"debug\"\nlong_run_threshold_ms = 60000\nnotable_runs = 5\n",
        );
        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.long_run_threshold_ms, 60_000);
        assert_eq!(settings.notable_runs, 5);
        assert_eq!(settings.error_excerpt_chars, 200);

        let thresholds = settings.thresholds();
        assert_eq!(thresholds.notable_runs, 5);
    }

    #[test]
    fn test_json_file_overrides() {
        let file = settings_file(".json", r#"{"error_excerpt_chars": 80}"#);
        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.error_excerpt_chars, 80);
        assert_eq!(settings.notable_runs, 3);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let file = settings_file(".toml", "notable_runs = = 5");
        assert!(matches!(
            Settings::load(Some(file.path())),
            Err(AnalysisError::Config(_))
        ));
    }
}
