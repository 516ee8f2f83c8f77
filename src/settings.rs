use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::locate::LocateAlgorithm;

/// Environment variable overriding the settings file location.
pub const SETTINGS_ENV: &str = "SPECTRAL_MATCH_SETTINGS";
const DEFAULT_SETTINGS_FILE: &str = "spectral_match_settings.json";

// ---------------------------------------------------------------------------
// Persisted settings
// ---------------------------------------------------------------------------

/// Defaults for the results window, persisted as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    pub locate_algorithm: LocateAlgorithm,
    /// Maximum spectral angle (degrees) for a SAM locate hit.
    pub locate_sam_threshold: f64,
    /// Minimum CEM score for a locate hit.
    pub locate_cem_threshold: f64,
    /// Show the locate options window before every locate.
    pub display_locate_options: bool,
    /// Upper bound on the number of results pages.
    pub max_result_pages: usize,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            locate_algorithm: LocateAlgorithm::Sam,
            locate_sam_threshold: 5.0,
            locate_cem_threshold: 0.3,
            display_locate_options: true,
            max_result_pages: 64,
        }
    }
}

impl MatchSettings {
    /// Location of the settings file: `$SPECTRAL_MATCH_SETTINGS` or
    /// `spectral_match_settings.json` in the working directory.
    pub fn default_path() -> PathBuf {
        std::env::var_os(SETTINGS_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
    }

    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing settings file {}", path.display()))
    }

    /// Like [`Self::load`], but falls back to the defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings: {e:#}");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("serializing settings")?;
        std::fs::write(path, text)
            .with_context(|| format!("writing settings file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = MatchSettings::load(&dir.path().join("none.json")).unwrap();
        assert_eq!(settings, MatchSettings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = MatchSettings {
            locate_algorithm: LocateAlgorithm::Cem,
            locate_cem_threshold: 0.42,
            display_locate_options: false,
            ..MatchSettings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(MatchSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let settings: MatchSettings =
            serde_json::from_str(r#"{ "locate_algorithm": "CEM" }"#).unwrap();
        assert_eq!(settings.locate_algorithm, LocateAlgorithm::Cem);
        assert_eq!(settings.locate_sam_threshold, 5.0);
        assert!(settings.display_locate_options);
    }

    #[test]
    fn unknown_algorithm_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "locate_algorithm": "ACE" }"#).unwrap();

        assert!(MatchSettings::load(&path).is_err());
        assert_eq!(MatchSettings::load_or_default(&path), MatchSettings::default());
    }
}
