//! User configuration for the overlay.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{OverlayError, Result};

/// Subdirectory of the data directory holding persisted state files.
pub const STATE_DIR: &str = "state";

/// Settings read from the host's TOML configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OverlaySettings {
    /// Root for persisted state. Defaults to the per-user data directory.
    pub data_dir: Option<PathBuf>,

    /// Skip (and log) points of interest of unsupported or unknown kinds
    /// instead of failing the whole pack load.
    pub skip_unsupported_points: bool,
}

impl OverlaySettings {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load settings from a file; a missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Directory for persisted state files, created if missing.
    pub fn state_dir(&self) -> Result<PathBuf> {
        let base = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => directories::ProjectDirs::from("", "", "pathing-overlay")
                .ok_or(OverlayError::NoDataDir)?
                .data_dir()
                .to_path_buf(),
        };

        let dir = base.join(STATE_DIR);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_settings() {
        let settings = OverlaySettings::from_toml_str(
            r#"
            data_dir = "/tmp/overlay"
            skip_unsupported_points = true
            "#,
        )
        .unwrap();

        assert_eq!(settings.data_dir, Some(PathBuf::from("/tmp/overlay")));
        assert!(settings.skip_unsupported_points);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings = OverlaySettings::from_toml_str("").unwrap();
        assert_eq!(settings, OverlaySettings::default());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = OverlaySettings::load(dir.path().join("absent.toml")).unwrap();
        assert!(!settings.skip_unsupported_points);
    }

    #[test]
    fn test_state_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let settings = OverlaySettings {
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        let state_dir = settings.state_dir().unwrap();
        assert_eq!(state_dir, dir.path().join(STATE_DIR));
        assert!(state_dir.is_dir());
    }

    #[test]
    fn test_malformed_settings_are_an_error() {
        let result = OverlaySettings::from_toml_str("skip_unsupported_points = \"sometimes\"");
        assert!(matches!(result, Err(OverlayError::Config(_))));
    }
}
