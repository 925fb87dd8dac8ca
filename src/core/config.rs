//! Application settings
//!
//! Installation-wide preferences that are neither part of the publish profile
//! nor secret:
//! - commit message and fallback file path for published snapshots
//! - network timeout and conflict retry policy
//! - GitHub API base URL (for GitHub Enterprise)

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{FigsyncError, Result};

/// File path used when the profile leaves `path` empty
pub const DEFAULT_PATH: &str = "figma.json";

/// Commit message used for every publish unless overridden
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update Figma Variables";

/// Public GitHub API endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Commit message for published snapshots
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Target path when the profile has none
    #[serde(default = "default_path")]
    pub default_path: String,

    /// Upper bound on one publish round trip, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// How many times a publish is re-run after losing a write race
    #[serde(default = "default_conflict_retries")]
    pub conflict_retries: u32,

    /// GitHub REST API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_commit_message() -> String {
    DEFAULT_COMMIT_MESSAGE.to_string()
}

fn default_path() -> String {
    DEFAULT_PATH.to_string()
}

fn default_timeout() -> u64 {
    8
}

fn default_conflict_retries() -> u32 {
    1
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            commit_message: default_commit_message(),
            default_path: default_path(),
            timeout_secs: default_timeout(),
            conflict_retries: default_conflict_retries(),
            api_base_url: default_api_base_url(),
        }
    }
}

impl Settings {
    /// Load settings from file, or defaults if the file does not exist
    pub fn load() -> Result<Self> {
        let settings_path = Self::settings_path()?;

        if settings_path.exists() {
            let contents = fs::read_to_string(&settings_path)?;
            Self::from_toml(&contents)
        } else {
            Ok(Settings::default())
        }
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Get the settings file path
    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the configuration directory
    pub fn config_dir() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "figsync", "figsync")
            .ok_or_else(|| FigsyncError::Config("Could not determine config directory".into()))?;

        Ok(project_dirs.config_dir().to_path_buf())
    }

    /// Publish timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject values that would make publishing impossible
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(FigsyncError::Config(
                "timeout_secs must be at least 1".into(),
            ));
        }
        if self.commit_message.trim().is_empty() {
            return Err(FigsyncError::Config("commit_message cannot be empty".into()));
        }
        if self.default_path.trim().trim_matches('/').is_empty() {
            return Err(FigsyncError::Config("default_path cannot be empty".into()));
        }
        Url::parse(&self.api_base_url).map_err(|e| {
            FigsyncError::Config(format!("Invalid api_base_url '{}': {}", self.api_base_url, e))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.commit_message, "Update Figma Variables");
        assert_eq!(settings.default_path, "figma.json");
        assert_eq!(settings.timeout(), Duration::from_secs(8));
        assert_eq!(settings.conflict_retries, 1);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings = Settings::from_toml("timeout_secs = 3\n").unwrap();
        assert_eq!(settings.timeout_secs, 3);
        assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(Settings::from_toml("timeout_secs = 0\n").is_err());
        assert!(Settings::from_toml("api_base_url = \"not a url\"\n").is_err());
        assert!(Settings::from_toml("commit_message = \"  \"\n").is_err());
        assert!(Settings::from_toml("default_path = \"\"\n").is_err());
        assert!(Settings::from_toml("default_path = \"/\"\n").is_err());
    }
}
