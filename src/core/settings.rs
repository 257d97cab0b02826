//! Application settings management

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

const SETTINGS_FILE_NAME: &str = "settings.json";

/// Polling periods of the three reconciliation loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub discovery: Duration,
    pub prune: Duration,
    pub refresh: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Settings::default().poll_intervals()
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Polling
    /// Seconds between scans for newly created profiles
    pub discovery_interval_secs: u64,
    /// Seconds between scans for deleted profiles
    pub prune_interval_secs: u64,
    /// Seconds between status icon refreshes
    pub refresh_interval_secs: u64,

    // Control
    /// Binary invoked as `<binary> start|stop|status --profile <id>`
    pub control_binary: PathBuf,
    /// Directory whose subdirectories are the known profiles
    pub profiles_directory: Option<PathBuf>,
    /// Profile that always exists, listed before the directory entries
    pub default_profile: Option<String>,
    /// Where start/stop launch scripts are written
    pub script_directory: Option<PathBuf>,

    // Advanced
    /// Enable debug logging
    pub debug_logging: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            discovery_interval_secs: 40,
            prune_interval_secs: 30,
            refresh_interval_secs: 20,

            control_binary: PathBuf::from("minishift"),
            profiles_directory: None,
            default_profile: Some("minishift".to_string()),
            script_directory: None,

            debug_logging: false,
        }
    }
}

impl Settings {
    /// Load settings from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::settings_path())
    }

    /// Load settings from `path`. A missing file yields defaults; an
    /// unreadable or malformed one is an error for the caller to report.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        let mut settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings {}", path.display()))?;
        settings.validate();
        Ok(settings)
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings {}", path.display()))?;
        info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Get the data directory holding the settings file
    pub fn get_data_directory() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::APP_NAME)
    }

    pub fn settings_path() -> PathBuf {
        Self::get_data_directory().join(SETTINGS_FILE_NAME)
    }

    /// Get the profiles directory, using `~/.minishift/profiles` if not set
    pub fn get_profiles_directory(&self) -> PathBuf {
        self.profiles_directory.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".minishift")
                .join("profiles")
        })
    }

    /// Get the launch script directory, using the system temp dir if not set
    pub fn get_script_directory(&self) -> PathBuf {
        self.script_directory
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Validate settings and fix any invalid values
    pub fn validate(&mut self) {
        self.discovery_interval_secs = self.discovery_interval_secs.max(1);
        self.prune_interval_secs = self.prune_interval_secs.max(1);
        self.refresh_interval_secs = self.refresh_interval_secs.max(1);
        if self
            .default_profile
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            self.default_profile = None;
        }
    }

    pub fn poll_intervals(&self) -> PollIntervals {
        PollIntervals {
            discovery: Duration::from_secs(self.discovery_interval_secs),
            prune: Duration::from_secs(self.prune_interval_secs),
            refresh: Duration::from_secs(self.refresh_interval_secs),
        }
    }
}
