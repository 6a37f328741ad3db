//! Configuration loading and defaults for active-window-notifier.
//!
//! The call coordinates are fixed; only the plumbing around them is
//! configurable.

use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;

use crate::notifier::Bus;
use crate::source::SourceKind;

/// Main configuration for active-window-notifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where activation events come from (default: hyprland).
    pub source: SourceKind,

    /// Which bus the notification is sent on (default: session).
    pub bus: Bus,

    /// Dry run mode: log calls instead of sending them.
    pub dry_run: bool,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration from `path`, the default location, or defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(p) = path {
            return Self::load(p);
        }

        if let Some(default_path) = default_path()
            && default_path.exists()
        {
            return Self::load(&default_path);
        }

        Ok(Self::default())
    }
}

/// `$XDG_CONFIG_HOME/active-window-notifier/config.toml`, if a config dir exists.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("active-window-notifier").join("config.toml"))
}
