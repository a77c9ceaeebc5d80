//! Configuration for the plaza client.
//!
//! Read from `~/.config/plaza/config.toml` at startup. A commented default
//! file is written when none exists; any field left out keeps its default.

pub mod colors;
pub mod keybindings;

pub use colors::ColorConfig;
pub use keybindings::KeybindingConfig;

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub colors: ColorConfig,
    pub keybindings: KeybindingConfig,
}

/// Where the backend lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Including the version prefix, e.g. `http://localhost:8080/v1`.
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_config_path()?)
    }

    /// Load `path`, writing the commented default there first if missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::write_default(path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// `~/.config/plaza/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("plaza").join("config.toml"))
    }

    fn write_default(path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, DEFAULT_CONFIG).map_err(io_err)
    }
}

const DEFAULT_CONFIG: &str = r##"# plaza configuration
#
# Colors are named (Black, Red, Green, Yellow, Blue, Magenta, Cyan, Gray,
# DarkGray, LightRed, LightGreen, LightYellow, LightBlue, LightMagenta,
# LightCyan, White, Reset) or hex ("#RRGGBB", "#RGB").
#
# Keys are single characters ("a", "+", "/"), named keys (Enter, Tab,
# Backspace, Delete, Home, End, PageUp, PageDown, Up, Down, Left, Right,
# Esc, Space, F1-F12), optionally with modifiers ("Ctrl+c", "Alt+Enter").

[api]
base_url = "http://localhost:8080/v1"
timeout_secs = 10

[colors]
active_border = "Cyan"
inactive_border = "DarkGray"
selection_bg = "Cyan"
selection_fg = "Black"
title = "White"
author = "Yellow"
tag = "Magenta"
timestamp = "DarkGray"
skeleton = "DarkGray"
error = "LightRed"
status_fg = "White"
status_bg = "DarkGray"

[keybindings]
quit = ["q", "Ctrl+c"]
move_up = ["k", "Up"]
move_down = ["j", "Down"]

# Filters. Removing or clearing tags applies immediately.
search = ["/"]
add_tag = ["+"]
remove_tag = ["-"]
clear_tags = ["X"]
toggle_sort = ["o"]
submit = ["s"]

load_more = ["L"]
refresh = ["R"]

open_comments = ["Enter"]
write_comment = ["c"]
toggle_follow = ["f"]
open_profile = ["u"]
switch_feed = ["e"]

back = ["[", "Backspace"]
forward = ["]"]
cancel = ["Esc"]
"##;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    #[test]
    fn test_default_config_deserializes() {
        let config: Config =
            toml::from_str(DEFAULT_CONFIG).expect("Default config should be valid TOML");
        assert_eq!(config.api, ApiConfig::default());
        assert_eq!(config.colors.active_border, Color::Cyan);
        assert_eq!(config.keybindings.quit, vec!["q", "Ctrl+c"]);
        assert_eq!(config.keybindings.add_tag, vec!["+"]);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[api]
base_url = "https://social.example.com/v1"

[colors]
tag = "#FF0000"
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");
        assert_eq!(config.api.base_url, "https://social.example.com/v1");
        assert_eq!(config.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.colors.tag, Color::Rgb(255, 0, 0));
        assert_eq!(config.colors.author, Color::Yellow);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.keybindings.refresh, vec!["R"]);
    }

    #[test]
    fn test_load_from_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plaza").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api, ApiConfig::default());
        assert!(path.exists());

        fs::write(&path, "[api]\ntimeout_secs = 3\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().api.timeout_secs, 3);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[colors]\ntag = \"chartreuse\"\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
