//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$SMSG_CONFIG` (environment variable)
//! 2. `~/.config/smolmsg/config.toml` (Linux)
//!    `~/Library/Application Support/smolmsg/config.toml` (macOS)
//!    `%APPDATA%\smolmsg\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable overriding the message directory.
pub const MSG_DIR_ENV: &str = "SMSG_MSGDIR";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "SMSG_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Message list output.
    pub list: ListConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Root directory for messages (holds `inbox/` and `outbox/`).
    pub msg_dir: Option<PathBuf>,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Message list output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListConfig {
    /// Number of messages shown by `smsg list`.
    pub limit: usize,
    /// `strftime` format string for dates in the message list.
    pub date_format: String,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            msg_dir: None,
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            limit: 20,
            date_format: "%Y-%m-%d %H:%M".to_string(),
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<()> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(())
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("smolmsg").join("config.toml"))
}

/// Resolve the message directory.
///
/// Order: explicit `override_dir` (the `-C` flag), `$SMSG_MSGDIR`,
/// `general.msg_dir`, then `~/.smolmsg`.
pub fn msg_dir(config: &Config, override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    if let Some(dir) = std::env::var_os(MSG_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    if let Some(ref dir) = config.general.msg_dir {
        return dir.clone();
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".smolmsg")
}

/// Directory of received messages.
pub fn inbox_dir(msg_dir: &Path) -> PathBuf {
    msg_dir.join("inbox")
}

/// Directory of messages waiting to be sent.
pub fn outbox_dir(msg_dir: &Path) -> PathBuf {
    msg_dir.join("outbox")
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("smolmsg")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("smsg.log")
}
