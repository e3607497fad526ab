//! Configuration management

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    /// Device properties file (identity + fallback playlist)
    #[serde(default)]
    pub properties_file: Option<PathBuf>,
}

impl Config {
    pub fn properties_path(&self) -> PathBuf {
        self.properties_file
            .clone()
            .unwrap_or_else(|| get_config_dir().join(PROPERTIES_FILE))
    }
}

fn default_port() -> u16 {
    8000
}

/// Remote display TCP endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_display_host")]
    pub host: String,
    #[serde(default = "default_display_port")]
    pub port: u16,
    #[serde(default = "default_display_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_display_timeout")]
    pub reply_timeout_secs: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            host: default_display_host(),
            port: default_display_port(),
            connect_timeout_secs: default_display_timeout(),
            reply_timeout_secs: default_display_timeout(),
        }
    }
}

fn default_display_host() -> String {
    "localhost".to_string()
}

fn default_display_port() -> u16 {
    32000
}

fn default_display_timeout() -> u64 {
    3
}

/// Dashboard enrolment
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Enrol with the dashboard and fetch the playlist from it. When false the
    /// playlist stored in the properties file is used.
    #[serde(default = "default_true")]
    pub enrol: bool,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enrol: true,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Start playing as soon as the playlist is loaded at startup
    #[serde(default)]
    pub autoplay: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            autoplay: false,
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    1000
}

/// Device properties file name inside the config directory
pub const PROPERTIES_FILE: &str = "properties.json";

/// Get config directory (KIOSK_CONFIG_DIR, XDG_CONFIG_HOME or platform default)
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("KIOSK_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("kiosk-control");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".config/kiosk-control");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join("Library/Application Support/kiosk-control");
        }
    }

    // Fallback to current directory
    PathBuf::from(".")
}

pub fn load_config() -> Result<Config> {
    let config_dir = get_config_dir();

    let mut builder = ::config::Config::builder()
        .set_default("port", default_port() as i64)?
        // Load from config file if it exists
        .add_source(
            ::config::File::with_name(&config_dir.join("config").to_string_lossy()).required(false),
        )
        // Override with environment variables (KIOSK_PORT, KIOSK_DISPLAY__HOST, etc.)
        .add_source(
            ::config::Environment::with_prefix("KIOSK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    // Explicit port precedence: KIOSK_PORT > PORT > config file > default
    if let Ok(port) = std::env::var("KIOSK_PORT") {
        if let Ok(port_num) = port.parse::<u16>() {
            builder = builder.set_override("port", port_num as i64)?;
        }
    } else if let Ok(port) = std::env::var("PORT") {
        if let Ok(port_num) = port.parse::<u16>() {
            builder = builder.set_override("port", port_num as i64)?;
        }
    }

    let config = builder.build()?;

    Ok(config.try_deserialize()?)
}
