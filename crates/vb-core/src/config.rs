//! Runtime options and their persistence

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options read by the frame loop and edited by the menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeOptions {
    /// Extra CPU-engine steps run per displayed frame
    pub frame_skip: u32,
    pub display_mode: DisplayMode,
    /// Verbose overlay and debug-level logging
    pub debug: bool,
    pub log_level: LogLevel,
    /// Name of the last selected ROM, relative to `paths.rom_dir`
    pub rom_name: Option<String>,
    pub paths: PathOptions,
}

/// Output mode of the top screen
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Mono,
    #[default]
    Stereo,
}

impl DisplayMode {
    pub fn is_stereo(self) -> bool {
        self == Self::Stereo
    }
}

/// Path configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathOptions {
    pub rom_dir: PathBuf,
}

/// Logging level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            frame_skip: 0,
            display_mode: DisplayMode::default(),
            debug: false,
            log_level: LogLevel::default(),
            rom_name: None,
            paths: PathOptions::default(),
        }
    }
}

impl Default for PathOptions {
    fn default() -> Self {
        let base = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("oxidized-vb");

        Self {
            rom_dir: base.join("roms"),
        }
    }
}

impl RuntimeOptions {
    /// Number of CPU-engine steps per outer loop iteration
    pub fn steps_per_frame(&self) -> u32 {
        self.frame_skip.saturating_add(1)
    }

    /// Level the logger should run at, taking the debug switch into account
    pub fn effective_log_level(&self) -> LogLevel {
        if self.debug {
            self.log_level.max(LogLevel::Debug)
        } else {
            self.log_level
        }
    }

    /// Full path of a ROM picked from the ROM directory
    pub fn rom_path(&self, name: &str) -> PathBuf {
        self.paths.rom_dir.join(name)
    }
}

/// Persistence backend for [`RuntimeOptions`]
pub trait OptionsStore {
    /// Load the stored options
    fn load(&mut self) -> Result<RuntimeOptions, ConfigError>;

    /// Persist the given options
    fn save(&mut self, options: &RuntimeOptions) -> Result<(), ConfigError>;
}

/// Options stored as a TOML file
#[derive(Debug, Clone)]
pub struct TomlOptionsStore {
    path: PathBuf,
}

impl TomlOptionsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store located in the user's configuration directory
    pub fn in_config_dir() -> Self {
        Self::new(Self::default_path())
    }

    /// Get the path to the options file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("oxidized-vb")
            .join("options.toml")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OptionsStore for TomlOptionsStore {
    fn load(&mut self) -> Result<RuntimeOptions, ConfigError> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    fn save(&mut self, options: &RuntimeOptions) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(options)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
