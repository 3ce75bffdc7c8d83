// Configuration management
//
// Handles emulator configuration, settings persistence, and speed control.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::debug::LogLevel;

/// Default configuration file path
const CONFIG_FILE: &str = "emulator_config.toml";

/// Emulator configuration
///
/// Stores all user-configurable settings of the emulation core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmulatorConfig {
    /// Video settings
    pub video: VideoConfig,

    /// Save state settings
    pub save_state: SaveStateConfig,

    /// Cartridge SRAM persistence
    pub sram: SramConfig,

    /// Diagnostics
    pub log: LogConfig,
}

/// Video configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Target FPS (60 for NTSC)
    pub fps: u32,
}

/// Save state configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveStateConfig {
    /// Number of save slots (1-10)
    pub slots: u8,

    /// Save directory
    pub save_directory: PathBuf,
}

/// SRAM persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SramConfig {
    /// Write .srm files automatically when a cartridge is unplugged
    pub auto_save: bool,

    /// Directory for .srm files
    pub directory: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level name: "none", "error", "warning", "info", "debug", "trace"
    pub level: String,
}

impl LogConfig {
    /// Parse the configured level, defaulting to warnings.
    pub fn level(&self) -> LogLevel {
        match self.level.as_str() {
            "none" => LogLevel::None,
            "error" => LogLevel::Error,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            _ => LogLevel::Warning,
        }
    }
}

/// Speed mode for emulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedMode {
    /// Normal speed (1x)
    Normal,

    /// Fast forward: frames are emulated but not rendered
    FastForward,

    /// Paused (0x)
    Paused,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        EmulatorConfig {
            video: VideoConfig { fps: 60 },
            save_state: SaveStateConfig {
                slots: 10,
                save_directory: PathBuf::from("saves"),
            },
            sram: SramConfig {
                auto_save: true,
                directory: PathBuf::from("sram"),
            },
            log: LogConfig {
                level: "warning".to_string(),
            },
        }
    }
}

impl EmulatorConfig {
    /// Load configuration from file or create default
    ///
    /// If the configuration file doesn't exist, creates a default
    /// configuration and saves it to the file.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|_| {
            let config = Self::default();
            // Try to save the default config, but don't fail if we can't
            let _ = config.save();
            config
        })
    }

    /// Load configuration from file
    pub fn load() -> Result<Self, io::Error> {
        let contents = fs::read_to_string(CONFIG_FILE)?;
        toml::from_str(&contents).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<(), io::Error> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(CONFIG_FILE, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmulatorConfig::default();
        assert_eq!(config.video.fps, 60);
        assert_eq!(config.save_state.slots, 10);
        assert!(config.sram.auto_save);
        assert_eq!(config.log.level(), LogLevel::Warning);
    }

    #[test]
    fn test_log_level_parse() {
        let mut config = EmulatorConfig::default();
        config.log.level = "trace".to_string();
        assert_eq!(config.log.level(), LogLevel::Trace);

        config.log.level = "bogus".to_string();
        assert_eq!(config.log.level(), LogLevel::Warning);
    }

    #[test]
    fn test_config_serialization() {
        let config = EmulatorConfig::default();
        let toml_str = toml::to_string(&config).expect("Failed to serialize");
        let deserialized: EmulatorConfig =
            toml::from_str(&toml_str).expect("Failed to deserialize");

        assert_eq!(deserialized.video.fps, config.video.fps);
        assert_eq!(deserialized.sram.auto_save, config.sram.auto_save);
    }
}
