use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio_system::{
    FadeEffect, LoadMode, PlaybackSettings, DEFAULT_BUS_PATH, DEFAULT_FADE_FLOOR,
    DEFAULT_FADE_SECONDS,
};
use crate::error::ConfigError;

fn default_buses() -> HashMap<String, f32> {
    HashMap::from([(DEFAULT_BUS_PATH.to_string(), 1.0)])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder holding one sub-folder per item (relative to the config file)
    pub sfx_dir: String,

    /// Item catalog JSON (relative to the config file)
    pub catalog_path: String,

    /// Mixer bus item sounds play on
    pub bus_path: String,

    /// Fade-out duration in seconds
    pub fade_seconds: f32,

    /// Volume at which a fading sound counts as silent
    pub fade_floor: f32,

    /// Known mixer buses and their linear gain
    pub buses: HashMap<String, f32>,

    /// Read sound files into memory when registering instead of streaming
    /// them from disk on every play
    pub preload_sounds: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sfx_dir: "SFX".to_string(),
            catalog_path: "items.json".to_string(),
            bus_path: DEFAULT_BUS_PATH.to_string(),
            fade_seconds: DEFAULT_FADE_SECONDS,
            fade_floor: DEFAULT_FADE_FLOOR,
            buses: default_buses(),
            preload_sounds: false,
        }
    }
}

impl Config {
    /// Load configuration from `path`.
    /// Creates a default config file if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            tracing::info!("Created default config at: {}", path.display());
            return Ok(config);
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        config.validate()?;

        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ConfigError::DirectoryCreationFailed {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;
        fs::write(path, json).map_err(|e| ConfigError::SaveFailed {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        Ok(())
    }

    /// Get the config file path (in app's base directory)
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let exe_path = env::current_exe().map_err(|e| ConfigError::LoadFailed {
            path: "<current executable>".to_string(),
            source: Box::new(e),
        })?;
        let exe_dir = exe_path
            .parent()
            .ok_or_else(|| ConfigError::Invalid("Could not determine executable directory".to_string()))?;

        Ok(exe_dir.join("config").join("config.json"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fade_seconds.is_nan() || self.fade_seconds <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fade_seconds must be positive, got {}",
                self.fade_seconds
            )));
        }
        if !(0.0..1.0).contains(&self.fade_floor) {
            return Err(ConfigError::Invalid(format!(
                "fade_floor must be in [0, 1), got {}",
                self.fade_floor
            )));
        }
        if self.bus_path.trim().is_empty() {
            return Err(ConfigError::Invalid("bus_path must not be empty".to_string()));
        }
        Ok(())
    }

    /// Resolve a configured path against the directory of the config file
    pub fn resolve(&self, config_file: &Path, relative: &str) -> PathBuf {
        let path = Path::new(relative);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        config_file
            .parent()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|| path.to_path_buf())
    }

    pub fn playback_settings(&self) -> PlaybackSettings {
        PlaybackSettings {
            bus_path: self.bus_path.clone(),
            fade: FadeEffect::new(self.fade_seconds, self.fade_floor),
            load_mode: if self.preload_sounds {
                LoadMode::PRELOAD
            } else {
                LoadMode::STREAM
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sfx_dir, "SFX");
        assert_eq!(config.bus_path, "bus:/Master/SFX");
        assert_eq!(config.fade_seconds, 0.25);
        assert_eq!(config.fade_floor, 0.02);
        assert_eq!(config.buses.get("bus:/Master/SFX"), Some(&1.0));
        assert!(!config.preload_sounds);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_preload_switch_selects_load_mode() {
        assert_eq!(Config::default().playback_settings().load_mode, LoadMode::STREAM);

        let config: Config = serde_json::from_str(r#"{"preload_sounds":true}"#).unwrap();
        assert_eq!(config.playback_settings().load_mode, LoadMode::PRELOAD);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str(r#"{"sfx_dir":"Sounds"}"#).unwrap();
        assert_eq!(config.sfx_dir, "Sounds");
        assert_eq!(config.fade_seconds, 0.25);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("config.json");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = Config {
            fade_seconds: 0.0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config {
            fade_floor: 1.5,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_resolve_relative_to_config_file() {
        let config = Config::default();
        let file = Path::new("/opt/game/mods/config/config.json");
        assert_eq!(
            config.resolve(file, "SFX"),
            PathBuf::from("/opt/game/mods/config/SFX")
        );
        assert_eq!(config.resolve(file, "/abs/SFX"), PathBuf::from("/abs/SFX"));
    }
}
