//! Application configuration
//!
//! Loaded from `config.toml` in the platform config directory. Every field
//! has a default, so partial files are fine.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::audio::buffer::OverflowPolicy;
use crate::audio::block::FillPolicy;
use crate::constants::*;
use crate::error::{ConfigError, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub capture: CaptureConfig,
    pub playback: PlaybackConfig,
}

/// Device stream settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Frames per channel in one render quantum
    pub quantum_frames: usize,
    /// `input:<name>`; default input device when unset
    pub input_device: Option<String>,
    /// `output:<name>`; default output device when unset
    pub output_device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            quantum_frames: RENDER_QUANTUM_FRAMES,
            input_device: None,
            output_device: None,
        }
    }
}

impl AudioConfig {
    /// Quantum duration in milliseconds
    pub fn quantum_ms(&self) -> f32 {
        self.quantum_frames as f32 * 1000.0 / self.sample_rate as f32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Outbound channel capacity in quanta
    pub outbound_capacity: usize,
    /// Capture flag at startup
    pub start_active: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            start_active: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Inbound queue capacity in quanta
    pub queue_capacity: usize,
    pub overflow: OverflowPolicy,
    pub fill: FillPolicy,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            overflow: OverflowPolicy::default(),
            fill: FillPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Default config file location, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "wsvoip", "wsvoip-audio")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self).map_err(ConfigError::from)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load from the default path, or defaults if there is no usable file
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(crate::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.audio.sample_rate == 0 {
            return Err(ConfigError::Invalid {
                field: "audio.sample_rate",
                reason: "must be positive".to_string(),
            });
        }
        if self.audio.channels == 0 {
            return Err(ConfigError::Invalid {
                field: "audio.channels",
                reason: "must be positive".to_string(),
            });
        }
        if self.audio.quantum_frames == 0 {
            return Err(ConfigError::Invalid {
                field: "audio.quantum_frames",
                reason: "must be positive".to_string(),
            });
        }
        if self.capture.outbound_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "capture.outbound_capacity",
                reason: "must be positive".to_string(),
            });
        }
        if self.playback.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "playback.queue_capacity",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}
