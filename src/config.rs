//! # Stick Configuration
//!
//! Channel assignment and tuning for one stick, stored as TOML:
//!
//! ```toml
//! x_channel = 0
//! y_channel = 1
//! button_channel = 17
//! deadzone = 0.1
//! latch = true
//! poll_interval_ms = 20
//! ```
//!
//! Every field has a default, so a partial file (or no file at all) still
//! yields a usable configuration. Values read from disk are validated before
//! they reach the reader, which itself trusts its caller.

use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::hal::{AnalogSampleProvider, Channel, DigitalLevelProvider};
use crate::stick::{Ready, StickError, StickReader, DEFAULT_DEADZONE};

const CONFIG_DIR: &str = "stickreader";
const CONFIG_FILE: &str = "stick.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse stick config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize stick config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Deadzone must be in [0, 1), got {0}")]
    InvalidDeadzone(f64),

    #[error("Channel {0} is assigned more than once")]
    DuplicateChannel(Channel),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct StickConfig {
    pub x_channel: Channel,
    pub y_channel: Channel,
    pub button_channel: Option<Channel>,
    pub deadzone: f64,
    /// Report each button press once instead of on every poll
    pub latch: bool,
    pub poll_interval_ms: u64,
}

impl Default for StickConfig {
    fn default() -> Self {
        Self {
            x_channel: Channel(0),
            y_channel: Channel(1),
            button_channel: None,
            deadzone: DEFAULT_DEADZONE,
            latch: true,
            poll_interval_ms: 20,
        }
    }
}

impl StickConfig {
    /// `<config dir>/stickreader/stick.toml`, or the working directory when
    /// the platform has no config dir.
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        });
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading stick config from {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded stick config from {}", path.display());
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!(
                "Stick config {} does not exist, using default",
                path.display()
            );
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Saved stick config to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.deadzone.is_finite() || !(0.0..1.0).contains(&self.deadzone) {
            return Err(ConfigError::InvalidDeadzone(self.deadzone));
        }

        if self.x_channel == self.y_channel {
            return Err(ConfigError::DuplicateChannel(self.y_channel));
        }

        Ok(())
    }

    /// Build a reader for this configuration and bring it up.
    pub fn begin_reader<A, D, P>(
        &self,
        analog: A,
        digital: D,
    ) -> Result<StickReader<A, D, P, Ready>, StickError>
    where
        A: AnalogSampleProvider,
        D: DigitalLevelProvider,
        P: Float,
    {
        let deadzone = num_traits::cast(self.deadzone).unwrap_or_else(P::zero);
        StickReader::new(
            analog,
            digital,
            self.x_channel,
            self.y_channel,
            self.button_channel,
        )
        .begin(deadzone)
    }
}
