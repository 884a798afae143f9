//! Tuner settings loaded from TOML.
//!
//! ```toml
//! enabled = true
//! batch_size = 300
//!
//! [gains]
//! kp = 0.2
//! ki = 0.004
//! kd = 3.0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::controller::Gains;
use crate::tuner::{Tuner, DEFAULT_BATCH_SIZE};

/// Starting point for a [`Tuner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Run the coordinate ascent search.
    pub enabled: bool,
    /// Valid samples per batch.
    pub batch_size: usize,
    /// Initial gains.
    pub gains: Gains,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: DEFAULT_BATCH_SIZE,
            gains: Gains::default(),
        }
    }
}

impl TunerConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Examples
    ///
    /// ```
    /// use twiddle_pid::TunerConfig;
    ///
    /// let config = TunerConfig::from_toml_str("batch_size = 200\n[gains]\nkp = 0.2").unwrap();
    /// assert_eq!(config.batch_size, 200);
    /// assert_eq!(config.gains.kp, 0.2);
    /// assert!(config.enabled);
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Reject settings the tuner could not run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            Err(ConfigError::ZeroBatchSize)?
        }

        let Gains { kp, ki, kd } = self.gains;
        for (name, value) in [("kp", kp), ("ki", ki), ("kd", kd)] {
            if !value.is_finite() {
                Err(ConfigError::NonFiniteGain(name))?
            }
        }

        Ok(())
    }

    /// A tuner configured with these settings.
    pub fn build(&self) -> Tuner {
        let mut tuner = Tuner::new(self.enabled);
        let Gains { kp, ki, kd } = self.gains;
        tuner.configure(kp, ki, kd, self.batch_size);
        tuner
    }
}

/// Why a [`TunerConfig`] could not be loaded.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Could not read config file: {0}")]
    Io(String),

    /// The document is not valid TOML or has mistyped fields.
    #[error("Invalid TOML: {0}")]
    Parse(String),

    /// `batch_size` is zero.
    #[error("Batch size must be at least one sample")]
    ZeroBatchSize,

    /// A gain is NaN or infinite.
    #[error("Gain {0} is not a finite number")]
    NonFiniteGain(&'static str),
}
