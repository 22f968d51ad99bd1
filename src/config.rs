//! Session configuration
//!
//! Every field has a default, so a config file only needs the values it
//! changes. CLI flags are applied on top with [`SessionConfig::apply_overrides`].

use crate::game::{OutputFormat, VerbosityLevel};
use crate::{GachaError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_DATA_FILE: &str = "classroom.json";

/// Behavior of the automated judge used by `play --auto` and simulations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomJudgeConfig {
    /// Chance a drawn student answers correctly
    pub correct_rate: f64,
    /// Chance the teacher skips judging (checked before correctness)
    pub skip_rate: f64,
    /// Chance a student with items plays one when given the opportunity
    pub item_use_rate: f64,
}

impl Default for RandomJudgeConfig {
    fn default() -> Self {
        RandomJudgeConfig {
            correct_rate: 0.6,
            skip_rate: 0.1,
            item_use_rate: 0.3,
        }
    }
}

impl RandomJudgeConfig {
    /// Reject rates outside `[0, 1]`
    pub fn validate(&self) -> Result<()> {
        for (name, rate) in [
            ("correct_rate", self.correct_rate),
            ("skip_rate", self.skip_rate),
            ("item_use_rate", self.item_use_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(GachaError::InvalidAction(format!(
                    "{name} must be between 0 and 1, got {rate}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seed for the session RNG; `None` seeds from entropy
    pub seed: Option<u64>,
    pub verbosity: VerbosityLevel,
    pub output_format: OutputFormat,
    pub data_file: PathBuf,
    pub judge: RandomJudgeConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            seed: None,
            verbosity: VerbosityLevel::Normal,
            output_format: OutputFormat::Text,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            judge: RandomJudgeConfig::default(),
        }
    }
}

/// Values given on the command line; `None` leaves the config alone
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub seed: Option<u64>,
    pub verbosity: Option<VerbosityLevel>,
    pub output_format: Option<OutputFormat>,
    pub data_file: Option<PathBuf>,
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)
            .map_err(|e| GachaError::SerializationError(format!("invalid config: {e}")))?;
        config.judge.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(seed) = overrides.seed {
            self.seed = Some(seed);
        }
        if let Some(verbosity) = overrides.verbosity {
            self.verbosity = verbosity;
        }
        if let Some(format) = overrides.output_format {
            self.output_format = format;
        }
        if let Some(path) = overrides.data_file {
            self.data_file = path;
        }
    }

    /// The configured seed, or a fresh one from the OS
    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}
