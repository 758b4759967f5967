use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const EXPLORATION_RATE: f64 = 0.1;
pub const LEARNING_RATE: f64 = 0.1;
pub const DISCOUNT_RATE: f64 = 1.0;
pub const NUM_EPISODES: usize = 50_000;
pub const NUM_GAMES: usize = 1_000;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    ValueIteration,
    MonteCarlo,
    QLearning,
    ExternalInput,
}

/// How one agent learns and explores.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub mode: Mode,
    pub epsilon: f64,
    pub step_size: f64,
    pub discount_rate: f64,
    /// Fixed seed for reproducible runs; OS entropy when absent.
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            mode: Mode::ValueIteration,
            epsilon: EXPLORATION_RATE,
            step_size: LEARNING_RATE,
            discount_rate: DISCOUNT_RATE,
            seed: None,
        }
    }
}

impl AgentConfig {
    pub fn new(mode: Mode) -> Self {
        AgentConfig {
            mode,
            ..Default::default()
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn with_discount_rate(mut self, discount_rate: f64) -> Self {
        self.discount_rate = discount_rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_epsilon(self.epsilon)?;
        validate_step_size(self.step_size)?;
        if !(0.0..=1.0).contains(&self.discount_rate) {
            return Err(Error::InvalidConfiguration {
                message: format!("discount_rate must be in [0, 1], got {}", self.discount_rate),
            });
        }
        Ok(())
    }
}

pub(crate) fn validate_epsilon(epsilon: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&epsilon) {
        return Err(Error::InvalidConfiguration {
            message: format!("epsilon must be in [0, 1], got {}", epsilon),
        });
    }
    Ok(())
}

pub(crate) fn validate_step_size(step_size: f64) -> Result<()> {
    if !(step_size > 0.0 && step_size <= 1.0) {
        return Err(Error::InvalidConfiguration {
            message: format!("step_size must be in (0, 1], got {}", step_size),
        });
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Self-play episodes for each learning agent before matches start.
    pub episodes: usize,
    /// Games per match.
    pub games: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            episodes: NUM_EPISODES,
            games: NUM_GAMES,
        }
    }
}

/// A full lab run: two agents and how long to train and play them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub first: AgentConfig,
    pub second: AgentConfig,
    pub training: TrainingConfig,
}

impl Default for LabConfig {
    fn default() -> Self {
        LabConfig {
            first: AgentConfig::new(Mode::MonteCarlo),
            second: AgentConfig::new(Mode::QLearning),
            training: TrainingConfig::default(),
        }
    }
}

impl LabConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: LabConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Falls back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.first.validate()?;
        self.second.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = LabConfig::default();
        config.validate().unwrap();
        assert_eq!(config.first.discount_rate, 1.0);
        assert_eq!(config.training.episodes, NUM_EPISODES);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{ "first": { "mode": "q_learning", "epsilon": 0.3, "seed": 4 },
                        "training": { "games": 10 } }"#;
        let config: LabConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.first.mode, Mode::QLearning);
        assert_eq!(config.first.epsilon, 0.3);
        assert_eq!(config.first.step_size, LEARNING_RATE);
        assert_eq!(config.first.seed, Some(4));
        assert_eq!(config.second.mode, Mode::QLearning);
        assert_eq!(config.training.games, 10);
        assert_eq!(config.training.episodes, NUM_EPISODES);
    }

    #[test]
    fn out_of_range_rates_are_rejected() {
        for bad in [
            AgentConfig::default().with_epsilon(1.5),
            AgentConfig::default().with_step_size(0.0),
            AgentConfig::default().with_discount_rate(-0.1),
        ] {
            assert!(matches!(bad.validate(), Err(Error::InvalidConfiguration { .. })));
        }
    }

    #[test]
    fn missing_file_falls_back() {
        let path = Path::new("./does-not-exist/lab.json");
        assert_eq!(LabConfig::load_or_default(path).unwrap(), LabConfig::default());
        assert!(matches!(LabConfig::load(path), Err(Error::ConfigRead { .. })));
    }
}
