//! Training settings, optionally loaded from a TOML file
//!
//! ```toml
//! alpha = 0.5
//! gamma = 0.9
//! max_episodes = 20000
//! max_minutes = 10.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, q_learning::TrainingBudget, utils::minutes_to_duration};

/// Hyperparameters and budgets of a self-play training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainSettings {
    /// Learning rate α
    pub alpha: f64,
    /// Discount factor γ
    pub gamma: f64,
    pub epsilon: f64,
    pub epsilon_decay: f64,
    pub min_epsilon: f64,
    /// Episodes per seat
    pub max_episodes: Option<u64>,
    /// Wall time over both seats
    pub max_minutes: Option<f64>,
    pub seed: Option<u64>,
}

impl Default for TrainSettings {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            gamma: 0.9,
            epsilon: 1.0,
            epsilon_decay: 1.0,
            min_epsilon: 0.0,
            max_episodes: None,
            max_minutes: None,
            seed: None,
        }
    }
}

impl TrainSettings {
    /// Load settings from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(format!("read {}", path.display()), e))?;
        let settings: TrainSettings = toml::from_str(&content)?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(Error::InvalidConfiguration {
                message: message.to_string(),
            })
        };
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return invalid("alpha must be in (0, 1]");
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return invalid("gamma must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return invalid("epsilon must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.epsilon_decay) {
            return invalid("epsilon_decay must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.min_epsilon) {
            return invalid("min_epsilon must be in [0, 1]");
        }
        self.budget()?.validate()
    }

    pub fn budget(&self) -> Result<TrainingBudget> {
        Ok(TrainingBudget {
            max_episodes: self.max_episodes,
            max_duration: self.max_minutes.map(minutes_to_duration).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_load_partial_file() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|e| Error::io("tempdir", e))?;
        let path = dir.path().join("train.toml");
        std::fs::write(&path, "alpha = 0.25\nmax_episodes = 10\n")
            .map_err(|e| Error::io("write config", e))?;

        let settings = TrainSettings::load(&path)?;
        assert_eq!(settings.alpha, 0.25);
        assert_eq!(settings.gamma, 0.9);
        assert_eq!(settings.max_episodes, Some(10));
        settings.validate()?;
        Ok(())
    }

    #[test]
    fn test_validation() {
        let mut settings = TrainSettings::default();
        // no budget
        assert!(settings.validate().is_err());

        settings.max_minutes = Some(0.5);
        assert!(settings.validate().is_ok());
        assert_eq!(
            settings.budget().ok().and_then(|budget| budget.max_duration),
            Some(Duration::from_secs(30))
        );

        settings.alpha = 0.0;
        assert!(settings.validate().is_err());
        settings.alpha = 1.0;
        settings.gamma = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_infinite_minutes_rejected() {
        let settings = TrainSettings {
            max_episodes: Some(1),
            max_minutes: Some(f64::INFINITY),
            ..TrainSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidConfiguration { .. })
        ));

        let settings = TrainSettings {
            max_minutes: Some(-2.0),
            ..TrainSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
