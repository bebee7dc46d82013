//! Player descriptions as typed on the command line
//!
//! ```text
//! random | default | manual | minimax[:<depth>][:ab] | qtable:<path>
//! ```

use std::{fmt, path::PathBuf, str::FromStr};

use crate::{
    Error, Result,
    game::GameKind,
    ports::Learner,
    q_learning::{QLearningAgent, SavedQTable},
    strategies::{DefaultLearner, FrozenLearner, ManualLearner, MinimaxLearner, RandomLearner},
};

const EXPECTED: &str = "random, default, manual, minimax[:<depth>][:ab] or qtable:<path>";

/// Which player to build for a seat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategySpec {
    Random,
    Default,
    Manual,
    Minimax { depth: Option<u32>, alpha_beta: bool },
    QTable(PathBuf),
}

impl StrategySpec {
    pub fn minimax(depth: Option<u32>, alpha_beta: bool) -> Self {
        StrategySpec::Minimax { depth, alpha_beta }
    }

    /// Short label used as the player name in output and CSV rows
    pub fn label(&self) -> String {
        match self {
            StrategySpec::Random => "random".to_string(),
            StrategySpec::Default => "default".to_string(),
            StrategySpec::Manual => "manual".to_string(),
            StrategySpec::Minimax { depth, alpha_beta } => {
                let mut label = "minimax".to_string();
                if *alpha_beta {
                    label.push_str("_ab");
                }
                if let Some(depth) = depth {
                    label.push_str(&format!("_d{depth}"));
                }
                label
            }
            StrategySpec::QTable(_) => "qtab".to_string(),
        }
    }

    pub fn needs_terminal(&self) -> bool {
        matches!(self, StrategySpec::Manual)
    }

    /// Build the player. Q-tables are loaded, checked against `game` and
    /// frozen; the seed, if any, makes random choices reproducible.
    pub fn build(&self, game: GameKind, seed: Option<u64>) -> Result<Box<dyn Learner>> {
        let label = self.label();
        let learner: Box<dyn Learner> = match self {
            StrategySpec::Random => match seed {
                Some(seed) => Box::new(RandomLearner::with_seed(label, seed)),
                None => Box::new(RandomLearner::new(label)),
            },
            StrategySpec::Default => match seed {
                Some(seed) => Box::new(DefaultLearner::with_seed(label, seed)),
                None => Box::new(DefaultLearner::new(label)),
            },
            StrategySpec::Manual => Box::new(ManualLearner::stdio(label)),
            StrategySpec::Minimax { depth, alpha_beta } => {
                Box::new(MinimaxLearner::new(label, *depth, *alpha_beta))
            }
            StrategySpec::QTable(path) => {
                let saved = SavedQTable::load_from_file(path)?;
                saved.expect_game(game)?;
                let mut agent = QLearningAgent::for_evaluation(saved.to_table()?).with_name(label);
                if let Some(seed) = seed {
                    agent = agent.with_seed(seed);
                }
                Box::new(FrozenLearner::new(Box::new(agent)))
            }
        };
        Ok(learner)
    }
}

impl FromStr for StrategySpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidStrategy {
            input: s.to_string(),
            expected: EXPECTED.to_string(),
        };

        let trimmed = s.trim();
        if let Some(path) = trimmed.strip_prefix("qtable:") {
            if path.is_empty() {
                return Err(invalid());
            }
            return Ok(StrategySpec::QTable(PathBuf::from(path)));
        }

        let mut parts = trimmed.split(':');
        let head = parts.next().unwrap_or_default().to_ascii_lowercase();
        match head.as_str() {
            "random" | "default" | "manual" if parts.next().is_some() => Err(invalid()),
            "random" => Ok(StrategySpec::Random),
            "default" => Ok(StrategySpec::Default),
            "manual" => Ok(StrategySpec::Manual),
            "minimax" => {
                let mut depth = None;
                let mut alpha_beta = false;
                for part in parts {
                    if part.eq_ignore_ascii_case("ab") && !alpha_beta {
                        alpha_beta = true;
                    } else if let Ok(d) = part.parse::<u32>()
                        && depth.is_none()
                        && !alpha_beta
                        && d > 0
                    {
                        depth = Some(d);
                    } else {
                        return Err(invalid());
                    }
                }
                Ok(StrategySpec::Minimax { depth, alpha_beta })
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for StrategySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategySpec::Random => f.write_str("random"),
            StrategySpec::Default => f.write_str("default"),
            StrategySpec::Manual => f.write_str("manual"),
            StrategySpec::Minimax { depth, alpha_beta } => {
                f.write_str("minimax")?;
                if let Some(depth) = depth {
                    write!(f, ":{depth}")?;
                }
                if *alpha_beta {
                    f.write_str(":ab")?;
                }
                Ok(())
            }
            StrategySpec::QTable(path) => write!(f, "qtable:{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() -> Result<()> {
        assert_eq!("random".parse::<StrategySpec>()?, StrategySpec::Random);
        assert_eq!("Default".parse::<StrategySpec>()?, StrategySpec::Default);
        assert_eq!(
            "minimax".parse::<StrategySpec>()?,
            StrategySpec::minimax(None, false)
        );
        assert_eq!(
            "minimax:5:ab".parse::<StrategySpec>()?,
            StrategySpec::minimax(Some(5), true)
        );
        assert_eq!(
            "minimax:ab".parse::<StrategySpec>()?,
            StrategySpec::minimax(None, true)
        );
        assert_eq!(
            "qtable:tables/a.json".parse::<StrategySpec>()?,
            StrategySpec::QTable(PathBuf::from("tables/a.json"))
        );
        Ok(())
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in [
            "",
            "alphazero",
            "random:3",
            "minimax:0",
            "minimax:ab:3",
            "minimax:3:3",
            "qtable:",
        ] {
            assert!(
                matches!(
                    input.parse::<StrategySpec>(),
                    Err(Error::InvalidStrategy { .. })
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_display_round_trips() -> Result<()> {
        for input in ["random", "minimax:2:ab", "minimax", "qtable:x.json"] {
            let spec: StrategySpec = input.parse()?;
            assert_eq!(spec.to_string(), input);
        }
        Ok(())
    }

    #[test]
    fn test_labels() {
        assert_eq!(StrategySpec::minimax(Some(5), true).label(), "minimax_ab_d5");
        assert_eq!(StrategySpec::minimax(None, false).label(), "minimax");
        assert_eq!(StrategySpec::QTable(PathBuf::from("q.json")).label(), "qtab");
    }

    #[test]
    fn test_build_checks_qtable_game() -> Result<()> {
        use crate::q_learning::{QTable, TrainingMetadata};

        let dir = tempfile::tempdir().map_err(|e| Error::io("tempdir", e))?;
        let path = dir.path().join("ttt.json");
        SavedQTable::from_table(
            GameKind::TicTacToe,
            &QTable::new(0.5, 0.9, 0.0),
            TrainingMetadata::default(),
        )
        .save_to_file(&path)?;

        let spec = StrategySpec::QTable(path);
        assert!(spec.build(GameKind::TicTacToe, Some(1)).is_ok());
        assert!(matches!(
            spec.build(GameKind::Connect4, Some(1)),
            Err(Error::GameMismatch { .. })
        ));
        Ok(())
    }
}
