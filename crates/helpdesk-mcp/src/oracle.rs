//! Score oracle behind the `solution_evaluation` ability
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreOracle {
    /// Uniform in `min..=max`
    Random { min: u8, max: u8 },
    Fixed(u8),
}

impl ScoreOracle {
    pub fn draw(&self) -> u8 {
        match *self {
            Self::Fixed(score) => score,
            Self::Random { min, max } if min >= max => min,
            Self::Random { min, max } => rand::thread_rng().gen_range(min..=max),
        }
    }
}

impl Default for ScoreOracle {
    fn default() -> Self {
        Self::Random { min: 40, max: 100 }
    }
}
