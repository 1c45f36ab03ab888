//! Refinement schedules

use serde::{Deserialize, Serialize};
use travesia_core::{Error, Result};

use crate::region::DEFAULT_MAX_PIXELS;

/// How a round's tolerance is derived
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Tolerance {
    /// Fraction of the round's minimum combined cost
    FractionOfMin(f64),
    /// Fixed cost units
    Absolute(f64),
    /// Previous round's tolerance times a multiplier
    ScalePrevious(f64),
}

impl Tolerance {
    /// Tolerance in cost units for round `round` (1-based).
    pub fn resolve(&self, round: usize, min_cost: f64, previous: Option<f64>) -> Result<f64> {
        let (name, value, tol) = match *self {
            Tolerance::FractionOfMin(f) => ("fraction_of_min", f, min_cost * f),
            Tolerance::Absolute(t) => ("absolute", t, t),
            Tolerance::ScalePrevious(m) => match previous {
                Some(p) => ("scale_previous", m, p * m),
                None => {
                    return Err(Error::InvalidParameter {
                        name: "scale_previous",
                        value: format!("round {}", round),
                        reason: "the first round has no previous tolerance".into(),
                    })
                }
            },
        };
        if value.is_nan() || value < 0.0 {
            return Err(Error::InvalidParameter {
                name,
                value: value.to_string(),
                reason: "must be non-negative".into(),
            });
        }
        Ok(tol)
    }
}

/// One refinement round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Aggregation block size in cells; values below 1 mean native resolution
    pub scale: f64,
    pub tolerance: Tolerance,
}

/// Ordered list of rounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefinementSchedule {
    pub rounds: Vec<RoundConfig>,
}

impl RefinementSchedule {
    /// `rounds` rounds starting at `initial_scale`, each scale multiplied by
    /// `scale_multiplier`. The first tolerance is `initial_fraction` of the
    /// minimum cost; later tolerances scale the previous one by
    /// `tolerance_multiplier`.
    pub fn progressive(
        rounds: usize,
        initial_scale: f64,
        scale_multiplier: f64,
        initial_fraction: f64,
        tolerance_multiplier: f64,
    ) -> Self {
        let mut scale = initial_scale;
        let rounds = (0..rounds)
            .map(|i| {
                let tolerance = if i == 0 {
                    Tolerance::FractionOfMin(initial_fraction)
                } else {
                    Tolerance::ScalePrevious(tolerance_multiplier)
                };
                let round = RoundConfig { scale, tolerance };
                scale *= scale_multiplier;
                round
            })
            .collect();
        Self { rounds }
    }

    /// A single round.
    pub fn single(scale: f64, tolerance: Tolerance) -> Self {
        Self {
            rounds: vec![RoundConfig { scale, tolerance }],
        }
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

impl Default for RefinementSchedule {
    fn default() -> Self {
        Self::progressive(3, 50.0, 0.5, 0.05, 0.005)
    }
}

/// Parameters for [`corridor`](super::corridor)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorridorParams {
    pub schedule: RefinementSchedule,
    /// Pixel budget of each round's minimum reduction
    pub max_pixels: f64,
}

impl Default for CorridorParams {
    fn default() -> Self {
        Self {
            schedule: RefinementSchedule::default(),
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}
