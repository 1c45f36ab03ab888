//! Analysis configuration file
//!
//! A JSON document whose keys mirror the algorithm parameter structs. Every
//! key is optional; command-line flags override what the file sets.
//!
//! ```json
//! {
//!   "cost_function": "tobler",
//!   "water": { "kind": "occurrence", "threshold": 90 },
//!   "network": {
//!     "cushion": 1.1,
//!     "corridor": {
//!       "schedule": [
//!         { "scale": 50, "tolerance": { "kind": "fraction_of_min", "value": 0.05 } },
//!         { "scale": 25, "tolerance": { "kind": "scale_previous", "value": 0.005 } }
//!       ]
//!     }
//!   },
//!   "trace": { "max_steps": 300, "source_threshold": 5.0 }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use travesia_algorithms::corridor::NetworkParams;
use travesia_algorithms::cost::{CostFunction, WaterMaskSource};
use travesia_algorithms::path::TraceParams;

/// Cost model selector. The anisotropic azimuth comes from the endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostKind {
    #[default]
    Tobler,
    Quadratic,
    AnisotropicTobler,
}

impl CostKind {
    /// Concrete model; `azimuth` is only read by the anisotropic kind.
    pub fn with_azimuth(self, azimuth: f64) -> CostFunction {
        match self {
            CostKind::Tobler => CostFunction::Tobler,
            CostKind::Quadratic => CostFunction::Quadratic,
            CostKind::AnisotropicTobler => CostFunction::AnisotropicTobler { azimuth },
        }
    }
}

impl FromStr for CostKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "tobler" => Ok(CostKind::Tobler),
            "quadratic" | "quad" => Ok(CostKind::Quadratic),
            "anisotropic" | "anisotropic_tobler" | "anisotropic-tobler" => Ok(CostKind::AnisotropicTobler),
            _ => anyhow::bail!("Unknown cost function: {}. Use tobler, quadratic, or anisotropic.", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub cost_function: CostKind,
    pub water: WaterMaskSource,
    /// Horizontal-to-vertical unit conversion for slope
    pub z_factor: f64,
    pub network: NetworkParams,
    pub trace: TraceParams,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cost_function: CostKind::default(),
            water: WaterMaskSource::default(),
            z_factor: 1.0,
            network: NetworkParams::default(),
            trace: TraceParams::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid config: {}", path.display()))
    }

    /// The file at `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use travesia_algorithms::corridor::Tolerance;
    use travesia_algorithms::path::StepModel;

    #[test]
    fn test_empty_object_is_default() {
        let config: AnalysisConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let json = r#"{
            "cost_function": "quadratic",
            "water": { "kind": "elevation_heuristic", "sea_level": 2.5 },
            "network": {
                "cushion": 1.5,
                "corridor": {
                    "schedule": [
                        { "scale": 10, "tolerance": { "kind": "absolute", "value": 40 } }
                    ]
                }
            },
            "trace": { "max_steps": 50, "step_model": { "kind": "bearing", "directions": "four", "step_length": 30 } }
        }"#;
        let config: AnalysisConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.cost_function, CostKind::Quadratic);
        assert_eq!(config.water, WaterMaskSource::ElevationHeuristic { sea_level: 2.5 });
        assert_eq!(config.network.cushion, 1.5);
        assert_eq!(config.network.corridor.schedule.len(), 1);
        assert_eq!(config.network.corridor.schedule.rounds[0].tolerance, Tolerance::Absolute(40.0));
        assert_eq!(config.trace.max_steps, 50);
        assert_eq!(config.trace.source_threshold, 5.0);
        assert!(matches!(config.trace.step_model, StepModel::Bearing { step_length, .. } if step_length == 30.0));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "z_factor": 0.5 }}"#).unwrap();

        let config = AnalysisConfig::from_path(file.path()).unwrap();
        assert_eq!(config.z_factor, 0.5);
        assert_eq!(config.cost_function, CostKind::Tobler);
    }

    #[test]
    fn test_from_path_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(AnalysisConfig::from_path(file.path()).is_err());
    }

    #[test]
    fn test_cost_kind_parse() {
        assert_eq!("Tobler".parse::<CostKind>().unwrap(), CostKind::Tobler);
        assert_eq!("anisotropic".parse::<CostKind>().unwrap(), CostKind::AnisotropicTobler);
        assert!("cheapest".parse::<CostKind>().is_err());
        assert_eq!(
            CostKind::AnisotropicTobler.with_azimuth(90.0),
            CostFunction::AnisotropicTobler { azimuth: 90.0 }
        );
    }
}
