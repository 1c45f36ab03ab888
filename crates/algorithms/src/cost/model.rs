//! Per-cell cost functions of slope (and aspect, for the directional model)

use serde::{Deserialize, Serialize};

/// Cost assigned to impassable cells (water) and the cap of every cost function.
pub const IMPASSABLE_COST: f64 = 10_000.0;

/// A friction model evaluated per cell.
///
/// Implementations must return a non-negative value no larger than
/// [`IMPASSABLE_COST`], and NaN only when the slope itself is NaN.
pub trait CostModel: Send + Sync {
    /// Cost of a cell with the given slope and aspect, both in degrees.
    ///
    /// Aspect is the compass bearing the slope faces, or a negative value for
    /// flat cells. Isotropic models ignore it.
    fn cost(&self, slope_deg: f64, aspect_deg: f64) -> f64;

    /// Whether `cost` reads the aspect argument.
    fn uses_aspect(&self) -> bool {
        false
    }
}

/// Tobler's hiking function: `1 / (6·exp(−3.5·|tan(slope + 0.05)|))`.
pub fn tobler_cost(slope_deg: f64) -> f64 {
    let speed = 6.0 * (-3.5 * (slope_deg.to_radians() + 0.05).tan().abs()).exp();
    cap(1.0 / speed)
}

/// Quadratic terrain cost: `1 − 0.025·slope + 0.031·slope²` (slope in degrees).
pub fn quadratic_cost(slope_deg: f64) -> f64 {
    cap(1.0 - 0.025 * slope_deg + 0.031 * slope_deg * slope_deg)
}

/// Tobler's function on the signed grade met when walking along `azimuth_deg`.
///
/// The effective grade is `tan(slope)·cos(azimuth − aspect)`: positive when
/// heading the way the slope faces, negative against it. Flat cells
/// (negative aspect) have zero grade.
pub fn anisotropic_tobler_cost(slope_deg: f64, aspect_deg: f64, azimuth_deg: f64) -> f64 {
    if slope_deg.is_nan() {
        return f64::NAN;
    }
    let grade = if aspect_deg < 0.0 || aspect_deg.is_nan() {
        0.0
    } else {
        slope_deg.to_radians().tan() * (azimuth_deg - aspect_deg).to_radians().cos()
    };
    tobler_on_grade(grade)
}

/// `1 / (6·exp(−3.5·|grade + 0.05|))`, capped.
fn tobler_on_grade(grade: f64) -> f64 {
    let speed = 6.0 * (-3.5 * (grade + 0.05).abs()).exp();
    cap(1.0 / speed)
}

/// `f64::min` would turn NaN into the cap.
fn cap(cost: f64) -> f64 {
    if cost > IMPASSABLE_COST { IMPASSABLE_COST } else { cost }
}

/// The built-in cost models
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CostFunction {
    #[default]
    Tobler,
    Quadratic,
    /// Direction-dependent Tobler for travel along a fixed azimuth (degrees)
    AnisotropicTobler { azimuth: f64 },
}

impl CostModel for CostFunction {
    fn cost(&self, slope_deg: f64, aspect_deg: f64) -> f64 {
        match *self {
            CostFunction::Tobler => tobler_cost(slope_deg),
            CostFunction::Quadratic => quadratic_cost(slope_deg),
            CostFunction::AnisotropicTobler { azimuth } => {
                anisotropic_tobler_cost(slope_deg, aspect_deg, azimuth)
            }
        }
    }

    fn uses_aspect(&self) -> bool {
        matches!(self, CostFunction::AnisotropicTobler { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tobler_flat_value() {
        // 1 / (6·exp(−3.5·tan(0.05)))
        let expected = 1.0 / (6.0 * (-3.5 * 0.05f64.tan()).exp());
        assert!((tobler_cost(0.0) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_tobler_monotone_and_capped() {
        let mut previous = tobler_cost(0.0);
        let mut capped = false;
        for tenth in 1..900 {
            let s = tenth as f64 / 10.0;
            let c = tobler_cost(s);
            assert!(c >= 0.0);
            assert!(c >= previous, "cost decreased at {}°: {} < {}", s, c, previous);
            assert!(c <= IMPASSABLE_COST);
            capped |= c == IMPASSABLE_COST;
            previous = c;
        }
        assert!(capped, "steep slopes must hit the cap");
        assert_eq!(tobler_cost(89.99), IMPASSABLE_COST);
    }

    #[test]
    fn test_quadratic_shape() {
        assert!((quadratic_cost(0.0) - 1.0).abs() < 1e-12);
        assert!((quadratic_cost(10.0) - (1.0 - 0.25 + 3.1)).abs() < 1e-12);
        for tenth in 0..900 {
            assert!(quadratic_cost(tenth as f64 / 10.0) > 0.0);
        }
        assert!(quadratic_cost(89.0) < IMPASSABLE_COST);
    }

    #[test]
    fn test_anisotropic_direction_matters() {
        // Slope facing east (aspect 90°): along the aspect the grade is +tan(slope)
        let along = anisotropic_tobler_cost(10.0, 90.0, 90.0);
        let against = anisotropic_tobler_cost(10.0, 90.0, 270.0);
        let across = anisotropic_tobler_cost(10.0, 90.0, 0.0);
        assert!(along > against);
        assert!((across - tobler_on_grade(0.0)).abs() < 1e-9);
    }

    #[test]
    fn test_anisotropic_grade_formula() {
        let t = 10f64.to_radians().tan();
        let expected = 1.0 / (6.0 * (-3.5 * (t + 0.05).abs()).exp());
        assert!((anisotropic_tobler_cost(10.0, 90.0, 90.0) - expected).abs() < 1e-12);
        assert!((anisotropic_tobler_cost(10.0, 90.0, 90.0) - 0.3680210885000611).abs() < 1e-12);

        let reverse = 1.0 / (6.0 * (-3.5 * (-t + 0.05).abs()).exp());
        assert!((anisotropic_tobler_cost(10.0, 90.0, 270.0) - reverse).abs() < 1e-12);
    }

    #[test]
    fn test_anisotropic_flat_cell() {
        let flat = anisotropic_tobler_cost(0.0, -1.0, 45.0);
        assert!((flat - tobler_on_grade(0.0)).abs() < 1e-12);
        assert!(anisotropic_tobler_cost(f64::NAN, 10.0, 45.0).is_nan());
    }

    #[test]
    fn test_cost_function_dispatch() {
        assert_eq!(CostFunction::Tobler.cost(5.0, 0.0), tobler_cost(5.0));
        assert_eq!(CostFunction::Quadratic.cost(5.0, 0.0), quadratic_cost(5.0));
        assert!(CostFunction::Tobler.cost(f64::NAN, 0.0).is_nan());
        assert!(CostFunction::AnisotropicTobler { azimuth: 0.0 }.uses_aspect());
        assert!(!CostFunction::Tobler.uses_aspect());
    }
}
