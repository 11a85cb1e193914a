//! Circumference from an elliptical cross-section.
//!
//! The body slice at a level is modeled as an ellipse with semi-axes
//! `a = width/2` and `b = depth/2` (in centimeters after scaling).
//! Ramanujan's closed-form approximation gives the perimeter without
//! elliptic integrals:
//!
//! ```text
//! h = ((a - b) / (a + b))^2
//! C = pi * (a + b) * (1 + 3h / (10 + sqrt(4 - 3h)))
//! ```
//!
//! At `a == b` this reduces exactly to the circle perimeter `pi * d`.

use std::f64::consts::PI;

use crate::calibrate::ScaleFactor;
use crate::error::MeasureError;
use crate::fuse::CrossSection;
use crate::levels::BodyLevel;

/// Ramanujan's ellipse-perimeter approximation for semi-axes `a`, `b`.
pub fn ramanujan_perimeter(a: f64, b: f64) -> f64 {
    let h = ((a - b) / (a + b)).powi(2);
    PI * (a + b) * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt()))
}

/// Convert one cross-section to a circumference in centimeters.
///
/// Non-positive semi-axes signal [`MeasureError::DegenerateCrossSection`];
/// the caller omits the level instead of recording a negative or undefined
/// circumference.
pub fn circumference_cm(
    section: &CrossSection,
    scale: ScaleFactor,
    level: BodyLevel,
) -> Result<f64, MeasureError> {
    let a = section.width_px * scale.cm_per_px() / 2.0;
    let b = section.depth_px * scale.cm_per_px() / 2.0;
    if !a.is_finite() || !b.is_finite() || a <= 0.0 || b <= 0.0 {
        return Err(MeasureError::DegenerateCrossSection { level });
    }
    Ok(ramanujan_perimeter(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn section(width_px: f64, depth_px: f64) -> CrossSection {
        CrossSection { width_px, depth_px }
    }

    #[test]
    fn circle_reduces_to_pi_d() {
        let scale = ScaleFactor::from_cm_per_px(1.0);
        for d in [1.0, 42.0, 250.0] {
            let c = circumference_cm(&section(d, d), scale, BodyLevel::Waist).unwrap();
            assert_relative_eq!(c, PI * d, max_relative = 1e-9);
        }
    }

    #[test]
    fn scale_is_linear() {
        let cs = section(160.0, 95.0);
        let c1 = circumference_cm(&cs, ScaleFactor::from_cm_per_px(0.3), BodyLevel::Chest)
            .unwrap();
        let c2 = circumference_cm(&cs, ScaleFactor::from_cm_per_px(0.6), BodyLevel::Chest)
            .unwrap();
        assert_relative_eq!(c2, 2.0 * c1, max_relative = 1e-12);
    }

    #[test]
    fn symmetric_in_width_and_depth() {
        let scale = ScaleFactor::from_cm_per_px(0.5);
        let c_wd = circumference_cm(&section(160.0, 95.0), scale, BodyLevel::Hip).unwrap();
        let c_dw = circumference_cm(&section(95.0, 160.0), scale, BodyLevel::Hip).unwrap();
        assert_relative_eq!(c_wd, c_dw, max_relative = 1e-12);
    }

    #[test]
    fn waist_scenario_matches_formula_value() {
        // front 160 / back 158 -> width 159; left 100 / right 98 -> depth 99.
        // Semi-axes 43.725 / 27.225 cm, h = (16.5 / 70.95)^2.
        let scale = ScaleFactor::from_cm_per_px(0.55);
        let c = circumference_cm(&section(159.0, 99.0), scale, BodyLevel::Waist).unwrap();
        assert_abs_diff_eq!(c, 225.9200636858519, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_axes_are_rejected() {
        let scale = ScaleFactor::from_cm_per_px(0.5);
        for (w, d) in [(0.0, 99.0), (-10.0, 99.0), (159.0, 0.0), (f64::NAN, 99.0)] {
            let err = circumference_cm(&section(w, d), scale, BodyLevel::Calf).unwrap_err();
            assert_eq!(
                err,
                MeasureError::DegenerateCrossSection {
                    level: BodyLevel::Calf
                }
            );
        }
    }

    #[test]
    fn perimeter_bounded_by_circumscribed_circles() {
        // pi*(a+b) <= C <= pi*2*max(a,b) for any ellipse.
        let (a, b) = (43.725, 27.225);
        let c = ramanujan_perimeter(a, b);
        assert!(c >= PI * (a + b));
        assert!(c <= 2.0 * PI * a.max(b));
    }
}
