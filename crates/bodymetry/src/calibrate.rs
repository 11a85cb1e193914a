//! Pixel-to-centimeter scale calibration from the declared subject height.
//!
//! One scale factor per capture session, derived from the front-view
//! head-to-foot pixel span. Calibration failures are fatal for the whole
//! session: nothing downstream can run without a physical scale.

use serde::{Deserialize, Serialize};

use crate::error::MeasureError;

/// Session-wide conversion factor, centimeters per pixel. Immutable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    /// Wrap a raw factor, bypassing calibration. Intended for callers that
    /// obtained the scale elsewhere (and for tests).
    pub fn from_cm_per_px(cm_per_px: f64) -> Self {
        Self(cm_per_px)
    }

    pub fn cm_per_px(self) -> f64 {
        self.0
    }
}

/// Calibration thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Minimum accepted head-to-foot pixel span. Below this the camera is
    /// too far away or the subject is not fully framed.
    pub min_span_px: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self { min_span_px: 100.0 }
    }
}

/// Derive the session scale: `height_cm / span_px`.
pub fn calibrate(
    height_cm: f64,
    span_px: f64,
    config: &CalibrationConfig,
) -> Result<ScaleFactor, MeasureError> {
    if !height_cm.is_finite() || height_cm <= 0.0 {
        return Err(MeasureError::InvalidHeight { height_cm });
    }
    if !span_px.is_finite() || span_px <= config.min_span_px {
        return Err(MeasureError::DegenerateSpan {
            span_px,
            min_span_px: config.min_span_px,
        });
    }
    Ok(ScaleFactor(height_cm / span_px))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn height_over_span() {
        let scale = calibrate(180.0, 900.0, &CalibrationConfig::default()).unwrap();
        assert_relative_eq!(scale.cm_per_px(), 0.2);
    }

    #[test]
    fn rejects_non_positive_height() {
        for h in [0.0, -170.0, f64::NAN] {
            let err = calibrate(h, 900.0, &CalibrationConfig::default()).unwrap_err();
            assert!(matches!(err, MeasureError::InvalidHeight { .. }), "{h}");
        }
    }

    #[test]
    fn rejects_span_at_or_below_threshold() {
        let cfg = CalibrationConfig::default();
        for span in [0.0, 42.0, 100.0] {
            let err = calibrate(180.0, span, &cfg).unwrap_err();
            assert!(matches!(err, MeasureError::DegenerateSpan { .. }), "{span}");
        }
        assert!(calibrate(180.0, 100.1, &cfg).is_ok());
    }
}
