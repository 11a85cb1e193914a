//! Typed failure taxonomy for the measurement pipeline.
//!
//! Per-view extraction failures are fatal for the session (all four views
//! are required); calibration failures are fatal; a degenerate
//! cross-section is per-level and only omits that level from the result.
//! No failure is ever substituted with a silent default width.

use crate::levels::BodyLevel;
use crate::ViewAngle;

/// Errors that can occur during a measurement session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeasureError {
    /// Too few frames in a view's batch yielded a usable body contour.
    ///
    /// Fatal for that view; the caller decides whether to re-capture.
    #[error(
        "no contour detected for {view} view: {frames_accepted}/{frames_seen} frames usable"
    )]
    NoContourDetected {
        view: ViewAngle,
        frames_seen: usize,
        frames_accepted: usize,
    },

    /// Declared subject height is not positive; calibration is impossible.
    #[error("invalid subject height: {height_cm} cm")]
    InvalidHeight { height_cm: f64 },

    /// Observed head-to-foot pixel span is below the minimum threshold
    /// (camera too far or subject not fully framed).
    #[error("degenerate body span: {span_px:.1} px (minimum {min_span_px:.1} px)")]
    DegenerateSpan { span_px: f64, min_span_px: f64 },

    /// A fused cross-section has a non-positive semi-axis at this level.
    ///
    /// Non-fatal: the level is omitted from the result.
    #[error("degenerate cross-section at level {level}")]
    DegenerateCrossSection { level: BodyLevel },

    /// The injected body-level table failed validation at session start.
    #[error("invalid level table: {reason}")]
    InvalidLevelTable { reason: String },
}
