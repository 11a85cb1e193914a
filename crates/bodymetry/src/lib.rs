//! bodymetry — pure-Rust body circumference estimation from four
//! single-camera silhouette views.
//!
//! Given ordered frame sequences for the front, back, left and right views
//! of a standing subject plus the subject's declared height, the pipeline
//! stages are:
//!
//! 1. **Silhouette** – per view: intensity conversion, Gaussian blur, Canny
//!    edges, largest-closed-boundary extraction, Douglas–Peucker
//!    simplification, multi-frame averaging into one stable contour.
//! 2. **Profile** – horizontal scan-line sampling of the silhouette width
//!    at normalized body-height ratios.
//! 3. **Fuse** – per body level, the front/back widths and left/right
//!    depths combine into an elliptical cross-section.
//! 4. **Circumference** – Ramanujan's closed-form ellipse-perimeter
//!    approximation converts each cross-section into centimeters using a
//!    scale calibrated from the declared height.
//!
//! # Public API
//! [`Measurer`] and [`MeasureConfig`] are the primary entry points; the
//! per-stage functions are exported for callers that drive the stages
//! themselves. The core performs no file or camera I/O.

pub mod calibrate;
pub mod ellipse;
pub mod error;
pub mod fuse;
pub mod levels;
pub mod profile;
pub mod quality;
pub mod session;
pub mod silhouette;

#[cfg(test)]
pub(crate) mod test_utils;

use std::collections::BTreeMap;

pub use calibrate::{CalibrationConfig, ScaleFactor};
pub use error::MeasureError;
pub use fuse::{CrossSection, ViewProfiles};
pub use levels::{BodyLevel, LevelAnchor, LevelEntry, LevelTable};
pub use profile::HeightProfile;
pub use quality::FrameQuality;
pub use session::{MeasureConfig, Measurer, ViewFrames};
pub use silhouette::{Contour, Silhouette, SilhouetteConfig};

/// The four fixed capture views around the subject.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ViewAngle {
    Front,
    Back,
    Left,
    Right,
}

impl ViewAngle {
    /// All views in capture order.
    pub const ALL: [ViewAngle; 4] = [
        ViewAngle::Front,
        ViewAngle::Back,
        ViewAngle::Left,
        ViewAngle::Right,
    ];

    /// Lowercase view name as used in serialized records.
    pub fn name(self) -> &'static str {
        match self {
            ViewAngle::Front => "front",
            ViewAngle::Back => "back",
            ViewAngle::Left => "left",
            ViewAngle::Right => "right",
        }
    }
}

impl std::fmt::Display for ViewAngle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One diagnostic width sample across all four views at a grid ratio.
///
/// Widths are in original pixel units; a view without a silhouette
/// intersection at this ratio is absent (never zero-filled).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DiagnosticSample {
    /// Normalized height ratio (0 = top of head, 1 = feet).
    pub height_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_width: Option<f64>,
}

/// Extraction quality metrics for one view.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ViewStats {
    /// Frames consumed from the capture sequence.
    pub frames_seen: usize,
    /// Frames that yielded a usable contour.
    pub frames_accepted: usize,
    /// Head-to-foot pixel span of the averaged contour.
    pub span_px: f64,
    /// Vertex count of the averaged contour.
    pub contour_points: usize,
}

/// Immutable result record of one completed 4-view capture session.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CircumferenceResult {
    /// Per-level circumference in centimeters, rounded to 2 decimals.
    pub circumferences_cm: BTreeMap<BodyLevel, f64>,
    /// Ordered diagnostic width samples over the uniform height grid.
    pub samples: Vec<DiagnosticSample>,
    /// Session scale factor in centimeters per pixel.
    pub scale_cm_per_px: f64,
    /// Declared subject height in centimeters.
    pub subject_height_cm: f64,
    /// Per-view extraction metrics.
    pub views: BTreeMap<ViewAngle, ViewStats>,
}
