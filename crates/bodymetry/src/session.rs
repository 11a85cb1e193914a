//! Session orchestration: four views in, one immutable result record out.
//!
//! [`Measurer`] is the primary entry point (create once, measure many
//! sessions); it is stateless between sessions. Within a session the four
//! views are independent until fusion, so extraction and profiling run as
//! structured parallel joins with fusion as the single fan-in point. A
//! failed view aborts the session with that view's error — there is no
//! partial result.

use std::collections::BTreeMap;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::calibrate::{calibrate, CalibrationConfig};
use crate::ellipse::circumference_cm;
use crate::error::MeasureError;
use crate::fuse::{diagnostic_samples, fuse, ViewProfiles};
use crate::levels::LevelTable;
use crate::profile::{sample_profile, HeightProfile};
use crate::quality::FrameQuality;
use crate::silhouette::{extract_silhouette, SilhouetteConfig};
use crate::{CircumferenceResult, ViewAngle, ViewStats};

/// Full session configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    pub silhouette: SilhouetteConfig,
    pub calibration: CalibrationConfig,
    /// Injectable body-level table; validated at session start.
    pub levels: LevelTable,
    /// Number of uniform diagnostic grid samples.
    pub n_grid: usize,
}

impl MeasureConfig {
    /// Default grid resolution for the diagnostic 3-D contour.
    pub const DEFAULT_N_GRID: usize = 20;
}

/// Ordered raw frame sequences for the four capture views.
///
/// Frames are consumed by extraction and can be dropped afterwards; the
/// core never retains them.
#[derive(Debug, Default)]
pub struct ViewFrames {
    pub front: Vec<DynamicImage>,
    pub back: Vec<DynamicImage>,
    pub left: Vec<DynamicImage>,
    pub right: Vec<DynamicImage>,
}

impl ViewFrames {
    fn get(&self, view: ViewAngle) -> &[DynamicImage] {
        match view {
            ViewAngle::Front => &self.front,
            ViewAngle::Back => &self.back,
            ViewAngle::Left => &self.left,
            ViewAngle::Right => &self.right,
        }
    }
}

/// Primary measurement interface.
pub struct Measurer {
    config: MeasureConfig,
}

impl Default for Measurer {
    fn default() -> Self {
        Self::new()
    }
}

impl Measurer {
    /// Create a measurer with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MeasureConfig {
            n_grid: MeasureConfig::DEFAULT_N_GRID,
            ..MeasureConfig::default()
        })
    }

    /// Create with full config control.
    pub fn with_config(config: MeasureConfig) -> Self {
        Self { config }
    }

    /// Access the current configuration.
    pub fn config(&self) -> &MeasureConfig {
        &self.config
    }

    /// Mutable access to configuration for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut MeasureConfig {
        &mut self.config
    }

    /// Run one capture session without a quality capability.
    pub fn measure(
        &self,
        views: &ViewFrames,
        height_cm: f64,
    ) -> Result<CircumferenceResult, MeasureError> {
        self.measure_with_quality(views, height_cm, None)
    }

    /// Run one capture session with an optional advisory quality capability.
    pub fn measure_with_quality(
        &self,
        views: &ViewFrames,
        height_cm: f64,
        quality: Option<&dyn FrameQuality>,
    ) -> Result<CircumferenceResult, MeasureError> {
        // Fail before touching any pixels when the session cannot succeed.
        if !height_cm.is_finite() || height_cm <= 0.0 {
            return Err(MeasureError::InvalidHeight { height_cm });
        }
        self.config.levels.validate()?;

        let n_grid = if self.config.n_grid >= 2 {
            self.config.n_grid
        } else {
            MeasureConfig::DEFAULT_N_GRID
        };

        let view = |v: ViewAngle| self.process_view(views.get(v), v, n_grid, quality);
        let ((front, back), (left, right)) = rayon::join(
            || rayon::join(|| view(ViewAngle::Front), || view(ViewAngle::Back)),
            || rayon::join(|| view(ViewAngle::Left), || view(ViewAngle::Right)),
        );
        let (front, front_stats) = front?;
        let (back, back_stats) = back?;
        let (left, left_stats) = left?;
        let (right, right_stats) = right?;

        let scale = calibrate(height_cm, front.span_px, &self.config.calibration)?;
        tracing::info!(
            scale_cm_per_px = scale.cm_per_px(),
            span_px = front.span_px,
            "session scale calibrated"
        );

        let profiles = ViewProfiles {
            front,
            back,
            left,
            right,
        };
        let sections = fuse(&profiles, &self.config.levels);

        let mut circumferences_cm = BTreeMap::new();
        for (level, section) in &sections {
            match circumference_cm(section, scale, *level) {
                Ok(c) => {
                    circumferences_cm.insert(*level, (c * 100.0).round() / 100.0);
                }
                Err(MeasureError::DegenerateCrossSection { level }) => {
                    tracing::warn!(level = %level, "degenerate cross-section, level omitted");
                }
                Err(other) => return Err(other),
            }
        }
        tracing::info!(
            n_levels = circumferences_cm.len(),
            "circumferences estimated"
        );

        let samples = diagnostic_samples(&profiles, n_grid);
        let views = [
            (ViewAngle::Front, front_stats),
            (ViewAngle::Back, back_stats),
            (ViewAngle::Left, left_stats),
            (ViewAngle::Right, right_stats),
        ]
        .into_iter()
        .collect();

        Ok(CircumferenceResult {
            circumferences_cm,
            samples,
            scale_cm_per_px: scale.cm_per_px(),
            subject_height_cm: height_cm,
            views,
        })
    }

    fn process_view(
        &self,
        frames: &[DynamicImage],
        view: ViewAngle,
        n_grid: usize,
        quality: Option<&dyn FrameQuality>,
    ) -> Result<(HeightProfile, ViewStats), MeasureError> {
        let silhouette = extract_silhouette(frames, view, &self.config.silhouette, quality)?;
        let stats = ViewStats {
            frames_seen: silhouette.frames_seen,
            frames_accepted: silhouette.frames_accepted,
            span_px: silhouette.contour.span_px(),
            contour_points: silhouette.contour.points.len(),
        };
        let profile = sample_profile(&silhouette.contour, &self.config.levels, n_grid);
        Ok((profile, stats))
    }
}
