//! Optional frame-quality capability.
//!
//! External pose estimators can score frames (for example, from landmark
//! visibility) before the silhouette stage consumes them. The capability
//! is strictly advisory: the geometric core is fully functional when it is
//! absent, and a hint never overrides the contour-detection result.

use image::DynamicImage;

/// Advisory per-frame quality scorer.
///
/// `Sync` because views are processed in parallel within a session.
pub trait FrameQuality: Sync {
    /// Quality/visibility score in [0, 1] for a frame, or `None` when the
    /// capability cannot judge this frame (treated as acceptable).
    fn score(&self, frame: &DynamicImage) -> Option<f32>;
}

/// Fixed-score hint, mainly useful in tests and as a trivial adapter.
#[derive(Debug, Clone, Copy)]
pub struct ConstQuality(pub f32);

impl FrameQuality for ConstQuality {
    fn score(&self, _frame: &DynamicImage) -> Option<f32> {
        Some(self.0)
    }
}
