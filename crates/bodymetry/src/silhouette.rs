//! Per-view silhouette extraction: frame sequence → one stable contour.
//!
//! Each frame goes through intensity conversion, Gaussian blur, Canny edge
//! detection, gap-closing dilation, largest-closed-boundary extraction and
//! Douglas–Peucker simplification. Accepted per-frame contours are
//! normalized to a common vertical span, resampled into left/right boundary
//! columns and averaged point-wise to damp per-frame jitter. The batch
//! state is an explicit accumulator value advanced by pure reduction steps,
//! so partial batches are directly testable and order-independent.

use image::{DynamicImage, GrayImage};
use imageproc::distance_transform::Norm;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

use crate::error::MeasureError;
use crate::quality::FrameQuality;
use crate::ViewAngle;

/// Configuration for silhouette extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SilhouetteConfig {
    /// Maximum frames consumed from one view's capture sequence.
    pub max_frames: usize,
    /// Gaussian blur sigma applied before edge detection.
    pub blur_sigma: f32,
    /// Canny low threshold.
    pub canny_low: f32,
    /// Canny high threshold.
    pub canny_high: f32,
    /// L-inf dilation radius (pixels) closing small edge gaps.
    pub dilate_px: u8,
    /// Minimum enclosed area (pixels^2) for a body candidate boundary.
    pub min_area_px: f64,
    /// Douglas–Peucker simplification tolerance (pixels).
    pub dp_epsilon_px: f64,
    /// Number of resampled boundary rows used for averaging.
    pub n_rows: usize,
    /// Minimum fraction of the batch's frames that must yield a contour.
    pub min_accept_fraction: f64,
    /// Frames with an advisory quality score below this are skipped.
    pub min_quality_score: f32,
}

impl Default for SilhouetteConfig {
    fn default() -> Self {
        Self {
            max_frames: 30,
            blur_sigma: 1.4,
            canny_low: 20.0,
            canny_high: 60.0,
            dilate_px: 1,
            min_area_px: 500.0,
            dp_epsilon_px: 2.0,
            n_rows: 64,
            min_accept_fraction: 0.5,
            min_quality_score: 0.75,
        }
    }
}

/// Ordered closed body outline in pixel space.
///
/// Invariant on construction from a batch: encloses non-zero area and
/// spans the full vertical extent of the visible body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    /// Vertices in order; the last point closes back to the first.
    pub points: Vec<[f64; 2]>,
}

impl Contour {
    /// Enclosed area via the shoelace formula.
    pub fn area(&self) -> f64 {
        shoelace_area(&self.points)
    }

    /// (y_top, y_bottom) of the outline.
    pub fn vertical_extent(&self) -> (f64, f64) {
        let mut top = f64::INFINITY;
        let mut bottom = f64::NEG_INFINITY;
        for p in &self.points {
            top = top.min(p[1]);
            bottom = bottom.max(p[1]);
        }
        (top, bottom)
    }

    /// Head-to-foot pixel span.
    pub fn span_px(&self) -> f64 {
        let (top, bottom) = self.vertical_extent();
        bottom - top
    }

    /// Leftmost/rightmost boundary intersections with the horizontal line
    /// at `y`, or `None` when the line misses the outline.
    pub fn extents_at_y(&self, y: f64) -> Option<(f64, f64)> {
        horizontal_extents(&self.points, y)
    }
}

/// Extraction output for one view: the averaged contour plus batch counts.
#[derive(Debug, Clone)]
pub struct Silhouette {
    pub contour: Contour,
    pub frames_seen: usize,
    pub frames_accepted: usize,
}

/// Extract one stable silhouette contour from an ordered frame sequence.
///
/// Frames without a sufficiently large closed boundary are skipped; they
/// still count toward the batch's minimum-acceptance fraction. The
/// optional quality capability filters frames before contour detection and
/// is purely advisory: extraction is fully functional with `None`.
pub fn extract_silhouette(
    frames: &[DynamicImage],
    view: ViewAngle,
    config: &SilhouetteConfig,
    quality: Option<&dyn FrameQuality>,
) -> Result<Silhouette, MeasureError> {
    let mut acc = BatchAccumulator::new(config.n_rows);

    for frame in frames.iter().take(config.max_frames) {
        if let Some(score) = quality.and_then(|cap| cap.score(frame)) {
            if score < config.min_quality_score {
                tracing::debug!(view = %view, score, "frame below quality gate, skipped");
                acc = acc.skip();
                continue;
            }
        }

        match frame_contour(&frame.to_luma8(), config) {
            Some(points) => {
                match resample_columns(&points, config.n_rows) {
                    Some(cols) => acc = acc.accept(&cols),
                    None => acc = acc.skip(),
                };
            }
            None => {
                tracing::debug!(view = %view, "no usable contour in frame, skipped");
                acc = acc.skip();
            }
        }
    }

    let silhouette = acc.finish(view, config.min_accept_fraction)?;
    tracing::info!(
        view = %view,
        frames_accepted = silhouette.frames_accepted,
        frames_seen = silhouette.frames_seen,
        span_px = silhouette.contour.span_px(),
        "silhouette extracted"
    );
    Ok(silhouette)
}

/// Detect the body boundary polygon in a single intensity frame.
///
/// Returns the Douglas–Peucker-simplified largest closed boundary, or
/// `None` when no boundary clears the minimum-area threshold.
pub fn frame_contour(gray: &GrayImage, config: &SilhouetteConfig) -> Option<Vec<[f64; 2]>> {
    let blurred = blur_gray(gray, config.blur_sigma);
    let edges = imageproc::edges::canny(&blurred, config.canny_low, config.canny_high);
    let closed = if config.dilate_px > 0 {
        imageproc::morphology::dilate(&edges, Norm::LInf, config.dilate_px)
    } else {
        edges
    };

    let contours = imageproc::contours::find_contours::<i32>(&closed);

    // Largest outer boundary by enclosed area; background clutter and edge
    // fragments fall below the area threshold.
    let mut best: Option<(f64, Vec<Point<i32>>)> = None;
    for c in contours {
        if c.points.len() < 3 {
            continue;
        }
        let pts: Vec<[f64; 2]> = c.points.iter().map(|p| [p.x as f64, p.y as f64]).collect();
        let area = shoelace_area(&pts);
        if area < config.min_area_px {
            continue;
        }
        if best.as_ref().map_or(true, |(a, _)| area > *a) {
            best = Some((area, c.points));
        }
    }

    let (_, points) = best?;
    let simplified =
        imageproc::geometry::approximate_polygon_dp(&points, config.dp_epsilon_px, true);
    let poly: Vec<[f64; 2]> = simplified
        .iter()
        .map(|p| [p.x as f64, p.y as f64])
        .collect();
    // Simplification can collapse a thin boundary below a valid polygon.
    if poly.len() < 3 || shoelace_area(&poly) < config.min_area_px {
        return None;
    }
    Some(poly)
}

// ── Batch accumulation ─────────────────────────────────────────────────────

/// Per-frame contour resampled into left/right boundary columns on a
/// common normalized vertical grid.
#[derive(Debug, Clone)]
pub(crate) struct ScanColumns {
    y_top: f64,
    y_bottom: f64,
    /// Leftmost boundary x per row; `None` where the row misses the outline.
    left: Vec<Option<f64>>,
    right: Vec<Option<f64>>,
}

/// Resample a closed polygon into boundary columns at `n_rows` evenly
/// spaced rows between its vertical extremes.
pub(crate) fn resample_columns(points: &[[f64; 2]], n_rows: usize) -> Option<ScanColumns> {
    if points.len() < 3 || n_rows < 2 {
        return None;
    }
    let y_top = points.iter().map(|p| p[1]).fold(f64::INFINITY, f64::min);
    let y_bottom = points
        .iter()
        .map(|p| p[1])
        .fold(f64::NEG_INFINITY, f64::max);
    if !(y_bottom - y_top).is_finite() || y_bottom <= y_top {
        return None;
    }

    let mut left = Vec::with_capacity(n_rows);
    let mut right = Vec::with_capacity(n_rows);
    for i in 0..n_rows {
        let t = i as f64 / (n_rows - 1) as f64;
        // Nudge the extreme rows inward so the scan line meets the apex
        // and sole edges instead of grazing single vertices.
        let y = y_top + t.clamp(1e-6, 1.0 - 1e-6) * (y_bottom - y_top);
        match horizontal_extents(points, y) {
            Some((lo, hi)) => {
                left.push(Some(lo));
                right.push(Some(hi));
            }
            None => {
                left.push(None);
                right.push(None);
            }
        }
    }

    Some(ScanColumns {
        y_top,
        y_bottom,
        left,
        right,
    })
}

/// Immutable batch accumulator: each reduction step consumes the previous
/// value and returns the next, so frame order cannot leak hidden state.
#[derive(Debug, Clone)]
pub(crate) struct BatchAccumulator {
    n_rows: usize,
    frames_seen: usize,
    frames_accepted: usize,
    y_top_sum: f64,
    y_bottom_sum: f64,
    left_sum: Vec<f64>,
    left_n: Vec<u32>,
    right_sum: Vec<f64>,
    right_n: Vec<u32>,
}

impl BatchAccumulator {
    pub(crate) fn new(n_rows: usize) -> Self {
        Self {
            n_rows,
            frames_seen: 0,
            frames_accepted: 0,
            y_top_sum: 0.0,
            y_bottom_sum: 0.0,
            left_sum: vec![0.0; n_rows],
            left_n: vec![0; n_rows],
            right_sum: vec![0.0; n_rows],
            right_n: vec![0; n_rows],
        }
    }

    /// Record a frame that yielded no usable contour.
    pub(crate) fn skip(mut self) -> Self {
        self.frames_seen += 1;
        self
    }

    /// Fold one accepted frame's boundary columns into the running means.
    pub(crate) fn accept(mut self, cols: &ScanColumns) -> Self {
        debug_assert_eq!(cols.left.len(), self.n_rows);
        self.frames_seen += 1;
        self.frames_accepted += 1;
        self.y_top_sum += cols.y_top;
        self.y_bottom_sum += cols.y_bottom;
        for i in 0..self.n_rows {
            if let Some(x) = cols.left[i] {
                self.left_sum[i] += x;
                self.left_n[i] += 1;
            }
            if let Some(x) = cols.right[i] {
                self.right_sum[i] += x;
                self.right_n[i] += 1;
            }
        }
        self
    }

    /// Close the batch: enforce the acceptance fraction and rebuild the
    /// averaged closed contour (left boundary top→bottom, right boundary
    /// bottom→top).
    pub(crate) fn finish(
        self,
        view: ViewAngle,
        min_accept_fraction: f64,
    ) -> Result<Silhouette, MeasureError> {
        let needed = (self.frames_seen as f64 * min_accept_fraction).ceil() as usize;
        if self.frames_accepted == 0 || self.frames_accepted < needed {
            return Err(MeasureError::NoContourDetected {
                view,
                frames_seen: self.frames_seen,
                frames_accepted: self.frames_accepted,
            });
        }

        let y_top = self.y_top_sum / self.frames_accepted as f64;
        let y_bottom = self.y_bottom_sum / self.frames_accepted as f64;
        let span = y_bottom - y_top;

        let mut left_pts = Vec::with_capacity(self.n_rows);
        let mut right_pts = Vec::with_capacity(self.n_rows);
        for i in 0..self.n_rows {
            if self.left_n[i] == 0 || self.right_n[i] == 0 {
                continue;
            }
            let t = i as f64 / (self.n_rows - 1) as f64;
            let y = y_top + t * span;
            left_pts.push([self.left_sum[i] / self.left_n[i] as f64, y]);
            right_pts.push([self.right_sum[i] / self.right_n[i] as f64, y]);
        }

        let mut points = left_pts;
        right_pts.reverse();
        points.extend(right_pts);

        let contour = Contour { points };
        if contour.points.len() < 3 || contour.area() <= 0.0 || contour.span_px() <= 0.0 {
            return Err(MeasureError::NoContourDetected {
                view,
                frames_seen: self.frames_seen,
                frames_accepted: self.frames_accepted,
            });
        }

        Ok(Silhouette {
            contour,
            frames_seen: self.frames_seen,
            frames_accepted: self.frames_accepted,
        })
    }
}

// ── Geometry helpers ───────────────────────────────────────────────────────

/// Shoelace area of a closed polygon (absolute value).
pub(crate) fn shoelace_area(points: &[[f64; 2]]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let mut acc = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        acc += points[i][0] * points[j][1];
        acc -= points[j][0] * points[i][1];
    }
    (acc / 2.0).abs()
}

/// Outermost intersections of the horizontal line at `y` with a closed
/// polygon boundary. Horizontal edges contribute both endpoints.
pub(crate) fn horizontal_extents(points: &[[f64; 2]], y: f64) -> Option<(f64, f64)> {
    let n = points.len();
    if n < 3 {
        return None;
    }
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    let mut found = false;
    for i in 0..n {
        let [x0, y0] = points[i];
        let [x1, y1] = points[(i + 1) % n];
        if (y0 - y) * (y1 - y) > 0.0 {
            continue;
        }
        if y0 == y1 {
            if y0 == y {
                lo = lo.min(x0.min(x1));
                hi = hi.max(x0.max(x1));
                found = true;
            }
            continue;
        }
        let x = x0 + (y - y0) * (x1 - x0) / (y1 - y0);
        lo = lo.min(x);
        hi = hi.max(x);
        found = true;
    }
    found.then_some((lo, hi))
}

/// Gaussian-blur an intensity image; a non-positive sigma is a no-op.
fn blur_gray(img: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return img.clone();
    }
    imageproc::filter::gaussian_blur_f32(img, sigma)
}
