//! Width-vs-normalized-height sampling of one silhouette contour.
//!
//! The contour's vertical extent maps to the ratio axis [0, 1]
//! (0 = top of head, 1 = feet). Each requested ratio becomes a horizontal
//! scan line; the width is the distance between the outermost boundary
//! intersections. Ratios that miss the silhouette (above head, below feet,
//! or a zero-width graze) are absent from the profile — profiles are
//! sparse near the extremities and downstream stages tolerate that.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::levels::{BodyLevel, LevelTable};
use crate::silhouette::Contour;

/// Silhouette widths of one view, indexed by body level and by the
/// uniform diagnostic grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeightProfile {
    /// Width in pixels per named body level, where defined.
    pub level_widths: BTreeMap<BodyLevel, f64>,
    /// Width per diagnostic grid ratio, aligned with [`grid_ratios`].
    pub grid_widths: Vec<Option<f64>>,
    /// Head-to-foot pixel span of the sampled contour.
    pub span_px: f64,
}

impl HeightProfile {
    /// Width at a named level, if the scan line met the silhouette there.
    pub fn width_at(&self, level: BodyLevel) -> Option<f64> {
        self.level_widths.get(&level).copied()
    }
}

/// The uniform diagnostic sampling grid: `n` evenly spaced ratios in [0, 1].
pub fn grid_ratios(n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![0.5];
    }
    (0..n).map(|i| i as f64 / (n - 1) as f64).collect()
}

/// Sample one contour at every level-table entry and grid ratio.
///
/// The table must have been validated; entries whose anchor cannot be
/// resolved are skipped.
pub fn sample_profile(contour: &Contour, table: &LevelTable, n_grid: usize) -> HeightProfile {
    let (y_top, y_bottom) = contour.vertical_extent();
    let span = y_bottom - y_top;

    let width_at_ratio = |ratio: f64| -> Option<f64> {
        let y = y_top + ratio * span;
        let (lo, hi) = contour.extents_at_y(y)?;
        let width = hi - lo;
        (width > 0.0).then_some(width)
    };

    let mut level_widths = BTreeMap::new();
    for entry in table.iter() {
        let Some(ratio) = table.resolve(entry) else {
            continue;
        };
        if let Some(width) = width_at_ratio(ratio) {
            level_widths.insert(entry.level, width);
        }
    }

    let grid_widths = grid_ratios(n_grid)
        .into_iter()
        .map(width_at_ratio)
        .collect();

    HeightProfile {
        level_widths,
        grid_widths,
        span_px: span,
    }
}
