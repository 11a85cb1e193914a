//! Fusion of the four per-view width profiles into elliptical
//! cross-sections.
//!
//! Width comes from the front/back pair, depth from the left/right pair.
//! The bilateral-symmetry assumption is deliberate: large front/back
//! divergence is averaged, not rejected — robustness comes from the four
//! independent views, not from outlier detection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::levels::{BodyLevel, LevelTable};
use crate::profile::{grid_ratios, HeightProfile};
use crate::DiagnosticSample;

/// Elliptical body slice at one level: horizontal width and
/// front-to-back depth, both in pixels.
///
/// Invariant: both components are strictly positive; fusion never emits a
/// zero-filled cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossSection {
    pub width_px: f64,
    pub depth_px: f64,
}

/// The four per-view profiles of one capture session.
#[derive(Debug, Clone)]
pub struct ViewProfiles {
    pub front: HeightProfile,
    pub back: HeightProfile,
    pub left: HeightProfile,
    pub right: HeightProfile,
}

/// Mean of the defined values in a view pair, if any is defined.
fn pair_mean(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a + b) / 2.0),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}

/// Fuse one level across the four views.
///
/// Returns `None` when either the width pair or the depth pair is entirely
/// undefined at this level: a one-axis slice cannot form an ellipse, and a
/// zero fill would silently corrupt the perimeter formula downstream.
pub fn fuse_level(profiles: &ViewProfiles, level: BodyLevel) -> Option<CrossSection> {
    let width = pair_mean(
        profiles.front.width_at(level),
        profiles.back.width_at(level),
    )?;
    let depth = pair_mean(
        profiles.left.width_at(level),
        profiles.right.width_at(level),
    )?;
    Some(CrossSection {
        width_px: width,
        depth_px: depth,
    })
}

/// Fuse every table level; levels without a valid cross-section are
/// omitted (not zero-filled).
pub fn fuse(profiles: &ViewProfiles, table: &LevelTable) -> BTreeMap<BodyLevel, CrossSection> {
    let mut sections = BTreeMap::new();
    for entry in table.iter() {
        match fuse_level(profiles, entry.level) {
            Some(cs) => {
                sections.insert(entry.level, cs);
            }
            None => {
                tracing::warn!(level = %entry.level, "no view pair defined, level omitted");
            }
        }
    }
    sections
}

/// Assemble the ordered diagnostic samples over the uniform grid.
pub fn diagnostic_samples(profiles: &ViewProfiles, n_grid: usize) -> Vec<DiagnosticSample> {
    let ratios = grid_ratios(n_grid);
    let grid_width = |p: &HeightProfile, i: usize| p.grid_widths.get(i).copied().flatten();
    ratios
        .into_iter()
        .enumerate()
        .map(|(i, height_ratio)| DiagnosticSample {
            height_ratio,
            front_width: grid_width(&profiles.front, i),
            back_width: grid_width(&profiles.back, i),
            left_width: grid_width(&profiles.left, i),
            right_width: grid_width(&profiles.right, i),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    fn profile_with(levels: &[(BodyLevel, f64)]) -> HeightProfile {
        HeightProfile {
            level_widths: levels.iter().copied().collect::<BTreeMap<_, _>>(),
            grid_widths: vec![],
            span_px: 900.0,
        }
    }

    fn waist_profiles(front: f64, back: f64, left: f64, right: f64) -> ViewProfiles {
        ViewProfiles {
            front: profile_with(&[(BodyLevel::Waist, front)]),
            back: profile_with(&[(BodyLevel::Waist, back)]),
            left: profile_with(&[(BodyLevel::Waist, left)]),
            right: profile_with(&[(BodyLevel::Waist, right)]),
        }
    }

    #[test]
    fn fuses_pair_means() {
        let profiles = waist_profiles(160.0, 158.0, 100.0, 98.0);
        let cs = fuse_level(&profiles, BodyLevel::Waist).unwrap();
        assert_relative_eq!(cs.width_px, 159.0);
        assert_relative_eq!(cs.depth_px, 99.0);
    }

    #[test]
    fn missing_single_view_falls_back_to_other_view() {
        let mut profiles = waist_profiles(160.0, 158.0, 100.0, 98.0);
        profiles.back.level_widths.clear();
        let cs = fuse_level(&profiles, BodyLevel::Waist).unwrap();
        assert_relative_eq!(cs.width_px, 160.0);
        assert_relative_eq!(cs.depth_px, 99.0);
    }

    #[test]
    fn missing_axis_pair_omits_level() {
        let mut profiles = waist_profiles(160.0, 158.0, 100.0, 98.0);
        profiles.left.level_widths.clear();
        profiles.right.level_widths.clear();
        assert!(fuse_level(&profiles, BodyLevel::Waist).is_none());

        let table = LevelTable::default();
        let sections = fuse(&profiles, &table);
        assert!(!sections.contains_key(&BodyLevel::Waist));
    }

    #[test]
    fn sparse_level_leaves_other_levels_untouched() {
        let mut profiles = waist_profiles(160.0, 158.0, 100.0, 98.0);
        for p in [
            &mut profiles.front,
            &mut profiles.back,
            &mut profiles.left,
            &mut profiles.right,
        ] {
            p.level_widths.insert(BodyLevel::Chest, 180.0);
        }
        profiles.front.level_widths.remove(&BodyLevel::Waist);
        profiles.back.level_widths.remove(&BodyLevel::Waist);

        let sections = fuse(&profiles, &LevelTable::default());
        assert!(!sections.contains_key(&BodyLevel::Waist));
        let chest = sections[&BodyLevel::Chest];
        assert_relative_eq!(chest.width_px, 180.0);
        assert_relative_eq!(chest.depth_px, 180.0);
    }

    #[test]
    fn diagnostic_samples_align_with_grid() {
        let mut profiles = waist_profiles(160.0, 158.0, 100.0, 98.0);
        profiles.front.grid_widths = vec![Some(10.0), None, Some(30.0)];
        profiles.back.grid_widths = vec![Some(12.0), Some(20.0), None];
        profiles.left.grid_widths = vec![None, None, None];
        profiles.right.grid_widths = vec![Some(8.0), Some(9.0), Some(11.0)];

        let samples = diagnostic_samples(&profiles, 3);
        assert_eq!(samples.len(), 3);
        assert_relative_eq!(samples[1].height_ratio, 0.5);
        assert_eq!(samples[1].front_width, None);
        assert_eq!(samples[1].back_width, Some(20.0));
        assert_eq!(samples[2].right_width, Some(11.0));
    }
}
