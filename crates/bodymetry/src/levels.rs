//! Named body levels and the injectable level-to-height-ratio table.
//!
//! The table is process-wide static configuration, not mutable state: it is
//! validated once at session start and consulted by the profile sampler and
//! the fuser. Customizing the measured levels means injecting a different
//! table, not recompiling.

use serde::{Deserialize, Serialize};

use crate::error::MeasureError;

/// Named body levels bound to fixed normalized height ratios.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BodyLevel {
    Chest,
    Waist,
    Hip,
    ThighUpper,
    ThighMid,
    Calf,
    ArmBicep,
    Forearm,
}

impl BodyLevel {
    /// All levels in the default table order.
    pub const ALL: [BodyLevel; 8] = [
        BodyLevel::Chest,
        BodyLevel::Waist,
        BodyLevel::Hip,
        BodyLevel::ThighUpper,
        BodyLevel::ThighMid,
        BodyLevel::Calf,
        BodyLevel::ArmBicep,
        BodyLevel::Forearm,
    ];

    /// Snake-case level name as used in serialized records.
    pub fn name(self) -> &'static str {
        match self {
            BodyLevel::Chest => "chest",
            BodyLevel::Waist => "waist",
            BodyLevel::Hip => "hip",
            BodyLevel::ThighUpper => "thigh_upper",
            BodyLevel::ThighMid => "thigh_mid",
            BodyLevel::Calf => "calf",
            BodyLevel::ArmBicep => "arm_bicep",
            BodyLevel::Forearm => "forearm",
        }
    }
}

impl std::fmt::Display for BodyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How a level's ratio is anchored on the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelAnchor {
    /// Ratio measured on the head-to-foot span (0 = top of head, 1 = feet).
    FromTop,
    /// Negative ratio; the level sits `|ratio| * span` pixels below the
    /// hip row rather than on the head-to-foot ratio axis.
    BelowHip,
}

/// One validated entry of the level table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelEntry {
    pub level: BodyLevel,
    /// Normalized height ratio in [-1, 1]; sign must match the anchor.
    pub ratio: f64,
    pub anchor: LevelAnchor,
}

/// Injectable mapping from [`BodyLevel`] to normalized height ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelTable {
    pub entries: Vec<LevelEntry>,
}

impl Default for LevelTable {
    fn default() -> Self {
        use BodyLevel::*;
        use LevelAnchor::*;
        let entry = |level, ratio, anchor| LevelEntry {
            level,
            ratio,
            anchor,
        };
        Self {
            entries: vec![
                entry(Chest, 0.30, FromTop),
                entry(Waist, 0.42, FromTop),
                entry(Hip, 0.52, FromTop),
                entry(ThighUpper, 0.60, FromTop),
                entry(ThighMid, 0.68, FromTop),
                entry(Calf, -0.30, BelowHip),
                entry(ArmBicep, 0.36, FromTop),
                entry(Forearm, 0.45, FromTop),
            ],
        }
    }
}

impl LevelTable {
    /// Validate every entry: ratio range, anchor/sign agreement, no
    /// duplicate levels, and a hip anchor present when any entry is
    /// hip-relative.
    pub fn validate(&self) -> Result<(), MeasureError> {
        let invalid = |reason: String| MeasureError::InvalidLevelTable { reason };

        if self.entries.is_empty() {
            return Err(invalid("table has no entries".into()));
        }

        let mut seen = Vec::with_capacity(self.entries.len());
        for e in &self.entries {
            if !e.ratio.is_finite() || !(-1.0..=1.0).contains(&e.ratio) {
                return Err(invalid(format!(
                    "{}: ratio {} outside [-1, 1]",
                    e.level, e.ratio
                )));
            }
            match e.anchor {
                LevelAnchor::FromTop if e.ratio < 0.0 => {
                    return Err(invalid(format!(
                        "{}: from_top anchor requires ratio >= 0 (got {})",
                        e.level, e.ratio
                    )));
                }
                LevelAnchor::BelowHip if e.ratio >= 0.0 => {
                    return Err(invalid(format!(
                        "{}: below_hip anchor requires ratio < 0 (got {})",
                        e.level, e.ratio
                    )));
                }
                _ => {}
            }
            if seen.contains(&e.level) {
                return Err(invalid(format!("duplicate entry for {}", e.level)));
            }
            seen.push(e.level);
        }

        let has_below_hip = self
            .entries
            .iter()
            .any(|e| e.anchor == LevelAnchor::BelowHip);
        if has_below_hip && self.hip_ratio().is_none() {
            return Err(invalid(
                "below_hip entries present but no from_top hip entry".into(),
            ));
        }

        Ok(())
    }

    /// The from-top ratio of the hip entry, if the table has one.
    pub fn hip_ratio(&self) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.level == BodyLevel::Hip && e.anchor == LevelAnchor::FromTop)
            .map(|e| e.ratio)
    }

    /// Resolve an entry to an effective from-top ratio.
    ///
    /// Below-hip entries resolve against an absolute pixel offset from the
    /// hip row: `hip_ratio + |ratio|` on the span axis. Returns `None` when
    /// resolution needs a hip anchor the table does not have.
    pub fn resolve(&self, entry: &LevelEntry) -> Option<f64> {
        match entry.anchor {
            LevelAnchor::FromTop => Some(entry.ratio),
            LevelAnchor::BelowHip => self.hip_ratio().map(|hip| hip + entry.ratio.abs()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_table_is_valid() {
        let table = LevelTable::default();
        table.validate().unwrap();
        assert_eq!(table.entries.len(), BodyLevel::ALL.len());
    }

    #[test]
    fn below_hip_resolves_as_offset_from_hip_row() {
        let table = LevelTable::default();
        let calf = table
            .iter()
            .find(|e| e.level == BodyLevel::Calf)
            .copied()
            .unwrap();
        // hip at 0.52, calf 0.30 below: effective ratio 0.82.
        assert_relative_eq!(table.resolve(&calf).unwrap(), 0.82, max_relative = 1e-12);
    }

    #[test]
    fn rejects_ratio_outside_range() {
        let mut table = LevelTable::default();
        table.entries[0].ratio = 1.5;
        assert!(matches!(
            table.validate(),
            Err(MeasureError::InvalidLevelTable { .. })
        ));
    }

    #[test]
    fn rejects_anchor_sign_mismatch() {
        let mut table = LevelTable::default();
        table.entries[0].anchor = LevelAnchor::BelowHip; // chest with +0.30
        assert!(table.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_levels() {
        let mut table = LevelTable::default();
        let dup = table.entries[0];
        table.entries.push(dup);
        assert!(table.validate().is_err());
    }

    #[test]
    fn rejects_below_hip_without_hip_entry() {
        let mut table = LevelTable::default();
        table.entries.retain(|e| e.level != BodyLevel::Hip);
        assert!(table.validate().is_err());
    }

    #[test]
    fn table_round_trips_through_json() {
        let table = LevelTable::default();
        let json = serde_json::to_string(&table).unwrap();
        let back: LevelTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
