//! Data structures for skills and levels.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Skill category
// ---------------------------------------------------------------------------

/// Display category of a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Frontend,
    Backend,
    Soft,
    Industry,
}

impl std::fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkillCategory::Frontend => "frontend",
            SkillCategory::Backend => "backend",
            SkillCategory::Soft => "soft",
            SkillCategory::Industry => "industry",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Level thresholds
// ---------------------------------------------------------------------------

/// Highest level a skill can reach.
pub const MAX_LEVEL: u8 = 5;

/// Points needed for levels 1 through 5, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelThresholds(pub [i64; MAX_LEVEL as usize]);

impl Default for LevelThresholds {
    fn default() -> Self {
        Self([10, 25, 50, 100, 200])
    }
}

impl LevelThresholds {
    /// The step function mapping points to a level in `0..=5`.
    pub fn level_of(&self, points: i64) -> u8 {
        self.0.iter().take_while(|&&t| points >= t).count() as u8
    }

    /// Whether every threshold is positive and strictly above the previous one.
    pub fn is_ascending(&self) -> bool {
        self.0[0] > 0 && self.0.windows(2).all(|w| w[0] < w[1])
    }
}

/// Level for `points` under the default thresholds (10/25/50/100/200).
pub fn level_of(points: i64) -> u8 {
    LevelThresholds::default().level_of(points)
}

// ---------------------------------------------------------------------------
// Skill
// ---------------------------------------------------------------------------

/// A tracked skill as persisted under the `skills` storage key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub name: String,
    pub category: SkillCategory,
    pub points: i64,
    /// Cached `level_of(points)`.
    pub level: u8,
    /// Display ceiling for the progress bar. Points may exceed it.
    pub max_points: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Skill {
    /// Create a skill with no progress.
    pub fn new(name: impl Into<String>, category: SkillCategory, max_points: i64) -> Self {
        Self {
            name: name.into(),
            category,
            points: 0,
            level: 0,
            max_points,
            color: None,
        }
    }

    /// Attach a display colour.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Add a point delta and refresh the cached level.
    ///
    /// Returns the level held before the delta was applied.
    pub fn apply_points(&mut self, delta: i64, thresholds: &LevelThresholds) -> u8 {
        let previous = self.level;
        self.points = self.points.saturating_add(delta);
        self.level = thresholds.level_of(self.points);
        previous
    }

    /// Progress toward `max_points` as a whole percentage capped at 100.
    pub fn progress_percent(&self) -> u8 {
        if self.max_points <= 0 {
            return if self.points > 0 { 100 } else { 0 };
        }
        let pct = (self.points as f64 / self.max_points as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

/// Skill identifier → skill.
pub type SkillSet = BTreeMap<String, Skill>;
