//! Skills — tracked abilities, their points, and the level step function.

pub mod types;

pub use types::{level_of, LevelThresholds, Skill, SkillCategory, SkillSet, MAX_LEVEL};
