//! Data structures for the progression ledger.

use serde::{Deserialize, Serialize};

use crate::key::InvalidReason;
use crate::skill::SkillSet;

// ---------------------------------------------------------------------------
// Achievement record
// ---------------------------------------------------------------------------

/// A badge earned when a key raises a skill's level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementRecord {
    pub skill_id: String,
    /// `"{skill name} Level {n}"`.
    pub title: String,
    pub description: String,
    /// Issuance date of the key, `YYYY-MM-DD`.
    pub date: String,
    pub icon: String,
}

// ---------------------------------------------------------------------------
// Attempt log
// ---------------------------------------------------------------------------

/// One entry of the key verification audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptLogEntry {
    /// RFC 3339 time of the attempt.
    pub timestamp: String,
    /// First ten characters of the key followed by `...`.
    pub key_fragment: String,
    pub success: bool,
    pub reason: String,
}

/// The loggable prefix of a key.
pub fn key_fragment(key: &str) -> String {
    let head: String = key.chars().take(10).collect();
    format!("{head}...")
}

// ---------------------------------------------------------------------------
// Rejection
// ---------------------------------------------------------------------------

/// Why a key was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The exact key string was accepted before.
    AlreadyUsed,
    /// Not decodable into a claim.
    Malformed(String),
    /// Decoded but failed a verification rule.
    Invalid(InvalidReason),
    /// A prerequisite game's skill is absent or still at level 0.
    PrerequisitesNotMet { game_id: String, missing: Vec<String> },
    /// The backing store failed mid-call.
    Storage(String),
}

impl Rejection {
    /// Message shown to the person redeeming the key.
    pub fn message(&self) -> String {
        match self {
            Rejection::AlreadyUsed => "Key already used".to_string(),
            Rejection::Malformed(_) => "Invalid key format".to_string(),
            Rejection::Invalid(reason) => format!("Invalid key: {reason}"),
            Rejection::PrerequisitesNotMet { .. } => {
                "Prerequisites not met for this achievement. Complete required courses first."
                    .to_string()
            }
            Rejection::Storage(e) => format!("Could not save progress: {e}"),
        }
    }

    /// Reason written to the attempt log.
    pub fn log_reason(&self) -> String {
        match self {
            Rejection::AlreadyUsed => "Key already used".to_string(),
            Rejection::Malformed(_) => "Invalid key format".to_string(),
            Rejection::Invalid(reason) => format!("Invalid: {reason}"),
            Rejection::PrerequisitesNotMet { game_id, missing } => format!(
                "Prerequisites not met for {game_id}: {}",
                missing.join(", ")
            ),
            Rejection::Storage(e) => format!("Storage error: {e}"),
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.log_reason())
    }
}

// ---------------------------------------------------------------------------
// Process result
// ---------------------------------------------------------------------------

pub const SUCCESS_MESSAGE: &str = "Skills updated successfully";
pub const SUCCESS_LOG_REASON: &str = "Successfully processed";

/// Outcome of redeeming one key.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessResult {
    pub success: bool,
    pub message: String,
    /// Skill set after the call; unchanged on failure.
    pub skills: SkillSet,
    /// Records created by this call; empty on failure.
    pub new_achievements: Vec<AchievementRecord>,
    /// The key as submitted, for follow-up save instructions.
    pub key: String,
    /// Game id of the claim when the key decoded.
    pub game_id: Option<String>,
    pub rejection: Option<Rejection>,
}

impl ProcessResult {
    pub(crate) fn accepted(
        key: &str,
        game_id: String,
        skills: SkillSet,
        new_achievements: Vec<AchievementRecord>,
    ) -> Self {
        Self {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
            skills,
            new_achievements,
            key: key.to_string(),
            game_id: Some(game_id),
            rejection: None,
        }
    }

    pub(crate) fn rejected(
        key: &str,
        game_id: Option<String>,
        skills: SkillSet,
        rejection: Rejection,
    ) -> Self {
        Self {
            success: false,
            message: rejection.message(),
            skills,
            new_achievements: Vec::new(),
            key: key.to_string(),
            game_id,
            rejection: Some(rejection),
        }
    }
}
