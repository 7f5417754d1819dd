//! The achievement claim carried inside a key.

use serde::{Deserialize, Deserializer, Serialize};

/// One skill award inside a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub skill_id: String,
    /// Point delta, added as given.
    #[serde(default, deserialize_with = "null_as_default")]
    pub points: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

impl AchievementEntry {
    pub fn new(skill_id: impl Into<String>, points: i64, description: impl Into<String>) -> Self {
        Self {
            skill_id: skill_id.into(),
            points,
            description: description.into(),
        }
    }
}

/// Decoded key payload.
///
/// Absent fields decode to empty values rather than failing, so the
/// verifier can report them as missing instead of malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementClaim {
    #[serde(default, deserialize_with = "null_as_default")]
    pub game_id: String,
    /// Issuance time, Unix seconds.
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievements: Option<Vec<AchievementEntry>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
}

impl AchievementClaim {
    /// Start an unsigned claim for `game_id` issued at `timestamp`.
    pub fn new(game_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            game_id: game_id.into(),
            timestamp,
            achievements: Some(Vec::new()),
            signature: String::new(),
            student_id: None,
        }
    }

    /// Append an award.
    pub fn with_entry(
        mut self,
        skill_id: impl Into<String>,
        points: i64,
        description: impl Into<String>,
    ) -> Self {
        self.achievements
            .get_or_insert_with(Vec::new)
            .push(AchievementEntry::new(skill_id, points, description));
        self
    }

    /// Bind the claim to one student.
    pub fn for_student(mut self, student_id: impl Into<String>) -> Self {
        self.student_id = Some(student_id.into());
        self
    }

    /// Awards in the claim; empty when the list is absent.
    pub fn entries(&self) -> &[AchievementEntry] {
        self.achievements.as_deref().unwrap_or(&[])
    }

    /// The student binding, ignoring an empty id.
    pub fn bound_student(&self) -> Option<&str> {
        self.student_id.as_deref().filter(|s| !s.is_empty())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
