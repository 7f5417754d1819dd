//! Read-only projections of ledger state for display.

use serde::Serialize;

use crate::config::{LedgerConfig, FALLBACK_ICON};
use crate::key::decode;
use crate::skill::{SkillCategory, SkillSet};

use super::types::AchievementRecord;

/// One row of the skills panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillProgress {
    pub skill_id: String,
    pub name: String,
    pub category: SkillCategory,
    pub level: u8,
    pub points: i64,
    pub percent: u8,
}

/// Progress rows for every skill, in skill-id order.
pub fn skill_progress(skills: &SkillSet) -> Vec<SkillProgress> {
    skills
        .iter()
        .map(|(id, skill)| SkillProgress {
            skill_id: id.clone(),
            name: skill.name.clone(),
            category: skill.category,
            level: skill.level,
            points: skill.points,
            percent: skill.progress_percent(),
        })
        .collect()
}

/// Achievements newest first. Records sharing a date keep history order.
pub fn newest_first(achievements: &[AchievementRecord]) -> Vec<AchievementRecord> {
    let mut sorted = achievements.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
}

/// Distinct game ids behind the accepted keys, first completion first.
pub fn completed_games(verified_keys: &[String]) -> Vec<String> {
    let mut games: Vec<String> = Vec::new();
    for key in verified_keys {
        if let Ok(claim) = decode(key) {
            if !claim.game_id.is_empty() && !games.contains(&claim.game_id) {
                games.push(claim.game_id);
            }
        }
    }
    games
}

/// A completed game with its display title and icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedGame {
    pub game_id: String,
    pub title: String,
    pub icon: String,
}

/// Completed games labelled from the configured game table. Games missing
/// from the table show their id and the fallback icon.
pub fn completed_game_details(
    verified_keys: &[String],
    config: &LedgerConfig,
) -> Vec<CompletedGame> {
    completed_games(verified_keys)
        .into_iter()
        .map(|game_id| {
            let (title, icon) = match config.games.get(&game_id) {
                Some(game) => (game.title.clone(), game.icon.clone()),
                None => (game_id.clone(), FALLBACK_ICON.to_string()),
            };
            CompletedGame {
                game_id,
                title,
                icon,
            }
        })
        .collect()
}
