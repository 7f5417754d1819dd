//! Ledger configuration.
//!
//! `LedgerConfig::default()` reproduces the CV template's built-in
//! configuration. A JSON file may override any subset of fields; absent
//! fields keep their defaults.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::skill::{LevelThresholds, Skill, SkillCategory, SkillSet};

/// Secret shared with the learning-games platform that issues keys.
pub const DEFAULT_SECRET: &str = "learning-games-platform-secret-2024";

/// Keys older than this are rejected as expired (30 days).
pub const DEFAULT_MAX_KEY_AGE_SECS: i64 = 30 * 24 * 60 * 60;

/// Attempt log entries kept before the oldest is evicted.
pub const DEFAULT_ATTEMPT_LOG_CAPACITY: usize = 50;

pub const DEFAULT_PLATFORM_URL: &str = "https://AlexViking.github.io/game-platform";

/// Icon used when a skill has no entry in the icon table.
pub const FALLBACK_ICON: &str = "🏆";

// ---------------------------------------------------------------------------
// Game definitions
// ---------------------------------------------------------------------------

/// A learning game offered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDefinition {
    pub title: String,
    pub icon: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    /// Skill gated by this game when it is someone's prerequisite.
    /// Falls back to the game id's leading hyphen-delimited token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
}

impl GameDefinition {
    fn new(title: &str, icon: &str, prerequisites: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            icon: icon.to_string(),
            prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
            skill: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Debug settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DebugSettings {
    pub enabled_by_default: bool,
    pub log_to_console: bool,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            enabled_by_default: false,
            log_to_console: true,
        }
    }
}

// ---------------------------------------------------------------------------
// LedgerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerConfig {
    pub platform_url: String,
    pub secret: String,
    pub max_key_age_secs: i64,
    pub attempt_log_capacity: usize,
    pub level_thresholds: LevelThresholds,
    /// Skills seeded into an empty store.
    pub skills: SkillSet,
    pub games: BTreeMap<String, GameDefinition>,
    pub achievement_icons: BTreeMap<String, String>,
    pub debug: DebugSettings,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let skills: SkillSet = [
            ("internet", "Internet Basics", SkillCategory::Backend, 100, "#3b82f6"),
            ("html", "HTML", SkillCategory::Frontend, 100, "#e34c26"),
            ("css", "CSS", SkillCategory::Frontend, 100, "#264de4"),
            ("js", "JavaScript", SkillCategory::Frontend, 150, "#f7df1e"),
            ("networking", "Network Basics", SkillCategory::Backend, 80, "#10b981"),
            ("problem-solving", "Problem Solving", SkillCategory::Soft, 120, "#8b5cf6"),
            ("web-standards", "Web Standards", SkillCategory::Industry, 70, "#f59e0b"),
        ]
        .into_iter()
        .map(|(id, name, category, max_points, color)| {
            (
                id.to_string(),
                Skill::new(name, category, max_points).with_color(color),
            )
        })
        .collect();

        let games = [
            ("internet-basics", GameDefinition::new("Internet Basics", "🌐", &[])),
            (
                "html-fundamentals",
                GameDefinition::new("HTML Fundamentals", "📄", &["internet-basics"]),
            ),
            (
                "css-styling",
                GameDefinition::new(
                    "CSS Styling",
                    "🎨",
                    &["internet-basics", "html-fundamentals"],
                ),
            ),
            (
                "javascript-basics",
                GameDefinition::new("JavaScript Basics", "📜", &["html-fundamentals"]),
            ),
        ]
        .into_iter()
        .map(|(id, game)| (id.to_string(), game))
        .collect();

        let achievement_icons = [
            ("internet", "🌐"),
            ("html", "📄"),
            ("css", "🎨"),
            ("js", "📜"),
            ("networking", "📡"),
            ("problem-solving", "🧩"),
            ("web-standards", "📋"),
        ]
        .into_iter()
        .map(|(id, icon)| (id.to_string(), icon.to_string()))
        .collect();

        Self {
            platform_url: DEFAULT_PLATFORM_URL.to_string(),
            secret: DEFAULT_SECRET.to_string(),
            max_key_age_secs: DEFAULT_MAX_KEY_AGE_SECS,
            attempt_log_capacity: DEFAULT_ATTEMPT_LOG_CAPACITY,
            level_thresholds: LevelThresholds::default(),
            skills,
            games,
            achievement_icons,
            debug: DebugSettings::default(),
        }
    }
}

impl LedgerConfig {
    /// Load a configuration from a JSON file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes).map_err(|e| {
            LedgerError::InvalidConfig(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the ledger cannot operate on.
    pub fn validate(&self) -> Result<()> {
        if self.secret.is_empty() {
            return Err(LedgerError::InvalidConfig("secret must not be empty".into()));
        }
        if self.attempt_log_capacity == 0 {
            return Err(LedgerError::InvalidConfig(
                "attemptLogCapacity must be at least 1".into(),
            ));
        }
        if self.max_key_age_secs < 0 {
            return Err(LedgerError::InvalidConfig(
                "maxKeyAgeSecs must not be negative".into(),
            ));
        }
        if !self.level_thresholds.is_ascending() {
            return Err(LedgerError::InvalidConfig(format!(
                "levelThresholds must be positive and strictly ascending, got {:?}",
                self.level_thresholds.0
            )));
        }
        for (game_id, game) in &self.games {
            if let Some(missing) = game
                .prerequisites
                .iter()
                .find(|p| !self.games.contains_key(p.as_str()))
            {
                return Err(LedgerError::InvalidConfig(format!(
                    "game '{game_id}' lists unknown prerequisite '{missing}'"
                )));
            }
        }
        Ok(())
    }

    /// Prerequisite game ids of `game_id`. Unknown games have none.
    pub fn prerequisites_of(&self, game_id: &str) -> &[String] {
        self.games
            .get(game_id)
            .map(|g| g.prerequisites.as_slice())
            .unwrap_or(&[])
    }

    /// The skill a (prerequisite) game stands for.
    pub fn skill_for_game<'a>(&'a self, game_id: &'a str) -> &'a str {
        match self.games.get(game_id).and_then(|g| g.skill.as_deref()) {
            Some(skill) => skill,
            None => game_id.split('-').next().unwrap_or(game_id),
        }
    }

    /// Badge icon for a skill.
    pub fn icon_for(&self, skill_id: &str) -> &str {
        self.achievement_icons
            .get(skill_id)
            .map(String::as_str)
            .unwrap_or(FALLBACK_ICON)
    }
}
