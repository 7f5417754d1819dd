//! Progression ledger — applying verified keys to skills and achievements.
//!
//! The ledger module provides:
//! - Key redemption with replay rejection and prerequisite gating
//! - Level-up detection and achievement records
//! - A capped audit log of every verification attempt
//! - Observer hooks for presentation layers
//! - Display projections and save instructions

pub mod engine;
pub mod events;
pub mod instructions;
pub mod types;
pub mod view;

pub use engine::Ledger;
pub use events::{LedgerEvent, LedgerObserver};
pub use instructions::permanent_save_instructions;
pub use types::{key_fragment, AchievementRecord, AttemptLogEntry, ProcessResult, Rejection};
pub use view::{
    completed_game_details, completed_games, newest_first, skill_progress, CompletedGame,
    SkillProgress,
};
