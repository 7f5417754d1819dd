//! cv-achievements — achievement-key redemption for a gamified student CV.
//!
//! Learning games hand out signed achievement keys. This crate decodes and
//! verifies those keys, applies the points they carry to a persisted skill
//! set, records level-up achievements, gates games behind prerequisites,
//! and keeps an audit log of every attempt.

pub mod config;
pub mod debug;
pub mod error;
pub mod intake;
pub mod key;
pub mod ledger;
pub mod platform;
pub mod profile;
pub mod skill;
pub mod storage;
pub mod time;

// Re-export primary types
pub use config::{GameDefinition, LedgerConfig};
pub use error::{LedgerError, Result};
pub use ledger::{
    AchievementRecord, AttemptLogEntry, Ledger, LedgerEvent, LedgerObserver, ProcessResult,
    Rejection,
};
pub use skill::{level_of, Skill, SkillCategory, SkillSet};

// Re-export key types
pub use key::{
    decode, encode, sign_claim, signed, AchievementClaim, AchievementEntry, DecodeError,
    InvalidReason, KeyVerifier,
};

// Re-export storage types
pub use storage::{FileStore, KeyValueStore, MemoryStore};

// Re-export presentation helpers
pub use debug::DebugMonitor;
pub use intake::{process_bundled_keys, process_page_url, IntakeSummary};
pub use platform::platform_redirect_url;
pub use profile::{initialize_app, PersonalInfo};
pub use time::{Clock, FixedClock, SystemClock};
