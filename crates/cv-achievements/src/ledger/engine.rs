//! Ledger engine — redeeming keys, gating prerequisites, recording progress.

use std::collections::HashSet;

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::key::{decode, AchievementClaim, KeyVerifier};
use crate::profile::resolve_student_id;
use crate::skill::SkillSet;
use crate::storage::{keys, read_json, write_json, KeyValueStore};
use crate::time::{secs_to_iso_date, secs_to_rfc3339, Clock, SystemClock};

use super::events::{LedgerEvent, LedgerObserver};
use super::types::*;

/// Owns skills, achievement history, verified keys and the attempt log.
///
/// All state lives in the injected store; the ledger keeps only the
/// verified-key set in memory, hydrated when it is opened.
pub struct Ledger<S: KeyValueStore> {
    store: S,
    config: LedgerConfig,
    verifier: KeyVerifier,
    clock: Box<dyn Clock>,
    verified_keys: Vec<String>,
    verified_index: HashSet<String>,
    observers: Vec<Box<dyn LedgerObserver>>,
}

impl<S: KeyValueStore> Ledger<S> {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Open a ledger over `store`.
    ///
    /// Validates the configuration, seeds default skills and empty
    /// collections into a fresh store, loads the verified-key set, and binds
    /// the verifier to the student resolved from the stored profile.
    pub fn open(mut store: S, config: LedgerConfig) -> Result<Self> {
        config.validate()?;

        if !store.contains(keys::SKILLS)? {
            let mut seeded = config.skills.clone();
            for skill in seeded.values_mut() {
                skill.level = config.level_thresholds.level_of(skill.points);
            }
            write_json(&mut store, keys::SKILLS, &seeded)?;
        }
        for key in [keys::ACHIEVEMENTS, keys::KEY_ATTEMPTS, keys::VERIFIED_KEYS] {
            if !store.contains(key)? {
                store.set(key, "[]")?;
            }
        }

        let verified_keys: Vec<String> = read_json(&store, keys::VERIFIED_KEYS)?.unwrap_or_default();
        let verified_index = verified_keys.iter().cloned().collect();
        let student_id = resolve_student_id(&store)?;
        let verifier = KeyVerifier::from_config(&config, student_id);

        log::debug!(
            "ledger opened with {} verified keys for student '{}'",
            verified_keys.len(),
            verifier.student_id()
        );

        Ok(Self {
            store,
            config,
            verifier,
            clock: Box::new(SystemClock),
            verified_keys,
            verified_index,
            observers: Vec::new(),
        })
    }

    /// Replace the wall clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Verify bound keys against `student_id` instead of the stored profile.
    pub fn with_student(mut self, student_id: impl Into<String>) -> Self {
        self.verifier = KeyVerifier::from_config(&self.config, student_id);
        self
    }

    /// Register an observer for ledger events.
    pub fn subscribe(&mut self, observer: impl LedgerObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn student_id(&self) -> &str {
        self.verifier.student_id()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Release the ledger and hand back its store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Current skill set.
    pub fn skills(&self) -> Result<SkillSet> {
        match read_json(&self.store, keys::SKILLS)? {
            Some(skills) => Ok(skills),
            None => Ok(self.config.skills.clone()),
        }
    }

    /// Achievement history, oldest first.
    pub fn achievements(&self) -> Result<Vec<AchievementRecord>> {
        Ok(read_json(&self.store, keys::ACHIEVEMENTS)?.unwrap_or_default())
    }

    /// Verification attempt log, oldest first.
    pub fn verification_log(&self) -> Result<Vec<AttemptLogEntry>> {
        Ok(read_json(&self.store, keys::KEY_ATTEMPTS)?.unwrap_or_default())
    }

    /// Keys accepted so far, in acceptance order.
    pub fn verified_keys(&self) -> &[String] {
        &self.verified_keys
    }

    pub fn is_used(&self, raw_key: &str) -> bool {
        self.verified_index.contains(raw_key)
    }

    // -----------------------------------------------------------------------
    // Prerequisites
    // -----------------------------------------------------------------------

    /// Whether every prerequisite of `game_id` has its skill at level 1+.
    pub fn check_prerequisites(&self, game_id: &str) -> Result<bool> {
        let skills = self.skills()?;
        Ok(self.missing_prerequisites(game_id, &skills).is_empty())
    }

    /// Prerequisite games of `game_id` whose skill is absent or at level 0.
    ///
    /// Only direct prerequisites are checked.
    pub fn missing_prerequisites(&self, game_id: &str, skills: &SkillSet) -> Vec<String> {
        self.config
            .prerequisites_of(game_id)
            .iter()
            .filter(|prereq| {
                let skill_id = self.config.skill_for_game(prereq);
                skills.get(skill_id).map_or(true, |s| s.level < 1)
            })
            .cloned()
            .collect()
    }

    // -----------------------------------------------------------------------
    // Process
    // -----------------------------------------------------------------------

    /// Redeem a key.
    ///
    /// Never fails: every rejection becomes an unsuccessful result. Each call
    /// appends exactly one attempt-log entry and notifies observers.
    pub fn process(&mut self, raw_key: &str) -> ProcessResult {
        let mut game_id = None;
        let result = match self.redeem(raw_key, &mut game_id) {
            Ok((skills, new_achievements)) => {
                let game_id = game_id.unwrap_or_default();
                log::info!(
                    "key for '{}' accepted, {} new achievement(s)",
                    game_id,
                    new_achievements.len()
                );
                ProcessResult::accepted(raw_key, game_id, skills, new_achievements)
            }
            Err(rejection) => {
                log::warn!("key {} rejected: {}", key_fragment(raw_key), rejection);
                let skills = self.skills().unwrap_or_else(|_| self.config.skills.clone());
                ProcessResult::rejected(raw_key, game_id, skills, rejection)
            }
        };

        let reason = match &result.rejection {
            None => SUCCESS_LOG_REASON.to_string(),
            Some(rejection) => rejection.log_reason(),
        };
        self.log_attempt(raw_key, result.success, reason);
        self.notify(&LedgerEvent::Processed(&result));
        result
    }

    /// Decode and verify a key without applying it.
    pub fn validate(&mut self, raw_key: &str) -> bool {
        let claim = decode(raw_key).ok();
        let valid = claim
            .as_ref()
            .is_some_and(|c| self.verifier.verify(c, self.clock.now_secs()));

        let reason = if valid {
            "Valid key"
        } else {
            "Invalid signature or format"
        };
        self.log_attempt(raw_key, valid, reason.to_string());
        self.notify(&LedgerEvent::Validated {
            key: raw_key,
            game_id: claim.as_ref().map(|c| c.game_id.as_str()),
            valid,
        });
        valid
    }

    /// Run the redemption pipeline, stopping at the first rejection.
    fn redeem(
        &mut self,
        raw_key: &str,
        game_id: &mut Option<String>,
    ) -> std::result::Result<(SkillSet, Vec<AchievementRecord>), Rejection> {
        if self.is_used(raw_key) {
            return Err(Rejection::AlreadyUsed);
        }

        let claim = decode(raw_key).map_err(|e| Rejection::Malformed(e.to_string()))?;
        *game_id = Some(claim.game_id.clone());

        self.verifier
            .check(&claim, self.clock.now_secs())
            .map_err(Rejection::Invalid)?;

        let mut skills = self.skills().map_err(storage_rejection)?;
        let missing = self.missing_prerequisites(&claim.game_id, &skills);
        if !missing.is_empty() {
            return Err(Rejection::PrerequisitesNotMet {
                game_id: claim.game_id.clone(),
                missing,
            });
        }

        let new_achievements = self.apply_claim(&claim, &mut skills);
        self.commit(raw_key, &skills, &new_achievements)
            .map_err(storage_rejection)?;
        Ok((skills, new_achievements))
    }

    /// Add every known entry's points and build one record per skill whose
    /// level rose above where it stood before this claim.
    fn apply_claim(
        &self,
        claim: &AchievementClaim,
        skills: &mut SkillSet,
    ) -> Vec<AchievementRecord> {
        let thresholds = self.config.level_thresholds;
        // (skill id, level before the claim, description of the raising entry)
        let mut touched: Vec<(String, u8, Option<String>)> = Vec::new();

        for entry in claim.entries() {
            let Some(skill) = skills.get_mut(&entry.skill_id) else {
                log::debug!("ignoring unknown skill '{}'", entry.skill_id);
                continue;
            };

            let index = match touched.iter().position(|(id, _, _)| id == &entry.skill_id) {
                Some(i) => i,
                None => {
                    touched.push((entry.skill_id.clone(), skill.level, None));
                    touched.len() - 1
                }
            };

            skill.apply_points(entry.points, &thresholds);
            let (_, baseline, description) = &mut touched[index];
            if skill.level > *baseline {
                *description = Some(entry.description.clone());
            }
        }

        let date = secs_to_iso_date(claim.timestamp);
        touched
            .into_iter()
            .filter_map(|(skill_id, baseline, description)| {
                let skill = skills.get(&skill_id)?;
                if skill.level <= baseline {
                    return None;
                }
                log::info!("'{}' reached level {}", skill.name, skill.level);
                Some(AchievementRecord {
                    title: format!("{} Level {}", skill.name, skill.level),
                    description: description.unwrap_or_default(),
                    date: date.clone(),
                    icon: self.config.icon_for(&skill_id).to_string(),
                    skill_id,
                })
            })
            .collect()
    }

    /// Persist the outcome of an accepted key.
    ///
    /// Either all three values are written or the prior values of skills and
    /// achievements are put back, so a failed commit leaves the key
    /// redeemable without double-counting its points.
    fn commit(
        &mut self,
        raw_key: &str,
        skills: &SkillSet,
        new_achievements: &[AchievementRecord],
    ) -> Result<()> {
        let mut history = self.achievements()?;
        history.extend_from_slice(new_achievements);

        let mut verified = self.verified_keys.clone();
        verified.push(raw_key.to_string());

        let snapshot = [
            (keys::SKILLS, self.store.get(keys::SKILLS)?),
            (keys::ACHIEVEMENTS, self.store.get(keys::ACHIEVEMENTS)?),
        ];

        let written = write_json(&mut self.store, keys::SKILLS, skills)
            .and_then(|()| write_json(&mut self.store, keys::ACHIEVEMENTS, &history))
            .and_then(|()| write_json(&mut self.store, keys::VERIFIED_KEYS, &verified));

        if let Err(e) = written {
            self.restore(&snapshot);
            return Err(e);
        }

        self.verified_keys = verified;
        self.verified_index.insert(raw_key.to_string());
        Ok(())
    }

    /// Put back raw values captured before a failed commit.
    fn restore(&mut self, snapshot: &[(&str, Option<String>)]) {
        for (key, previous) in snapshot {
            let restored = match previous {
                Some(raw) => self.store.set(key, raw),
                None => self.store.remove(key),
            };
            if let Err(e) = restored {
                log::warn!("failed to roll back '{key}' after a failed commit: {e}");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Attempt log
    // -----------------------------------------------------------------------

    fn log_attempt(&mut self, raw_key: &str, success: bool, reason: String) {
        let mut attempts = match self.verification_log() {
            Ok(attempts) => attempts,
            Err(e) => {
                log::warn!("resetting unreadable attempt log: {e}");
                Vec::new()
            }
        };

        attempts.push(AttemptLogEntry {
            timestamp: secs_to_rfc3339(self.clock.now_secs()),
            key_fragment: key_fragment(raw_key),
            success,
            reason,
        });

        let capacity = self.config.attempt_log_capacity;
        if attempts.len() > capacity {
            let excess = attempts.len() - capacity;
            attempts.drain(..excess);
        }

        if let Err(e) = write_json(&mut self.store, keys::KEY_ATTEMPTS, &attempts) {
            log::warn!("failed to write attempt log: {e}");
        }
    }

    fn notify(&self, event: &LedgerEvent<'_>) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

fn storage_rejection(e: LedgerError) -> Rejection {
    Rejection::Storage(e.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
