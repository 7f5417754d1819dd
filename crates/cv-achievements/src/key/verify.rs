//! Claim verification.

use crate::config::LedgerConfig;
use crate::time::is_representable;

use super::claim::AchievementClaim;
use super::signature::sign_claim;

/// The rule a claim failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    MissingFields,
    Expired,
    WrongStudent,
    BadSignature,
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InvalidReason::MissingFields => "missing fields",
            InvalidReason::Expired => "expired",
            InvalidReason::WrongStudent => "wrong student",
            InvalidReason::BadSignature => "bad signature",
        };
        write!(f, "{s}")
    }
}

/// Checks structure, age, student binding and signature of a claim.
#[derive(Debug, Clone)]
pub struct KeyVerifier {
    secret: String,
    max_key_age_secs: i64,
    student_id: String,
}

impl KeyVerifier {
    pub fn new(
        secret: impl Into<String>,
        max_key_age_secs: i64,
        student_id: impl Into<String>,
    ) -> Self {
        Self {
            secret: secret.into(),
            max_key_age_secs,
            student_id: student_id.into(),
        }
    }

    /// Build a verifier from configuration for the given student.
    pub fn from_config(config: &LedgerConfig, student_id: impl Into<String>) -> Self {
        Self::new(config.secret.clone(), config.max_key_age_secs, student_id)
    }

    /// The student this verifier accepts bound claims for.
    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    /// Run every rule in order, stopping at the first failure.
    pub fn check(&self, claim: &AchievementClaim, now: i64) -> Result<(), InvalidReason> {
        if claim.game_id.is_empty()
            || claim.timestamp == 0
            || !is_representable(claim.timestamp)
            || claim.achievements.is_none()
            || claim.signature.is_empty()
        {
            return Err(InvalidReason::MissingFields);
        }

        if now.saturating_sub(claim.timestamp) > self.max_key_age_secs {
            return Err(InvalidReason::Expired);
        }

        if let Some(bound) = claim.bound_student() {
            if bound != self.student_id {
                return Err(InvalidReason::WrongStudent);
            }
        }

        match sign_claim(claim, &self.secret) {
            Ok(expected) if expected == claim.signature => Ok(()),
            _ => Err(InvalidReason::BadSignature),
        }
    }

    /// Whether the claim passes every rule.
    pub fn verify(&self, claim: &AchievementClaim, now: i64) -> bool {
        self.check(claim, now).is_ok()
    }
}
