//! Key signatures.
//!
//! The issuing platform signs a claim with a 32-bit rolling string hash of
//! `secret + payload + secret`, where `payload` is the claim serialized as
//! compact JSON without its signature. This is a checksum, not a MAC: the
//! secret ships with the page. It must stay bit-for-bit compatible with the
//! issuer.

use serde::Serialize;

use crate::error::{LedgerError, Result};

use super::claim::{AchievementClaim, AchievementEntry};

/// Field order here is the wire order the issuer hashes.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SigningPayload<'a> {
    game_id: &'a str,
    timestamp: i64,
    achievements: &'a [AchievementEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    student_id: Option<&'a str>,
}

/// Serialize the signed portion of a claim.
pub fn signing_payload(claim: &AchievementClaim) -> Result<String> {
    let payload = SigningPayload {
        game_id: &claim.game_id,
        timestamp: claim.timestamp,
        achievements: claim.entries(),
        student_id: claim.student_id.as_deref(),
    };
    serde_json::to_string(&payload).map_err(|e| LedgerError::SerializationError(e.to_string()))
}

/// `h = h * 31 + unit` over UTF-16 code units, wrapping at 32 bits.
pub fn rolling_hash(input: &str) -> i32 {
    input.encode_utf16().fold(0i32, |h, unit| {
        (h << 5).wrapping_sub(h).wrapping_add(i32::from(unit))
    })
}

/// Render a signed 32-bit value in base 16 with a leading `-` when negative.
pub fn signed_hex(value: i32) -> String {
    if value < 0 {
        format!("-{:x}", i64::from(value).unsigned_abs())
    } else {
        format!("{value:x}")
    }
}

/// Compute the signature a claim should carry under `secret`.
pub fn sign_claim(claim: &AchievementClaim, secret: &str) -> Result<String> {
    let payload = signing_payload(claim)?;
    Ok(signed_hex(rolling_hash(&format!("{secret}{payload}{secret}"))))
}

/// Sign a claim in place and return it.
pub fn signed(mut claim: AchievementClaim, secret: &str) -> Result<AchievementClaim> {
    claim.signature = sign_claim(&claim, secret)?;
    Ok(claim)
}
