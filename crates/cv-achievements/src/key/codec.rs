//! Key token encoding: base64 over UTF-8 JSON.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use super::claim::AchievementClaim;

/// Standard alphabet, padding optional on decode.
const KEY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why a token could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed key: {0}")]
    Malformed(String),
}

/// Decode a key token into a claim.
///
/// ASCII whitespace anywhere in the token is ignored, so keys pasted with
/// line breaks still decode.
pub fn decode(token: &str) -> Result<AchievementClaim, DecodeError> {
    let compact: String = token
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if compact.is_empty() {
        return Err(DecodeError::Malformed("empty key".into()));
    }

    let bytes = KEY_ENGINE
        .decode(compact.as_bytes())
        .map_err(|e| DecodeError::Malformed(format!("invalid base64: {e}")))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| DecodeError::Malformed(format!("invalid UTF-8: {e}")))?;

    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| DecodeError::Malformed(format!("invalid JSON: {e}")))?;
    if !value.is_object() {
        return Err(DecodeError::Malformed("payload is not a JSON object".into()));
    }

    let claim: AchievementClaim = serde_json::from_value(value)
        .map_err(|e| DecodeError::Malformed(format!("unexpected claim shape: {e}")))?;
    log::debug!(
        "decoded key for game '{}' with {} entries",
        claim.game_id,
        claim.entries().len()
    );
    Ok(claim)
}

/// Encode a claim as a key token (padded standard base64).
pub fn encode(claim: &AchievementClaim) -> String {
    // A claim holds only strings and integers, so serialization cannot fail.
    let json = serde_json::to_string(claim).unwrap_or_default();
    STANDARD.encode(json.as_bytes())
}
