//! Achievement keys — decoding, signing and verification.
//!
//! The key module provides:
//! - The claim payload carried by a key
//! - Base64/JSON encoding and decoding of key tokens
//! - The platform's rolling-hash signature
//! - Ordered verification: structure, expiry, student binding, signature

pub mod claim;
pub mod codec;
pub mod signature;
pub mod verify;

pub use claim::{AchievementClaim, AchievementEntry};
pub use codec::{decode, encode, DecodeError};
pub use signature::{sign_claim, signed};
pub use verify::{InvalidReason, KeyVerifier};
