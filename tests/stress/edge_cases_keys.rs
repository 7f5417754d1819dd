//! Edge case tests: expiry boundary, structural checks, student binding,
//! signature tampering, unknown skills, level jumps and storage failures.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use cv_achievements::key::{decode, InvalidReason};
use cv_achievements::storage::keys;
use cv_achievements::{
    encode, signed, AchievementClaim, FixedClock, KeyValueStore, Ledger, LedgerConfig,
    LedgerError, MemoryStore, Rejection,
};

const NOW: i64 = 1_750_000_000;
const THIRTY_DAYS: i64 = 30 * 24 * 60 * 60;

fn secret() -> String {
    LedgerConfig::default().secret
}

fn ledger() -> Ledger<MemoryStore> {
    Ledger::open(MemoryStore::new(), LedgerConfig::default())
        .unwrap()
        .with_clock(FixedClock(NOW))
}

fn mint(claim: AchievementClaim) -> String {
    encode(&signed(claim, &secret()).unwrap())
}

fn invalid_reason(ledger: &mut Ledger<MemoryStore>, key: &str) -> Option<InvalidReason> {
    match ledger.process(key).rejection {
        Some(Rejection::Invalid(reason)) => Some(reason),
        _ => None,
    }
}

// === Expiry ===

#[test]
fn edge_expiry_boundary() {
    let mut ledger = ledger();

    let exactly = mint(
        AchievementClaim::new("internet-basics", NOW - THIRTY_DAYS).with_entry("internet", 10, ""),
    );
    let result = ledger.process(&exactly);
    assert!(result.success, "exactly 30 days old should pass: {}", result.message);

    let stale = mint(
        AchievementClaim::new("internet-basics", NOW - THIRTY_DAYS - 1)
            .with_entry("internet", 10, ""),
    );
    let result = ledger.process(&stale);
    assert_eq!(result.message, "Invalid key: expired");
    assert_eq!(result.rejection, Some(Rejection::Invalid(InvalidReason::Expired)));
}

#[test]
fn edge_future_timestamp_is_accepted() {
    let mut ledger = ledger();
    let future = mint(
        AchievementClaim::new("internet-basics", NOW + 3_600).with_entry("internet", 10, ""),
    );
    assert!(ledger.process(&future).success);
}

// === Structure ===

#[test]
fn edge_missing_fields() {
    let mut ledger = ledger();

    let empty_object = STANDARD.encode("{}");
    assert_eq!(
        invalid_reason(&mut ledger, &empty_object),
        Some(InvalidReason::MissingFields)
    );

    let zero_timestamp = mint(AchievementClaim::new("internet-basics", 0));
    assert_eq!(
        invalid_reason(&mut ledger, &zero_timestamp),
        Some(InvalidReason::MissingFields)
    );

    let no_achievements = STANDARD.encode(
        r#"{"gameId":"internet-basics","timestamp":1750000000,"signature":"1a2b"}"#,
    );
    assert_eq!(
        invalid_reason(&mut ledger, &no_achievements),
        Some(InvalidReason::MissingFields)
    );

    let unsigned = encode(&AchievementClaim::new("internet-basics", NOW));
    assert_eq!(
        invalid_reason(&mut ledger, &unsigned),
        Some(InvalidReason::MissingFields)
    );
}

#[test]
fn edge_malformed_inputs() {
    let mut ledger = ledger();
    let inputs = vec![
        String::new(),
        "%%%".to_string(),
        STANDARD.encode([0xffu8, 0xfe, 0xfd]),
        STANDARD.encode("[1,2,3]"),
        STANDARD.encode("\"just a string\""),
        STANDARD.encode(r#"{"gameId":42,"timestamp":1,"achievements":[]}"#),
    ];
    for raw in &inputs {
        let result = ledger.process(raw);
        assert_eq!(result.message, "Invalid key format", "input {raw:?}");
        assert!(matches!(result.rejection, Some(Rejection::Malformed(_))));
    }
}

#[test]
fn edge_unpadded_and_wrapped_keys_decode() {
    let key = mint(AchievementClaim::new("internet-basics", NOW).with_entry("internet", 10, ""));
    let unpadded = key.trim_end_matches('=');
    let wrapped = format!("  {}\n{}\n", &key[..8], &key[8..]);

    assert_eq!(decode(unpadded).unwrap(), decode(&key).unwrap());
    assert_eq!(decode(&wrapped).unwrap(), decode(&key).unwrap());

    let mut ledger = ledger();
    assert!(ledger.process(unpadded).success);
}

// === Student binding ===

#[test]
fn edge_student_binding() {
    let mut ledger = ledger().with_student("octocat");

    let other = mint(
        AchievementClaim::new("internet-basics", NOW)
            .with_entry("internet", 10, "")
            .for_student("hubot"),
    );
    assert_eq!(
        invalid_reason(&mut ledger, &other),
        Some(InvalidReason::WrongStudent)
    );

    let empty_binding = mint(
        AchievementClaim::new("internet-basics", NOW - 1)
            .with_entry("internet", 10, "")
            .for_student(""),
    );
    assert!(ledger.process(&empty_binding).success);

    let mine = mint(
        AchievementClaim::new("internet-basics", NOW - 2)
            .with_entry("internet", 10, "")
            .for_student("octocat"),
    );
    assert!(ledger.process(&mine).success);
}

// === Signature ===

#[test]
fn edge_tampered_keys_fail_signature() {
    let mut ledger = ledger();
    let claim = signed(
        AchievementClaim::new("internet-basics", NOW).with_entry("internet", 10, ""),
        &secret(),
    )
    .unwrap();

    let mut inflated = claim.clone();
    if let Some(entries) = inflated.achievements.as_mut() {
        entries[0].points = 500;
    }
    assert_eq!(
        invalid_reason(&mut ledger, &encode(&inflated)),
        Some(InvalidReason::BadSignature)
    );

    let mut regamed = claim.clone();
    regamed.game_id = "css-styling".to_string();
    assert_eq!(
        invalid_reason(&mut ledger, &encode(&regamed)),
        Some(InvalidReason::BadSignature)
    );

    let foreign = signed(
        AchievementClaim::new("internet-basics", NOW).with_entry("internet", 10, ""),
        "some-other-secret",
    )
    .unwrap();
    assert_eq!(
        invalid_reason(&mut ledger, &encode(&foreign)),
        Some(InvalidReason::BadSignature)
    );

    assert_eq!(ledger.skills().unwrap()["internet"].points, 0);
}

// === Points and levels ===

#[test]
fn edge_unknown_skill_is_ignored() {
    let mut ledger = ledger();
    let key = mint(
        AchievementClaim::new("internet-basics", NOW)
            .with_entry("quantum", 99, "Entangled")
            .with_entry("internet", 10, ""),
    );
    let result = ledger.process(&key);
    assert!(result.success);
    assert!(!result.skills.contains_key("quantum"));
    assert_eq!(result.new_achievements.len(), 1);
    assert_eq!(result.new_achievements[0].skill_id, "internet");
}

#[test]
fn edge_empty_award_list_succeeds() {
    let mut ledger = ledger();
    let result = ledger.process(&mint(AchievementClaim::new("internet-basics", NOW)));
    assert!(result.success);
    assert!(result.new_achievements.is_empty());
    assert_eq!(ledger.verified_keys().len(), 1);
}

#[test]
fn edge_multi_level_jump_yields_one_record() {
    let mut ledger = ledger();
    let key = mint(
        AchievementClaim::new("internet-basics", NOW)
            .with_entry("networking", 20, "Subnets")
            .with_entry("networking", 40, "Routing"),
    );
    let result = ledger.process(&key);
    assert_eq!(result.skills["networking"].points, 60);
    assert_eq!(result.new_achievements.len(), 1);
    let record = &result.new_achievements[0];
    assert_eq!(record.title, "Network Basics Level 3");
    assert_eq!(record.description, "Routing");
    assert_eq!(record.date, "2025-06-15");
    assert_eq!(record.icon, "📡");
}

#[test]
fn edge_negative_points_lower_level_without_record() {
    let mut ledger = ledger();
    assert!(ledger
        .process(&mint(
            AchievementClaim::new("internet-basics", NOW).with_entry("css", 30, "")
        ))
        .success);

    let penalty = ledger.process(&mint(
        AchievementClaim::new("internet-basics", NOW - 1).with_entry("css", -25, "Penalty"),
    ));
    assert!(penalty.success);
    assert_eq!(penalty.skills["css"].points, 5);
    assert_eq!(penalty.skills["css"].level, 0);
    assert!(penalty.new_achievements.is_empty());
    assert_eq!(ledger.achievements().unwrap().len(), 1);
}

// === Storage failures ===

/// A store whose writes to one key start failing once armed.
struct FlakyStore {
    inner: MemoryStore,
    fail_key: &'static str,
    armed: bool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> cv_achievements::Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> cv_achievements::Result<()> {
        if self.armed && key == self.fail_key {
            return Err(LedgerError::StorageError("disk full".into()));
        }
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> cv_achievements::Result<()> {
        self.inner.remove(key)
    }

    fn keys(&self) -> cv_achievements::Result<Vec<String>> {
        self.inner.keys()
    }
}

#[test]
fn edge_storage_failure_becomes_rejection() {
    let store = FlakyStore {
        inner: MemoryStore::new(),
        fail_key: keys::SKILLS,
        armed: false,
    };
    let mut ledger = Ledger::open(store, LedgerConfig::default())
        .unwrap()
        .with_clock(FixedClock(NOW));
    ledger.store_mut().armed = true;

    let key = mint(AchievementClaim::new("internet-basics", NOW).with_entry("internet", 10, ""));
    let result = ledger.process(&key);
    assert!(!result.success);
    assert!(matches!(result.rejection, Some(Rejection::Storage(_))));
    assert!(result.message.starts_with("Could not save progress"));

    // Nothing was committed, so the key can be retried once storage recovers.
    assert!(!ledger.is_used(&key));
    ledger.store_mut().armed = false;
    assert!(ledger.process(&key).success);
}

fn assert_late_write_failure_rolls_back(fail_key: &'static str) {
    let store = FlakyStore {
        inner: MemoryStore::new(),
        fail_key,
        armed: false,
    };
    let mut ledger = Ledger::open(store, LedgerConfig::default())
        .unwrap()
        .with_clock(FixedClock(NOW));
    ledger.store_mut().armed = true;

    let skills_before = ledger.store().get(keys::SKILLS).unwrap();
    let achievements_before = ledger.store().get(keys::ACHIEVEMENTS).unwrap();

    let key = mint(AchievementClaim::new("internet-basics", NOW).with_entry("internet", 10, ""));
    let failed = ledger.process(&key);
    assert!(!failed.success, "write to {fail_key} should fail");
    assert!(matches!(failed.rejection, Some(Rejection::Storage(_))));
    assert_eq!(failed.skills["internet"].points, 0);

    assert_eq!(ledger.store().get(keys::SKILLS).unwrap(), skills_before);
    assert_eq!(
        ledger.store().get(keys::ACHIEVEMENTS).unwrap(),
        achievements_before
    );
    assert!(!ledger.is_used(&key));

    ledger.store_mut().armed = false;
    let retried = ledger.process(&key);
    assert!(retried.success, "{}", retried.message);
    assert_eq!(ledger.skills().unwrap()["internet"].points, 10);
    assert_eq!(ledger.achievements().unwrap().len(), 1);
    assert!(ledger.is_used(&key));
}

#[test]
fn edge_achievements_write_failure_rolls_back_skills() {
    assert_late_write_failure_rolls_back(keys::ACHIEVEMENTS);
}

#[test]
fn edge_verified_keys_write_failure_rolls_back_progress() {
    assert_late_write_failure_rolls_back(keys::VERIFIED_KEYS);
}

#[test]
fn edge_attempt_log_write_failure_is_not_fatal() {
    let store = FlakyStore {
        inner: MemoryStore::new(),
        fail_key: keys::KEY_ATTEMPTS,
        armed: false,
    };
    let mut ledger = Ledger::open(store, LedgerConfig::default())
        .unwrap()
        .with_clock(FixedClock(NOW));
    ledger.store_mut().armed = true;

    let key = mint(AchievementClaim::new("internet-basics", NOW).with_entry("internet", 10, ""));
    assert!(ledger.process(&key).success);
    assert!(ledger.verification_log().unwrap().is_empty());
}
