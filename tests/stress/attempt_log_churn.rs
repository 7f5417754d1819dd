//! Stress test: attempt-log eviction and verified-key growth.
//!
//! The attempt log is capped and evicts oldest-first; the verified-key set
//! grows without bound and must keep rejecting replays.

use cv_achievements::{
    encode, signed, AchievementClaim, FileStore, FixedClock, Ledger, LedgerConfig, MemoryStore,
};

const NOW: i64 = 1_750_000_000;

fn ledger() -> Ledger<MemoryStore> {
    Ledger::open(MemoryStore::new(), LedgerConfig::default())
        .expect("ledger should open")
        .with_clock(FixedClock(NOW))
}

fn mint(nonce: i64) -> String {
    let claim =
        AchievementClaim::new("internet-basics", NOW - nonce).with_entry("internet", 1, "tick");
    encode(&signed(claim, &LedgerConfig::default().secret).unwrap())
}

#[test]
fn stress_sixty_attempts_keep_last_fifty() {
    let mut ledger = ledger();

    // Distinct ten-character prefixes so each entry is identifiable.
    let keys: Vec<String> = (0..60).map(|i| format!("attempt-{i:02}!garbage")).collect();
    for key in &keys {
        assert!(!ledger.process(key).success);
    }

    let log = ledger.verification_log().unwrap();
    assert_eq!(log.len(), 50);
    assert_eq!(log[0].key_fragment, "attempt-10...");
    assert_eq!(log[49].key_fragment, "attempt-59...");
    assert!(log.iter().all(|e| e.reason == "Invalid key format"));
}

#[test]
fn stress_mixed_outcomes_preserve_order() {
    let mut ledger = ledger();

    for i in 0..60 {
        if i % 2 == 0 {
            assert!(ledger.process(&mint(i)).success);
        } else {
            assert!(!ledger.validate(&format!("bogus-{i:02}")));
        }
    }

    let log = ledger.verification_log().unwrap();
    assert_eq!(log.len(), 50);
    // Entries 10..60 survive; even attempts were accepted.
    for (offset, entry) in log.iter().enumerate() {
        let attempt = offset + 10;
        assert_eq!(entry.success, attempt % 2 == 0, "attempt {attempt}");
    }
    assert_eq!(ledger.verified_keys().len(), 30);
}

#[test]
fn stress_custom_capacity() {
    let config = LedgerConfig {
        attempt_log_capacity: 5,
        ..LedgerConfig::default()
    };
    let mut ledger = Ledger::open(MemoryStore::new(), config)
        .unwrap()
        .with_clock(FixedClock(NOW));

    for i in 0..12 {
        ledger.process(&format!("k{i:02}"));
    }
    let log = ledger.verification_log().unwrap();
    assert_eq!(log.len(), 5);
    assert_eq!(log[0].key_fragment, "k07...");
}

#[test]
fn stress_500_keys_then_replay_all() {
    let mut ledger = ledger();
    let keys: Vec<String> = (0..500).map(mint).collect();

    for key in &keys {
        assert!(ledger.process(key).success);
    }
    assert_eq!(ledger.verified_keys().len(), 500);
    assert_eq!(ledger.skills().unwrap()["internet"].points, 500);
    assert_eq!(ledger.skills().unwrap()["internet"].level, 5);

    for key in &keys {
        let replay = ledger.process(key);
        assert_eq!(replay.message, "Key already used");
    }
    assert_eq!(ledger.skills().unwrap()["internet"].points, 500);
    assert_eq!(ledger.verification_log().unwrap().len(), 50);
}

#[test]
fn stress_file_store_churn_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let open = || {
        Ledger::open(FileStore::new(dir.path()).unwrap(), LedgerConfig::default())
            .unwrap()
            .with_clock(FixedClock(NOW))
    };

    let mut ledger = open();
    for i in 0..60 {
        ledger.process(&mint(i));
    }
    drop(ledger);

    let mut ledger = open();
    assert_eq!(ledger.verified_keys().len(), 60);
    assert_eq!(ledger.verification_log().unwrap().len(), 50);
    assert!(!ledger.process(&mint(0)).success);
    assert!(ledger.process(&mint(60)).success);
}
