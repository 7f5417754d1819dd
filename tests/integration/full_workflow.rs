//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle against a file-backed store:
//! 1. Bootstrap the state directory from a GitHub Pages URL
//! 2. Replay the bundled key list
//! 3. Hit prerequisite gating, then satisfy it
//! 4. Redeem a key from the page URL
//! 5. Reopen the ledger and confirm everything persisted
//! 6. Build the platform link from the completed games

use std::collections::HashMap;

use cv_achievements::debug::{key_listing, FlowStatus, FlowStep, KeyStatus};
use cv_achievements::intake::{parse_key_list, process_bundled_keys, process_page_url};
use cv_achievements::ledger::{completed_games, newest_first};
use cv_achievements::profile::load_personal_info;
use cv_achievements::{
    encode, initialize_app, platform_redirect_url, signed, AchievementClaim, DebugMonitor,
    FileStore, FixedClock, Ledger, LedgerConfig, Rejection,
};

const NOW: i64 = 1_750_000_000;
const DAY: i64 = 24 * 60 * 60;

fn key(game: &str, issued: i64, awards: &[(&str, i64, &str)]) -> String {
    let mut claim = AchievementClaim::new(game, issued);
    for (skill, points, description) in awards {
        claim = claim.with_entry(*skill, *points, *description);
    }
    encode(&signed(claim, &LedgerConfig::default().secret).unwrap())
}

fn open(dir: &std::path::Path) -> Ledger<FileStore> {
    let store = FileStore::new(dir).expect("store should open");
    Ledger::open(store, LedgerConfig::default())
        .expect("ledger should open")
        .with_clock(FixedClock(NOW))
}

#[test]
fn full_workflow_bootstrap_to_platform_link() {
    let dir = tempfile::tempdir().unwrap();

    // ── Step 1: Bootstrap ───────────────────────────────────────────────
    let mut store = FileStore::new(dir.path()).unwrap();
    let page = "https://octocat.github.io/Student-CV-Template/";
    assert!(initialize_app(&mut store, Some(page)).unwrap());
    assert!(!initialize_app(&mut store, Some(page)).unwrap());

    let info = load_personal_info(&store).unwrap();
    assert_eq!(info.github_username.as_deref(), Some("octocat"));

    let mut ledger = open(dir.path());
    assert_eq!(ledger.student_id(), "octocat");

    let monitor = DebugMonitor::new(true);
    ledger.subscribe(monitor.clone());

    // ── Step 2: Bundled keys ────────────────────────────────────────────
    let internet = key(
        "internet-basics",
        NOW - 3 * DAY,
        &[("internet", 30, "Mastered HTTP"), ("networking", 5, "")],
    );
    let keys_js = format!(
        "const achievementKeys = [\n  \"{internet}\",\n  \"\",\n  \"not base64 at all\",\n];\n"
    );
    let summary = process_bundled_keys(&mut ledger, parse_key_list(&keys_js));
    assert_eq!(summary.processed(), 2);
    assert_eq!(summary.succeeded(), 1);

    let skills = ledger.skills().unwrap();
    assert_eq!(skills["internet"].points, 30);
    assert_eq!(skills["internet"].level, 2);
    assert_eq!(skills["networking"].level, 0);

    let records = ledger.achievements().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Internet Basics Level 2");
    assert_eq!(records[0].description, "Mastered HTTP");
    assert_eq!(records[0].icon, "🌐");

    // ── Step 3: Prerequisite gating ─────────────────────────────────────
    let css = key("css-styling", NOW - DAY, &[("css", 60, "Flexbox")]);
    let gated = ledger.process(&css);
    assert!(!gated.success);
    assert!(matches!(
        gated.rejection,
        Some(Rejection::PrerequisitesNotMet { ref missing, .. }) if missing == &["html-fundamentals"]
    ));
    assert_eq!(ledger.skills().unwrap()["css"].points, 0);
    assert_eq!(
        monitor.flow_state(FlowStep::Achievement).unwrap().status,
        FlowStatus::Error
    );

    let html = key("html-fundamentals", NOW - 2 * DAY, &[("html", 10, "Semantic tags")]);
    assert!(ledger.process(&html).success);

    // The gated key was never marked used, so it can be retried.
    let retried = ledger.process(&css);
    assert!(retried.success, "{}", retried.message);
    assert_eq!(retried.new_achievements.len(), 1);
    assert_eq!(retried.new_achievements[0].title, "CSS Level 3");
    assert_eq!(
        monitor.flow_state(FlowStep::Achievement).unwrap().status,
        FlowStatus::Completed
    );

    // ── Step 4: Key from the page URL ───────────────────────────────────
    let js = key("javascript-basics", NOW, &[("js", 12, "Loops")]);
    let url = format!("{page}?key={js}");
    let from_url = process_page_url(&mut ledger, &url).unwrap();
    // javascript-basics requires html-fundamentals, whose skill is now level 1.
    assert!(from_url.success, "{}", from_url.message);
    assert_eq!(from_url.skills["js"].level, 1);

    let log = ledger.verification_log().unwrap();
    assert_eq!(log.len(), 6);
    assert_eq!(log.iter().filter(|e| e.success).count(), 4);
    drop(ledger);

    // ── Step 5: Reopen and confirm persistence ──────────────────────────
    let mut ledger = open(dir.path());
    assert_eq!(ledger.verified_keys().len(), 4);
    let replay = ledger.process(&internet);
    assert_eq!(replay.rejection, Some(Rejection::AlreadyUsed));

    let history = newest_first(&ledger.achievements().unwrap());
    let dates: Vec<&str> = history.iter().map(|r| r.date.as_str()).collect();
    assert_eq!(
        dates,
        vec!["2025-06-15", "2025-06-14", "2025-06-13", "2025-06-12"]
    );

    let listing = key_listing(ledger.verified_keys());
    assert!(listing.iter().all(|k| k.status == KeyStatus::Verified));

    // ── Step 6: Platform link ───────────────────────────────────────────
    let games = completed_games(ledger.verified_keys());
    assert_eq!(
        games,
        vec![
            "internet-basics",
            "html-fundamentals",
            "css-styling",
            "javascript-basics"
        ]
    );

    let link = platform_redirect_url(
        &ledger.config().platform_url,
        ledger.student_id(),
        &games,
        page,
    )
    .unwrap();
    let params: HashMap<_, _> = link.query_pairs().into_owned().collect();
    assert_eq!(params["studentId"], "octocat");
    assert!(params["completedGames"].contains("css-styling"));
    assert_eq!(params["returnUrl"], page);
}

#[test]
fn full_workflow_html_before_internet() {
    let dir = tempfile::tempdir().unwrap();
    let mut ledger = open(dir.path());

    let html = key("html-fundamentals", NOW, &[("html", 15, "Forms")]);
    let internet = key("internet-basics", NOW, &[("internet", 10, "DNS")]);

    let first = ledger.process(&html);
    assert_eq!(
        first.message,
        "Prerequisites not met for this achievement. Complete required courses first."
    );
    assert!(ledger.verified_keys().is_empty());
    assert!(ledger.achievements().unwrap().is_empty());

    assert!(ledger.process(&internet).success);
    let second = ledger.process(&html);
    assert!(second.success);
    assert_eq!(second.skills["html"].level, 1);
    assert_eq!(second.new_achievements[0].title, "HTML Level 1");

    let log = ledger.verification_log().unwrap();
    assert_eq!(log.len(), 3);
    assert!(!log[0].success);
    assert!(log[0].reason.starts_with("Prerequisites not met"));
}
