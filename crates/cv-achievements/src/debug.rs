//! Debug monitor.
//!
//! Tracks the CV → platform → game → achievement flow as a ledger observer,
//! alongside a timestamped log, navigation history and the verified-key
//! listing.
//!
//! The monitor is a cheap handle over shared state: clone it, subscribe one
//! clone to the ledger, and read through the other.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;

use crate::config::DebugSettings;
use crate::error::Result;
use crate::key::decode;
use crate::ledger::{LedgerEvent, LedgerObserver};
use crate::storage::KeyValueStore;
use crate::time::{now_secs, secs_to_display, secs_to_rfc3339};

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowStep {
    Cv,
    Platform,
    Game,
    Achievement,
}

impl FlowStep {
    pub const ALL: [FlowStep; 4] = [
        FlowStep::Cv,
        FlowStep::Platform,
        FlowStep::Game,
        FlowStep::Achievement,
    ];

    pub fn title(self) -> &'static str {
        match self {
            FlowStep::Cv => "Student CV",
            FlowStep::Platform => "Game Platform",
            FlowStep::Game => "Game Level",
            FlowStep::Achievement => "Achievement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowStatus {
    Pending,
    Active,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowState {
    pub status: FlowStatus,
    pub data: Option<String>,
}

// ---------------------------------------------------------------------------
// Log, navigation, keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugLogEntry {
    pub time: String,
    pub message: String,
    pub level: LogLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationEntry {
    pub time: String,
    pub from: String,
    pub to: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyStatus {
    Verified,
    Invalid,
}

/// A verified key as shown in the keys tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyListing {
    pub game_id: String,
    pub status: KeyStatus,
    /// First 30 characters followed by `...`.
    pub preview: String,
    pub timestamp: Option<i64>,
}

impl KeyListing {
    /// Human-readable issuance time.
    pub fn added(&self) -> String {
        self.timestamp
            .map(secs_to_display)
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Describe each stored key; undecodable ones are listed as invalid.
pub fn key_listing(verified_keys: &[String]) -> Vec<KeyListing> {
    verified_keys
        .iter()
        .map(|key| {
            let preview = format!("{}...", key.chars().take(30).collect::<String>());
            match decode(key) {
                Ok(claim) => KeyListing {
                    game_id: claim.game_id,
                    status: KeyStatus::Verified,
                    preview,
                    timestamp: Some(claim.timestamp),
                },
                Err(_) => KeyListing {
                    game_id: "Unknown".to_string(),
                    status: KeyStatus::Invalid,
                    preview,
                    timestamp: None,
                },
            }
        })
        .collect()
}

/// Every stored value, parsed as JSON where possible.
pub fn storage_snapshot(store: &dyn KeyValueStore) -> Result<serde_json::Value> {
    let mut keys = store.keys()?;
    keys.sort();

    let mut snapshot = serde_json::Map::new();
    for key in keys {
        if let Some(raw) = store.get(&key)? {
            let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
            snapshot.insert(key, value);
        }
    }
    Ok(serde_json::Value::Object(snapshot))
}

// ---------------------------------------------------------------------------
// DebugMonitor
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct MonitorState {
    enabled: bool,
    visible: bool,
    log_to_console: bool,
    logs: Vec<DebugLogEntry>,
    navigation: Vec<NavigationEntry>,
    flow: BTreeMap<FlowStep, FlowState>,
}

impl MonitorState {
    fn new(enabled: bool, log_to_console: bool) -> Self {
        let flow = FlowStep::ALL
            .into_iter()
            .map(|step| {
                let status = if step == FlowStep::Cv {
                    FlowStatus::Active
                } else {
                    FlowStatus::Pending
                };
                (step, FlowState { status, data: None })
            })
            .collect();
        Self {
            enabled,
            visible: false,
            log_to_console,
            logs: Vec::new(),
            navigation: Vec::new(),
            flow,
        }
    }
}

/// Shared handle to the debug state.
#[derive(Debug, Clone)]
pub struct DebugMonitor {
    state: Rc<RefCell<MonitorState>>,
}

impl DebugMonitor {
    pub fn new(enabled: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(MonitorState::new(enabled, true))),
        }
    }

    pub fn from_settings(settings: &DebugSettings) -> Self {
        Self {
            state: Rc::new(RefCell::new(MonitorState::new(
                settings.enabled_by_default,
                settings.log_to_console,
            ))),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    pub fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    pub fn enable(&self) {
        self.state.borrow_mut().enabled = true;
        self.log("Debug mode initialized", LogLevel::Success);
    }

    /// Stop recording and hide. Already-recorded history is kept.
    pub fn disable(&self) {
        let mut state = self.state.borrow_mut();
        state.enabled = false;
        state.visible = false;
    }

    /// Enable a disabled monitor, otherwise flip visibility.
    pub fn toggle(&self) {
        if !self.is_enabled() {
            self.enable();
            return;
        }
        let mut state = self.state.borrow_mut();
        state.visible = !state.visible;
    }

    pub fn log(&self, message: impl Into<String>, level: LogLevel) {
        let mut state = self.state.borrow_mut();
        if !state.enabled {
            return;
        }
        let message = message.into();
        if state.log_to_console {
            match level {
                LogLevel::Warning => log::warn!("[CV Debug] {message}"),
                LogLevel::Error => log::error!("[CV Debug] {message}"),
                LogLevel::Info | LogLevel::Success => log::info!("[CV Debug] {message}"),
            }
        }
        state.logs.push(DebugLogEntry {
            time: secs_to_rfc3339(now_secs()),
            message,
            level,
        });
    }

    /// Record a navigation. Leaving the CV for the platform advances the flow.
    pub fn track_navigation(&self, from: &str, to: &str, data: serde_json::Value) {
        let mut state = self.state.borrow_mut();
        if !state.enabled {
            return;
        }

        if from == FlowStep::Cv.title() && to == FlowStep::Platform.title() {
            let games = data
                .get("completedGames")
                .and_then(|v| v.as_array())
                .map(|games| {
                    games
                        .iter()
                        .filter_map(|g| g.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "none".to_string());

            state.flow.insert(
                FlowStep::Cv,
                FlowState {
                    status: FlowStatus::Completed,
                    data: None,
                },
            );
            state.flow.insert(
                FlowStep::Platform,
                FlowState {
                    status: FlowStatus::Active,
                    data: Some(format!("Selected games: {games}")),
                },
            );
        }

        state.navigation.push(NavigationEntry {
            time: secs_to_rfc3339(now_secs()),
            from: from.to_string(),
            to: to.to_string(),
            data,
        });
        drop(state);

        self.log(format!("Navigation: {from} -> {to}"), LogLevel::Info);
    }

    /// Set a step's status; `data` replaces the step's detail when given.
    pub fn update_flow_state(&self, step: FlowStep, status: FlowStatus, data: Option<String>) {
        let mut state = self.state.borrow_mut();
        if !state.enabled {
            return;
        }
        if let Some(entry) = state.flow.get_mut(&step) {
            entry.status = status;
            if data.is_some() {
                entry.data = data;
            }
        }
    }

    pub fn flow_state(&self, step: FlowStep) -> Option<FlowState> {
        self.state.borrow().flow.get(&step).cloned()
    }

    pub fn logs(&self) -> Vec<DebugLogEntry> {
        self.state.borrow().logs.clone()
    }

    pub fn navigation(&self) -> Vec<NavigationEntry> {
        self.state.borrow().navigation.clone()
    }
}

impl LedgerObserver for DebugMonitor {
    fn on_event(&self, event: &LedgerEvent<'_>) {
        match event {
            LedgerEvent::Processed(result) => {
                let game = result.game_id.as_deref().unwrap_or("unknown game");
                if result.success {
                    self.update_flow_state(
                        FlowStep::Achievement,
                        FlowStatus::Completed,
                        Some(format!(
                            "{game}: {} new achievement(s)",
                            result.new_achievements.len()
                        )),
                    );
                    self.log(format!("Key for {game} accepted"), LogLevel::Success);
                } else {
                    self.update_flow_state(
                        FlowStep::Achievement,
                        FlowStatus::Error,
                        Some(result.message.clone()),
                    );
                    self.log(
                        format!("Key for {game} rejected: {}", result.message),
                        LogLevel::Error,
                    );
                }
            }
            LedgerEvent::Validated { game_id, valid, .. } => {
                let game = game_id.unwrap_or("unknown game");
                let level = if *valid {
                    LogLevel::Info
                } else {
                    LogLevel::Warning
                };
                let verdict = if *valid { "valid" } else { "invalid" };
                self.log(format!("Key for {game} is {verdict}"), level);
            }
        }
    }
}
