//! Student profile and first-run bootstrap.
//!
//! The student identifier that bound keys are checked against is resolved
//! from the stored profile: the GitHub username when known, then a stored
//! `studentId`, then `"unknown"`.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::{keys, read_json, write_json, KeyValueStore};

pub const DEFAULT_NAME: &str = "Student Name";
pub const DEFAULT_TITLE: &str = "Web Development Student";
pub const DEFAULT_ABOUT: &str =
    "I am a student learning web development through an innovative gamified learning platform.";

/// Identifier used when no student can be resolved.
pub const UNKNOWN_STUDENT: &str = "unknown";

/// Personal details shown at the top of the CV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_about")]
    pub about: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_username: Option<String>,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_about() -> String {
    DEFAULT_ABOUT.to_string()
}

impl Default for PersonalInfo {
    fn default() -> Self {
        Self {
            name: default_name(),
            title: default_title(),
            about: default_about(),
            github_username: None,
        }
    }
}

impl PersonalInfo {
    /// Defaults, named after the GitHub user when one is known.
    pub fn for_github_user(username: Option<&str>) -> Self {
        match username {
            Some(user) => Self {
                name: user.to_string(),
                github_username: Some(user.to_string()),
                ..Self::default()
            },
            None => Self::default(),
        }
    }
}

/// Load the stored profile, or defaults when none is stored.
pub fn load_personal_info(store: &dyn KeyValueStore) -> Result<PersonalInfo> {
    Ok(read_json(store, keys::PERSONAL_INFO)?.unwrap_or_default())
}

pub fn save_personal_info(store: &mut dyn KeyValueStore, info: &PersonalInfo) -> Result<()> {
    write_json(store, keys::PERSONAL_INFO, info)
}

/// Extract `{user}` from a GitHub Pages URL (`https://{user}.github.io/...`).
pub fn github_username_from_url(page_url: &str) -> Option<String> {
    let url = url::Url::parse(page_url).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.to_ascii_lowercase();
    let user = host.strip_suffix(".github.io")?;
    if user.is_empty() || user.contains('.') {
        return None;
    }
    Some(user.to_string())
}

/// Resolve the current student's identifier.
pub fn resolve_student_id(store: &dyn KeyValueStore) -> Result<String> {
    // A corrupt profile should not block key redemption.
    let info: Option<PersonalInfo> = read_json(store, keys::PERSONAL_INFO).unwrap_or_else(|e| {
        log::warn!("ignoring unreadable personal info: {e}");
        None
    });
    if let Some(user) = info
        .and_then(|i| i.github_username)
        .filter(|u| !u.is_empty())
    {
        return Ok(user);
    }
    if let Some(id) = store.get(keys::STUDENT_ID)?.filter(|s| !s.is_empty()) {
        return Ok(id);
    }
    Ok(UNKNOWN_STUDENT.to_string())
}

/// Seed a fresh store: profile, empty achievement and key lists, and the
/// `appInitialized` sentinel.
///
/// Returns `false` without touching anything when the sentinel is present.
pub fn initialize_app(store: &mut dyn KeyValueStore, page_url: Option<&str>) -> Result<bool> {
    if store.contains(keys::APP_INITIALIZED)? {
        return Ok(false);
    }

    let github_username = page_url.and_then(github_username_from_url);

    if !store.contains(keys::PERSONAL_INFO)? {
        save_personal_info(store, &PersonalInfo::for_github_user(github_username.as_deref()))?;
    }
    if !store.contains(keys::ACHIEVEMENTS)? {
        store.set(keys::ACHIEVEMENTS, "[]")?;
    }
    if !store.contains(keys::VERIFIED_KEYS)? {
        store.set(keys::VERIFIED_KEYS, "[]")?;
    }
    store.set(keys::APP_INITIALIZED, "true")?;

    log::info!(
        "application initialized for GitHub user {}",
        github_username.as_deref().unwrap_or("<none>")
    );
    Ok(true)
}
