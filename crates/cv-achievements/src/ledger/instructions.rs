//! Instructions for making a redeemed key permanent.
//!
//! Redeemed keys live in the visitor's local state. To keep them, the
//! student adds the key to the bundled `js/keys.js` list in their CV
//! repository so it is replayed on every page load.

/// Placeholder used when the GitHub username is unknown.
pub const USERNAME_PLACEHOLDER: &str = "YOUR-USERNAME";

const REPOSITORY: &str = "Student-CV-Template";

/// Plain-text steps for adding `key` to the repository's key list.
pub fn permanent_save_instructions(key: &str, github_username: Option<&str>) -> String {
    let user = github_username
        .filter(|u| !u.is_empty())
        .unwrap_or(USERNAME_PLACEHOLDER);

    format!(
        "Success! Make your achievement permanent by adding it to js/keys.js.

Option 1: GitHub web interface
  1. Open https://github.com/{user}/{REPOSITORY}/blob/main/js/keys.js
  2. Click the pencil icon to edit
  3. Add this line to the achievementKeys array:
       \"{key}\",
  4. Commit the changes

Option 2: Command line
  git clone https://github.com/{user}/{REPOSITORY}.git
  cd {REPOSITORY}
  echo '  \"{key}\",' >> js/keys.js
  git add js/keys.js
  git commit -m \"Added new achievement key\"
  git push origin main

Option 3: Editor
  1. Open js/keys.js in your project
  2. Add this line to the achievementKeys array:
       \"{key}\",
  3. Save, commit and push
"
    )
}
