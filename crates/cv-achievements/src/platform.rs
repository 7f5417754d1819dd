//! Links to the learning-games platform.

use url::Url;

use crate::error::{LedgerError, Result};

/// Build the URL that sends a student to the platform.
///
/// The platform reads `studentId`, `completedGames` (a JSON array of game
/// ids) and `returnUrl` from the query string.
pub fn platform_redirect_url(
    platform_url: &str,
    student_id: &str,
    completed_games: &[String],
    return_url: &str,
) -> Result<Url> {
    let mut url = Url::parse(platform_url)
        .map_err(|e| LedgerError::InvalidUrl(format!("{platform_url}: {e}")))?;
    let games = serde_json::to_string(completed_games)
        .map_err(|e| LedgerError::SerializationError(e.to_string()))?;

    url.query_pairs_mut()
        .append_pair("studentId", student_id)
        .append_pair("completedGames", &games)
        .append_pair("returnUrl", return_url);
    Ok(url)
}
