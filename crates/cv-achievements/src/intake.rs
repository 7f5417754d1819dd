//! Startup key intake: the bundled key list and the page's `key` parameter.

use crate::ledger::{key_fragment, Ledger, ProcessResult};
use crate::storage::KeyValueStore;

/// Outcome of replaying a list of keys.
#[derive(Debug, Clone, Default)]
pub struct IntakeSummary {
    pub results: Vec<ProcessResult>,
}

impl IntakeSummary {
    pub fn processed(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.processed() - self.succeeded()
    }
}

/// Process bundled keys in order. Blank entries are skipped and each key
/// stands alone: a failure never stops the ones after it.
pub fn process_bundled_keys<S, I, K>(ledger: &mut Ledger<S>, keys: I) -> IntakeSummary
where
    S: KeyValueStore,
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    let mut summary = IntakeSummary::default();
    for key in keys {
        let key = key.as_ref().trim();
        if key.is_empty() {
            continue;
        }
        let result = ledger.process(key);
        if result.success {
            log::info!("processed bundled key {}", key_fragment(key));
        } else {
            log::info!(
                "bundled key {} not applied: {}",
                key_fragment(key),
                result.message
            );
        }
        summary.results.push(result);
    }
    summary
}

/// Parse a key list file.
///
/// Accepts one key per line, or the `js/keys.js` array form where each key
/// is a quoted string followed by a comma. Lines that are neither (array
/// brackets, comments, declarations) are skipped.
pub fn parse_key_list(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim().trim_end_matches(',').trim();
            let unquoted = ['"', '\'', '`'].iter().find_map(|&q| {
                line.strip_prefix(q)
                    .and_then(|rest| rest.strip_suffix(q))
            });
            match unquoted {
                Some(key) => Some(key.trim().to_string()),
                None if !line.is_empty() && line.chars().all(is_base64_char) => {
                    Some(line.to_string())
                }
                None => None,
            }
        })
        .filter(|key| !key.is_empty())
        .collect()
}

fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=')
}

/// Extract the `key` query parameter from a page URL.
///
/// Form decoding turns an unescaped `+` into a space; base64 never holds
/// spaces, so they are mapped back.
pub fn key_from_page_url(page_url: &str) -> Option<String> {
    let url = url::Url::parse(page_url).ok()?;
    let (_, value) = url.query_pairs().find(|(name, _)| name == "key")?;
    let key = value.trim().replace(' ', "+");
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

/// Process the page's `key` parameter, if it carries one.
pub fn process_page_url<S: KeyValueStore>(
    ledger: &mut Ledger<S>,
    page_url: &str,
) -> Option<ProcessResult> {
    let key = key_from_page_url(page_url)?;
    log::debug!("processing key from page URL");
    Some(ledger.process(&key))
}
