//! URL extraction from printable strings.

use crate::config::UrlConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    // Permitted characters: RFC 3986 unreserved, reserved and percent-escapes.
    Regex::new(r"(?i)https?://[\w\-.:/%?#\[\]@!$&'()*+,;=]+").expect("valid URL regex")
});

/// Deduplicated URLs in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlScan {
    pub urls: Vec<String>,
    /// Set when scanning stopped at the raw-match budget.
    pub truncated: bool,
}

/// Find URLs in each token.
///
/// Raw matches accumulate until the budget is reached; the token that crosses
/// it is kept whole, so the overshoot is bounded by one token's matches.
pub fn extract_urls<'a, I>(tokens: I, cfg: &UrlConfig) -> UrlScan
where
    I: IntoIterator<Item = &'a str>,
{
    let mut raw: Vec<&'a str> = Vec::new();
    let mut truncated = false;
    for token in tokens {
        raw.extend(URL_RE.find_iter(token).map(|m| m.as_str()));
        if raw.len() >= cfg.max_raw_matches {
            truncated = true;
            break;
        }
    }
    UrlScan {
        urls: dedup_preserving_order(raw),
        truncated,
    }
}

fn dedup_preserving_order<'a>(items: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|u| seen.insert(*u))
        .map(str::to_string)
        .collect()
}
