// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Meeting URL normalization.
//!
//! Equivalent invites must hash to the same [`crate::ids::SessionId`]. Meeting
//! providers (Teams, Zoom, Meet) treat URLs as case-insensitive, so the whole
//! URL is lowercased before anything else. Kept intentionally conservative:
//! strip the fragment, drop known tracking params, trim a trailing slash on
//! the path. Everything else about the URL is preserved.

use url::Url;

const TRACKING_PARAMS: &[&str] =
    &["utm_source", "utm_medium", "utm_campaign", "utm_term", "utm_content", "fbclid", "gclid"];

/// Normalize a meeting URL so that equivalent invites produce identical strings.
///
/// Returns an empty string for blank input, matching the source controller's
/// behavior of treating an absent/blank URL as "cannot deduplicate" rather
/// than an error — callers should check for emptiness before hashing.
pub fn normalize_meeting_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let lowered = trimmed.to_lowercase();

    let Ok(parsed) = Url::parse(&lowered) else {
        // Not a well-formed URL — fall back to the lowercased, trimmed string
        // so dedup is still stable even for malformed input.
        return lowered;
    };

    let scheme = parsed.scheme();
    let authority = authority(&parsed);
    let path = parsed.path().trim_end_matches('/');

    let query = parsed.query().unwrap_or("");
    let filtered_query: Vec<&str> = query
        .split('&')
        .filter(|kv| !kv.is_empty())
        .filter(|kv| {
            let key = kv.split('=').next().unwrap_or("");
            !TRACKING_PARAMS.contains(&key)
        })
        .map(|kv| kv.trim_end_matches('/'))
        .collect();

    let mut out = format!("{scheme}://{authority}{path}");
    if !filtered_query.is_empty() {
        out.push('?');
        out.push_str(&filtered_query.join("&"));
    }
    out
}

fn authority(parsed: &Url) -> String {
    let host = parsed.host_str().unwrap_or_default();
    match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// Hosts that are allowed to trigger automatic bot scheduling. A meeting
/// whose join URL resolves to a host outside this set (or any subdomain of
/// one) is skipped during discovery.
pub fn is_allowed_platform_host(normalized_url: &str, allowed_domains: &[String]) -> bool {
    let Ok(parsed) = Url::parse(normalized_url) else { return false };
    let Some(host) = parsed.host_str() else { return false };
    allowed_domains
        .iter()
        .any(|domain| host == domain.as_str() || host.ends_with(&format!(".{domain}")))
}

#[cfg(test)]
#[path = "url_normalize_tests.rs"]
mod tests;
