//! Resolution request construction and re-parsing
//!
//! Songs carry the exact query they were last resolved with
//! (`request_url`) so a later session can replay it without
//! reconstructing parameters. Older persisted entries may still use the
//! upstream-native query names (`msg`/`word`, `n`, `q`); parsing
//! tolerates those and maps them onto the canonical form.

use mellow_core::Platform;
use std::fmt::Write as _;

/// Parameters for one resolution (or search) call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Target platform
    pub platform: Platform,

    /// Free-text search term, not yet percent-encoded
    pub term: String,

    /// Zero-based result position; `None` means search-only
    pub index: Option<usize>,

    /// Audio-quality tier, meaningful for `qq` only
    pub quality: Option<u32>,
}

impl ResolveRequest {
    /// Request that searches `platform` for `term` without resolving
    pub fn search(platform: Platform, term: impl Into<String>) -> Self {
        Self {
            platform,
            term: term.into(),
            index: None,
            quality: None,
        }
    }

    /// Request that resolves result `index` of a search for `term`
    pub fn detail(platform: Platform, term: impl Into<String>, index: usize) -> Self {
        Self {
            platform,
            term: term.into(),
            index: Some(index),
            quality: None,
        }
    }

    /// Attach a quality tier (kept only for `qq` requests)
    pub fn with_quality(mut self, quality: Option<u32>) -> Self {
        self.quality = match self.platform {
            Platform::Qq => quality,
            Platform::Wy => None,
        };
        self
    }

    /// Render the canonical query string, e.g.
    /// `?platform=qq&term=respect&index=0&quality=12`
    pub fn query_string(&self) -> String {
        let mut query = format!(
            "?platform={}&term={}",
            self.platform,
            urlencoding::encode(&self.term)
        );
        if let Some(index) = self.index {
            let _ = write!(query, "&index={index}");
        }
        if let Some(quality) = self.quality {
            let _ = write!(query, "&quality={quality}");
        }
        query
    }

    /// Re-parse a stored request URL
    ///
    /// Accepts the canonical form as well as the legacy upstream-native
    /// forms (`/wydg/?msg=..&n=..`, `/qqdg/?word=..&n=..&q=..`).
    /// Returns `None` when neither the platform nor a non-empty term
    /// can be recovered; callers then rebuild from the song's own
    /// search context.
    pub fn parse(stored: &str) -> Option<Self> {
        let (path, query) = match stored.split_once('?') {
            Some((path, query)) => (path, query),
            None => ("", stored),
        };

        let mut platform = match path {
            p if p.contains("wydg") => Some(Platform::Wy),
            p if p.contains("qqdg") => Some(Platform::Qq),
            _ => None,
        };
        let mut term = None;
        let mut index = None;
        let mut quality = None;
        // Legacy `n` is one-based; canonical `index` is zero-based
        let mut one_based_index = false;

        for pair in query.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "platform" => {
                    platform = match value {
                        "wy" => Some(Platform::Wy),
                        "qq" => Some(Platform::Qq),
                        _ => platform,
                    };
                }
                "term" | "msg" | "word" => {
                    let decoded = urlencoding::decode(value)
                        .map(|s| s.into_owned())
                        .unwrap_or_else(|_| value.to_string());
                    if !decoded.trim().is_empty() {
                        term = Some(decoded);
                    }
                }
                "index" => index = value.parse().ok(),
                "n" => {
                    index = value.parse().ok();
                    one_based_index = true;
                }
                "quality" | "q" => quality = value.parse().ok(),
                _ => {}
            }
        }

        if one_based_index {
            index = index.map(|n: usize| n.saturating_sub(1));
        }

        let request = Self {
            platform: platform?,
            term: term?,
            index,
            quality: None,
        };
        Some(request.with_quality(quality))
    }
}
