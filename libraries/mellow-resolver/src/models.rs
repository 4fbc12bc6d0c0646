//! Wire shapes and per-platform normalization
//!
//! The upstream payloads drift: `wy` search entries may carry
//! `name`/`singer` or `song`/`author`, `qq` search may answer with a
//! bare object instead of a one-element array, and lyric lines use
//! `name` or `text` for their line content. Everything is normalized
//! here, immediately on ingestion; the rest of the system only ever
//! sees canonical [`Song`] and [`ResolvedMedia`] values.

use crate::error::{ResolverError, Result};
use crate::request::ResolveRequest;
use mellow_core::{LyricLine, Platform, Song, SongDetails};
use serde::Deserialize;
use serde_json::Value;

/// Upstream success code
const CODE_OK: i64 = 200;

/// Proxy response envelope
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope {
    /// Whether the proxy reached the upstream at all
    #[serde(default)]
    pub success: bool,

    /// Raw upstream payload
    #[serde(default)]
    pub data: Value,

    /// Proxy-level error text, present when `success` is false
    #[serde(default)]
    pub error: Option<String>,
}

/// Playable media produced by one successful resolution
///
/// Identity fields are deliberately absent: a resolution never changes
/// which song a reference points at, only its resolved state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    /// Validated, absolute audio URL
    pub url: String,

    /// Artwork URL
    pub cover: Option<String>,

    /// Timed lyric lines (`qq` never provides any)
    pub lyrics: Vec<LyricLine>,

    /// Platform-specific metadata (`qq` only)
    pub details: Option<SongDetails>,
}

fn field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| value.get(*k))
}

/// String out of a loosely typed upstream field (string or number)
fn loose_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    field(value, keys).and_then(loose_string)
}

fn upstream_code(data: &Value) -> i64 {
    data.get("code").and_then(Value::as_i64).unwrap_or(-1)
}

fn upstream_message(data: &Value) -> String {
    string_field(data, &["msg", "message", "error"])
        .unwrap_or_else(|| "upstream request failed".to_string())
}

/// Check the upstream `code` field, turning anything but 200 into an error
pub(crate) fn check_code(data: &Value) -> Result<()> {
    let code = upstream_code(data);
    if code == CODE_OK {
        Ok(())
    } else {
        Err(ResolverError::Api {
            code,
            message: upstream_message(data),
        })
    }
}

/// Normalize one platform's search payload into song references
///
/// Each reference is stamped with its `search_index` and a reusable
/// canonical `request_url` so it can be resolved later without
/// reconstructing parameters.
pub(crate) fn normalize_search(platform: Platform, data: &Value, term: &str) -> Vec<Song> {
    let entries: Vec<&Value> = match data.get("data") {
        Some(Value::Array(items)) => items.iter().collect(),
        // qq answers a single match as a bare object
        Some(obj @ Value::Object(_)) if platform == Platform::Qq => vec![obj],
        _ => Vec::new(),
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let name = match platform {
                Platform::Wy => string_field(entry, &["name", "song"])?,
                Platform::Qq => string_field(entry, &["song", "name"])?,
            };
            let singer = match platform {
                Platform::Wy => string_field(entry, &["singer", "author"]),
                Platform::Qq => string_field(entry, &["singer"]),
            }
            .unwrap_or_default();

            let mut song = Song::new(name, singer, platform);
            song.search_term = Some(term.to_string());
            song.search_index = Some(index);
            song.request_url = Some(ResolveRequest::detail(platform, term, index).query_string());
            song.cover = string_field(entry, &["cover", "img", "pic"]);
            Some(song)
        })
        .collect()
}

/// Normalize a detail payload into playable media
///
/// The audio URL must parse as an absolute URL; a missing or malformed
/// one is a validation failure subject to the caller's retry policy.
pub(crate) fn normalize_media(platform: Platform, data: &Value) -> Result<ResolvedMedia> {
    check_code(data)?;

    match platform {
        Platform::Wy => {
            let url = validate_audio_url(string_field(data, &["mp3", "url"]))?;
            let lyrics = data
                .get("lyric")
                .and_then(Value::as_array)
                .map(|lines| {
                    lines
                        .iter()
                        .filter_map(|line| {
                            Some(LyricLine {
                                time: string_field(line, &["time"])?,
                                text: string_field(line, &["name", "text"])?,
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();

            Ok(ResolvedMedia {
                url,
                cover: string_field(data, &["img", "cover"]),
                lyrics,
                details: None,
            })
        }
        Platform::Qq => {
            let detail = data
                .get("data")
                .filter(|d| d.is_object())
                .ok_or_else(|| ResolverError::Parse("qq detail payload missing data".into()))?;
            let url = validate_audio_url(string_field(detail, &["url"]))?;

            Ok(ResolvedMedia {
                url,
                cover: string_field(detail, &["cover"]),
                // qq does not provide timed lyrics
                lyrics: Vec::new(),
                details: Some(SongDetails {
                    pay: string_field(detail, &["pay"]),
                    time: string_field(detail, &["time"]),
                    bpm: string_field(detail, &["bpm"]),
                    quality: string_field(detail, &["quality"]),
                    interval: string_field(detail, &["interval"]),
                    size: string_field(detail, &["size"]),
                    kbps: string_field(detail, &["kbps"]),
                }),
            })
        }
    }
}

fn validate_audio_url(url: Option<String>) -> Result<String> {
    let url = url.ok_or_else(|| ResolverError::InvalidAudioUrl("missing".into()))?;
    match reqwest::Url::parse(&url) {
        Ok(_) => Ok(url),
        Err(_) => Err(ResolverError::InvalidAudioUrl(url)),
    }
}
