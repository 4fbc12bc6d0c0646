//! Domain types for songs and lyrics

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream music platform
///
/// Each platform has its own response shapes and lyric availability;
/// the serialized form (`"wy"` / `"qq"`) matches the wire protocol and
/// the persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// NetEase-style provider
    Wy,

    /// Tencent-style provider
    Qq,
}

impl Platform {
    /// Wire name of the platform (`"wy"` or `"qq"`)
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Wy => "wy",
            Platform::Qq => "qq",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single timed lyric line
///
/// Timestamps are kept in their upstream `minutes:seconds` string form
/// (seconds may carry a fractional component) and parsed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricLine {
    /// Timestamp string, e.g. `"01:23.45"`
    pub time: String,

    /// Lyric text for this line
    pub text: String,
}

/// Platform-specific metadata, present only for `qq` songs
///
/// Upstream sends these fields in loosely typed form; they are
/// normalized to display strings at the resolution boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDetails {
    /// Pay type (free / VIP / album-only)
    pub pay: Option<String>,

    /// Release or publish time
    pub time: Option<String>,

    /// Beats per minute
    pub bpm: Option<String>,

    /// Quality tier label
    pub quality: Option<String>,

    /// Track duration
    pub interval: Option<String>,

    /// File size
    pub size: Option<String>,

    /// Bitrate
    pub kbps: Option<String>,
}

/// The central song entity
///
/// Created as an unresolved reference at search time, replaced by value
/// with a resolved form once a playable URL has been obtained. Two
/// songs are **the same song** iff `name`, `singer`, and `platform` all
/// match; resolution state never participates in identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    /// Track title (identity)
    pub name: String,

    /// Artist name (identity)
    pub singer: String,

    /// Upstream platform (identity)
    pub platform: Platform,

    /// Playable audio URL, present once resolved
    #[serde(default)]
    pub url: Option<String>,

    /// Artwork URL, present once resolved
    #[serde(default)]
    pub cover: Option<String>,

    /// Timed lyric lines, empty if the platform provides none
    #[serde(default)]
    pub lyrics: Vec<LyricLine>,

    /// Platform-specific metadata (`qq` only)
    #[serde(default)]
    pub details: Option<SongDetails>,

    /// Search term this song was found with, kept for re-resolution
    #[serde(default)]
    pub search_term: Option<String>,

    /// Zero-based position in the search results, kept for re-resolution
    #[serde(default)]
    pub search_index: Option<usize>,

    /// Audio-quality tier used for the last resolution (`qq` only)
    #[serde(default)]
    pub quality: Option<u32>,

    /// The exact resolution query used last time, reusable verbatim
    #[serde(default)]
    pub request_url: Option<String>,
}

impl Song {
    /// Create an unresolved song reference
    pub fn new(name: impl Into<String>, singer: impl Into<String>, platform: Platform) -> Self {
        Self {
            name: name.into(),
            singer: singer.into(),
            platform,
            url: None,
            cover: None,
            lyrics: Vec::new(),
            details: None,
            search_term: None,
            search_index: None,
            quality: None,
            request_url: None,
        }
    }

    /// Identity predicate: same `(name, singer, platform)` triple
    ///
    /// All collection membership, deduplication, and propagation checks
    /// go through this, never through full value equality.
    pub fn same_song(&self, other: &Song) -> bool {
        self.name == other.name && self.singer == other.singer && self.platform == other.platform
    }

    /// Identity key for derived lookup indexes
    pub fn identity_key(&self) -> String {
        // U+1F keeps "a-b" / "c" and "a" / "b-c" pairs distinct
        format!(
            "{}\u{1f}{}\u{1f}{}",
            self.name, self.singer, self.platform
        )
    }

    /// Whether this song can be handed to the audio element as-is
    ///
    /// `qq` URLs have short or single-use validity upstream, so a `qq`
    /// song always goes through a fresh resolution even when it still
    /// carries a URL.
    pub fn is_directly_playable(&self) -> bool {
        self.url.is_some() && self.platform != Platform::Qq
    }

    /// Fallback search term when none was recorded: `"name singer"`
    pub fn default_search_term(&self) -> String {
        format!("{} {}", self.name, self.singer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_song(name: &str, singer: &str, platform: Platform) -> Song {
        Song::new(name, singer, platform)
    }

    #[test]
    fn identity_ignores_resolution_state() {
        let placeholder = make_song("Respect", "Aretha Franklin", Platform::Wy);
        let mut resolved = placeholder.clone();
        resolved.url = Some("https://cdn.example.com/a.mp3".to_string());
        resolved.lyrics = vec![LyricLine {
            time: "00:01".to_string(),
            text: "R-E-S-P-E-C-T".to_string(),
        }];

        assert!(placeholder.same_song(&resolved));
    }

    #[test]
    fn identity_distinguishes_platforms() {
        let wy = make_song("Respect", "Aretha Franklin", Platform::Wy);
        let qq = make_song("Respect", "Aretha Franklin", Platform::Qq);

        assert!(!wy.same_song(&qq));
        assert_ne!(wy.identity_key(), qq.identity_key());
    }

    #[test]
    fn identity_key_separator_prevents_collisions() {
        let a = make_song("a-b", "c", Platform::Wy);
        let b = make_song("a", "b-c", Platform::Wy);

        assert_ne!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn qq_song_is_never_directly_playable() {
        let mut song = make_song("Song", "Singer", Platform::Qq);
        song.url = Some("https://cdn.example.com/a.mp3".to_string());
        assert!(!song.is_directly_playable());

        let mut wy = make_song("Song", "Singer", Platform::Wy);
        assert!(!wy.is_directly_playable());
        wy.url = Some("https://cdn.example.com/a.mp3".to_string());
        assert!(wy.is_directly_playable());
    }

    #[test]
    fn platform_serializes_to_wire_name() {
        assert_eq!(serde_json::to_string(&Platform::Wy).unwrap(), "\"wy\"");
        assert_eq!(serde_json::to_string(&Platform::Qq).unwrap(), "\"qq\"");
    }

    #[test]
    fn song_round_trips_with_camel_case_fields() {
        let mut song = make_song("Song", "Singer", Platform::Qq);
        song.request_url = Some("?platform=qq&term=song&index=0".to_string());
        song.search_index = Some(3);

        let json = serde_json::to_string(&song).unwrap();
        assert!(json.contains("\"requestUrl\""));
        assert!(json.contains("\"searchIndex\""));

        let back: Song = serde_json::from_str(&json).unwrap();
        assert_eq!(back, song);
    }

    proptest! {
        #[test]
        fn same_song_is_symmetric_and_reflexive(
            name_a in ".{0,12}", singer_a in ".{0,12}",
            name_b in ".{0,12}", singer_b in ".{0,12}",
            qq_a in proptest::bool::ANY, qq_b in proptest::bool::ANY,
        ) {
            let platform = |qq| if qq { Platform::Qq } else { Platform::Wy };
            let a = Song::new(name_a, singer_a, platform(qq_a));
            let b = Song::new(name_b, singer_b, platform(qq_b));

            prop_assert!(a.same_song(&a));
            prop_assert_eq!(a.same_song(&b), b.same_song(&a));
        }
    }
}
