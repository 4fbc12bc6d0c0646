//! Events emitted by the playback session
//!
//! The session never talks to a UI directly; it queues events and the
//! embedding layer drains them with [`PlayerSession::take_events`] to
//! drive notices, now-playing displays and lyric highlighting.
//!
//! [`PlayerSession::take_events`]: crate::PlayerSession::take_events

use mellow_core::Song;
use serde::{Deserialize, Serialize};

/// Broad failure categories surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackErrorKind {
    /// All attempts ran out of time
    Timeout,
    /// Endpoint unreachable, or the request was blocked in transit
    Network,
    /// Upstream refused or answered with unusable data
    Other,
}

/// State changes the embedding layer should react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// A previous session's current song was restored (paused, never
    /// auto-playing)
    SessionResumed {
        /// Restored song name
        name: String,
        /// Restored song artist
        singer: String,
    },

    /// The current song changed
    TrackChanged {
        /// The new current song, with whatever resolved state it carries
        song: Song,
    },

    /// Playing/paused flipped
    StateChanged {
        /// New playing state
        is_playing: bool,
    },

    /// The highlighted lyric line changed; `None` means before the
    /// first line (or no parseable lyrics)
    LyricLineChanged {
        /// Zero-based index into the current song's lyric lines
        index: Option<usize>,
    },

    /// A search could not be completed on any platform
    SearchFailed {
        /// Human-readable reason
        message: String,
    },

    /// A song could not be made playable after all retry attempts
    PlaybackFailed {
        /// Failure category
        kind: PlaybackErrorKind,
        /// Human-readable reason
        message: String,
    },
}
