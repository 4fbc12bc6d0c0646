//! Playback continuity and queue-state engine
//!
//! This crate is the stateful core of the Mellow player. It owns the
//! current song, the playing/loading flags, the persisted collections
//! (history, favorites, play queue) and the retry/cancellation policy
//! around song resolution, and synchronizes timed lyrics against the
//! playback position. It renders nothing and plays no audio; the
//! embedding layer feeds it user intents and drains its event queue.
//!
//! # Example
//!
//! ```ignore
//! use mellow_core::MemoryStore;
//! use mellow_playback::{PlayerConfig, PlayerSession};
//! use mellow_resolver::HttpResolver;
//! use std::sync::Arc;
//!
//! let resolver = Arc::new(HttpResolver::new("https://music.example.com")?);
//! let store = Arc::new(MemoryStore::new());
//! let session = PlayerSession::new(resolver, store, PlayerConfig::default());
//!
//! session.resume_last_session();
//! session.search("respect").await;
//! if let Some(hit) = session.search_results().first() {
//!     session.play_song(hit, hit.search_index, None, false, true).await;
//! }
//! for event in session.take_events() {
//!     println!("{event:?}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod events;
mod favorites;
mod history;
mod lyrics;
mod queue;
mod repository;
mod session;
mod types;

pub use events::{PlaybackErrorKind, PlayerEvent};
pub use favorites::Favorites;
pub use history::PlayHistory;
pub use lyrics::{active_line, parse_timestamp};
pub use queue::PlayQueue;
pub use session::PlayerSession;
pub use types::PlayerConfig;
