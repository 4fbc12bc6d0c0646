//! Listening history
//!
//! Most-recent-first, deduplicated by song identity, capped. Entries
//! are stored with a canonical `request_url` so any history row can be
//! replayed in a later session.

use crate::repository::Repository;
use mellow_core::{KeyValueStore, Song};
use mellow_resolver::ResolveRequest;
use std::sync::Arc;

const HISTORY_KEY: &str = "play_history";

/// The listening history, most recent first
pub struct PlayHistory {
    repo: Repository<Vec<Song>>,
    songs: Vec<Song>,
    cap: usize,
}

impl PlayHistory {
    /// Load the history from `store`, keeping at most `cap` entries
    pub fn new(store: Arc<dyn KeyValueStore>, cap: usize) -> Self {
        let repo = Repository::new(store, HISTORY_KEY);
        let songs = repo.load();
        Self { repo, songs, cap }
    }

    /// Record a play at the front, collapsing any earlier entry for
    /// the same song and truncating to the cap
    ///
    /// `fallback_term` is the session's current search term, used to
    /// rebuild a replayable request URL when the song does not carry
    /// one.
    pub fn add(&mut self, song: &Song, fallback_term: &str) {
        let mut entry = song.clone();
        entry.request_url = Some(normalized_request_url(song, fallback_term));

        self.songs.retain(|s| !s.same_song(song));
        self.songs.insert(0, entry);
        self.songs.truncate(self.cap);
        self.repo.save(&self.songs);
    }

    /// Drop every identity-matching entry
    pub fn remove(&mut self, song: &Song) {
        let before = self.songs.len();
        self.songs.retain(|s| !s.same_song(song));
        if self.songs.len() != before {
            self.repo.save(&self.songs);
        }
    }

    /// All entries, most recent first
    pub fn all(&self) -> &[Song] {
        &self.songs
    }

    /// Number of remembered plays
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Whether the history is empty
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

/// Canonical request URL for a history entry
///
/// A parseable stored URL is re-rendered in canonical form (this also
/// upgrades legacy upstream-native URLs); otherwise one is rebuilt
/// from the song's own search context, falling back to the session
/// term and then to "name artist".
fn normalized_request_url(song: &Song, fallback_term: &str) -> String {
    if let Some(stored) = song.request_url.as_deref() {
        if let Some(request) = ResolveRequest::parse(stored) {
            return request.query_string();
        }
    }

    let term = song
        .search_term
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| {
            if fallback_term.trim().is_empty() {
                song.default_search_term()
            } else {
                fallback_term.to_string()
            }
        });

    ResolveRequest::detail(song.platform, term, song.search_index.unwrap_or(0))
        .with_quality(song.quality)
        .query_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mellow_core::{MemoryStore, Platform};

    fn song(name: &str) -> Song {
        Song::new(name, "Artist", Platform::Wy)
    }

    fn history() -> PlayHistory {
        PlayHistory::new(Arc::new(MemoryStore::new()), 50)
    }

    #[test]
    fn most_recent_first() {
        let mut history = history();
        history.add(&song("A"), "");
        history.add(&song("B"), "");

        assert_eq!(history.all()[0].name, "B");
        assert_eq!(history.all()[1].name, "A");
    }

    #[test]
    fn replay_moves_entry_to_front_without_duplicating() {
        let mut history = history();
        history.add(&song("A"), "");
        history.add(&song("B"), "");
        history.add(&song("A"), "");

        assert_eq!(history.len(), 2);
        assert_eq!(history.all()[0].name, "A");
    }

    #[test]
    fn capped_at_configured_size() {
        let mut history = PlayHistory::new(Arc::new(MemoryStore::new()), 50);
        for i in 0..60 {
            history.add(&song(&format!("Song {i}")), "");
        }

        assert_eq!(history.len(), 50);
        assert_eq!(history.all()[0].name, "Song 59");
        assert_eq!(history.all()[49].name, "Song 10");
    }

    #[test]
    fn entries_carry_a_replayable_request_url() {
        let mut history = history();

        let mut track = song("Respect");
        track.search_term = Some("respect".into());
        track.search_index = Some(2);
        history.add(&track, "");

        assert_eq!(
            history.all()[0].request_url.as_deref(),
            Some("?platform=wy&term=respect&index=2")
        );
    }

    #[test]
    fn legacy_request_urls_are_upgraded() {
        let mut history = history();

        let mut track = song("Respect");
        track.request_url = Some("/wydg/?msg=respect&n=3".into());
        history.add(&track, "");

        assert_eq!(
            history.all()[0].request_url.as_deref(),
            Some("?platform=wy&term=respect&index=2")
        );
    }

    #[test]
    fn request_url_falls_back_to_session_term_then_identity() {
        let mut history = history();

        history.add(&song("Respect"), "aretha");
        assert_eq!(
            history.all()[0].request_url.as_deref(),
            Some("?platform=wy&term=aretha&index=0")
        );

        history.add(&song("Think"), "");
        assert_eq!(
            history.all()[0].request_url.as_deref(),
            Some("?platform=wy&term=Think%20Artist&index=0")
        );
    }

    #[test]
    fn remove_drops_the_entry() {
        let mut history = history();
        history.add(&song("A"), "");
        history.add(&song("B"), "");

        history.remove(&song("A"));
        assert_eq!(history.len(), 1);
        assert_eq!(history.all()[0].name, "B");
    }

    #[test]
    fn persists_across_reconstruction() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut history = PlayHistory::new(store.clone(), 50);
            history.add(&song("A"), "");
        }

        let history = PlayHistory::new(store, 50);
        assert_eq!(history.len(), 1);
    }
}
