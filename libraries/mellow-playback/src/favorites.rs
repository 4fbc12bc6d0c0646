//! Favorites collection
//!
//! A persisted list of songs plus a derived identity index so
//! membership checks stay O(1) no matter how the list is rendered.

use crate::repository::Repository;
use mellow_core::{KeyValueStore, Song};
use std::collections::HashSet;
use std::sync::Arc;

const FAVORITES_KEY: &str = "favorites";

/// The user's favorite songs, in the order they were added
pub struct Favorites {
    repo: Repository<Vec<Song>>,
    songs: Vec<Song>,
    index: HashSet<String>,
}

impl Favorites {
    /// Load the collection from `store`
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let repo = Repository::new(store, FAVORITES_KEY);
        let songs: Vec<Song> = repo.load();
        let index = build_index(&songs);
        Self { repo, songs, index }
    }

    /// Whether an identity-matching song has been favorited
    pub fn is_favorite(&self, song: &Song) -> bool {
        self.index.contains(&song.identity_key())
    }

    /// Add the song if absent, remove it if present
    pub fn toggle(&mut self, song: &Song) -> bool {
        let key = song.identity_key();
        let added = if self.index.remove(&key) {
            self.songs.retain(|s| !s.same_song(song));
            false
        } else {
            self.index.insert(key);
            self.songs.push(song.clone());
            true
        };
        self.repo.save(&self.songs);
        added
    }

    /// Overwrite the stored copy of an identity-matching favorite with
    /// freshly resolved state
    pub fn replace_matching(&mut self, song: &Song) {
        let mut replaced = false;
        for entry in self.songs.iter_mut().filter(|s| s.same_song(song)) {
            *entry = song.clone();
            replaced = true;
        }
        if replaced {
            self.repo.save(&self.songs);
        }
    }

    /// All favorites, oldest first
    pub fn all(&self) -> &[Song] {
        &self.songs
    }

    /// Number of favorites
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Whether there are no favorites
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

fn build_index(songs: &[Song]) -> HashSet<String> {
    songs.iter().map(Song::identity_key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mellow_core::{MemoryStore, Platform};

    fn song(name: &str) -> Song {
        Song::new(name, "Artist", Platform::Wy)
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut favorites = Favorites::new(Arc::new(MemoryStore::new()));
        let track = song("Respect");

        assert!(favorites.toggle(&track));
        assert!(favorites.is_favorite(&track));
        assert_eq!(favorites.len(), 1);

        assert!(!favorites.toggle(&track));
        assert!(!favorites.is_favorite(&track));
        assert!(favorites.is_empty());
    }

    #[test]
    fn double_toggle_is_identity() {
        let mut favorites = Favorites::new(Arc::new(MemoryStore::new()));
        favorites.toggle(&song("A"));
        favorites.toggle(&song("B"));

        favorites.toggle(&song("A"));
        favorites.toggle(&song("A"));

        assert_eq!(favorites.len(), 2);
        assert!(favorites.is_favorite(&song("A")));
        assert!(favorites.is_favorite(&song("B")));
    }

    #[test]
    fn membership_ignores_resolution_state() {
        let mut favorites = Favorites::new(Arc::new(MemoryStore::new()));
        favorites.toggle(&song("Respect"));

        let mut resolved = song("Respect");
        resolved.url = Some("https://cdn.example.com/a.mp3".into());
        assert!(favorites.is_favorite(&resolved));
    }

    #[test]
    fn persists_across_reconstruction() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut favorites = Favorites::new(store.clone());
            favorites.toggle(&song("Respect"));
        }

        let favorites = Favorites::new(store);
        assert!(favorites.is_favorite(&song("Respect")));
        assert_eq!(favorites.len(), 1);
    }
}
