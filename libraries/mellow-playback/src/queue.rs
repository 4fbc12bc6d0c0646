//! Play queue with circular navigation
//!
//! Order is insertion order. Navigation wraps at both ends, and a
//! current song that is no longer in the queue falls back
//! asymmetrically: advancing lands on the first entry, going back
//! lands on the last.

use crate::repository::Repository;
use mellow_core::{KeyValueStore, Song};
use std::collections::HashSet;
use std::sync::Arc;

const QUEUE_KEY: &str = "play_queue";

/// The play queue, in the order songs were added
pub struct PlayQueue {
    repo: Repository<Vec<Song>>,
    songs: Vec<Song>,
    index: HashSet<String>,
}

impl PlayQueue {
    /// Load the queue from `store`
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let repo = Repository::new(store, QUEUE_KEY);
        let songs: Vec<Song> = repo.load();
        let index = songs.iter().map(Song::identity_key).collect();
        Self { repo, songs, index }
    }

    /// Whether an identity-matching song is queued
    pub fn is_in_queue(&self, song: &Song) -> bool {
        self.index.contains(&song.identity_key())
    }

    /// Append the song if absent, remove it if present
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

    /// Empty the queue
    pub fn clear(&mut self) {
        self.songs.clear();
        self.index.clear();
        self.repo.save(&self.songs);
    }

    /// The entry after `current`, wrapping past the end
    ///
    /// When `current` is not in the queue, advancing restarts at the
    /// first entry.
    pub fn next_after(&self, current: &Song) -> Option<Song> {
        if self.songs.is_empty() {
            return None;
        }
        let song = match self.position_of(current) {
            Some(i) => &self.songs[(i + 1) % self.songs.len()],
            None => &self.songs[0],
        };
        Some(song.clone())
    }

    /// The entry before `current`, wrapping past the start
    ///
    /// When `current` is not in the queue, going back lands on the
    /// last entry.
    pub fn previous_before(&self, current: &Song) -> Option<Song> {
        if self.songs.is_empty() {
            return None;
        }
        let song = match self.position_of(current) {
            Some(0) | None => &self.songs[self.songs.len() - 1],
            Some(i) => &self.songs[i - 1],
        };
        Some(song.clone())
    }

    /// Overwrite the stored copy of an identity-matching entry with
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

    /// All queued songs, in queue order
    pub fn all(&self) -> &[Song] {
        &self.songs
    }

    /// Number of queued songs
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    fn position_of(&self, song: &Song) -> Option<usize> {
        self.songs.iter().position(|s| s.same_song(song))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mellow_core::{MemoryStore, Platform};

    fn song(name: &str) -> Song {
        Song::new(name, "Artist", Platform::Wy)
    }

    fn queue_of(names: &[&str]) -> PlayQueue {
        let mut queue = PlayQueue::new(Arc::new(MemoryStore::new()));
        for name in names {
            queue.toggle(&song(name));
        }
        queue
    }

    #[test]
    fn toggle_appends_and_removes() {
        let mut queue = queue_of(&["A", "B"]);
        assert!(queue.is_in_queue(&song("A")));
        assert_eq!(queue.len(), 2);

        queue.toggle(&song("A"));
        assert!(!queue.is_in_queue(&song("A")));
        assert_eq!(queue.all()[0].name, "B");
    }

    #[test]
    fn navigation_wraps_both_ends() {
        let queue = queue_of(&["A", "B", "C"]);

        assert_eq!(queue.next_after(&song("C")).unwrap().name, "A");
        assert_eq!(queue.previous_before(&song("A")).unwrap().name, "C");
        assert_eq!(queue.next_after(&song("A")).unwrap().name, "B");
        assert_eq!(queue.previous_before(&song("C")).unwrap().name, "B");
    }

    #[test]
    fn missing_current_falls_back_asymmetrically() {
        let queue = queue_of(&["A", "B", "C"]);
        let outsider = song("Z");

        assert_eq!(queue.next_after(&outsider).unwrap().name, "A");
        assert_eq!(queue.previous_before(&outsider).unwrap().name, "C");
    }

    #[test]
    fn empty_queue_yields_nothing() {
        let queue = queue_of(&[]);
        assert!(queue.next_after(&song("A")).is_none());
        assert!(queue.previous_before(&song("A")).is_none());
    }

    #[test]
    fn single_entry_wraps_to_itself() {
        let queue = queue_of(&["A"]);
        assert_eq!(queue.next_after(&song("A")).unwrap().name, "A");
        assert_eq!(queue.previous_before(&song("A")).unwrap().name, "A");
    }

    #[test]
    fn replace_matching_updates_resolved_state_in_place() {
        let mut queue = queue_of(&["A", "B"]);

        let mut resolved = song("A");
        resolved.url = Some("https://cdn.example.com/a.mp3".into());
        queue.replace_matching(&resolved);

        assert_eq!(queue.all()[0].url.as_deref(), Some("https://cdn.example.com/a.mp3"));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn persists_across_reconstruction() {
        let store = Arc::new(MemoryStore::new());
        {
            let mut queue = PlayQueue::new(store.clone());
            queue.toggle(&song("A"));
            queue.toggle(&song("B"));
        }

        let queue = PlayQueue::new(store);
        assert_eq!(queue.len(), 2);
        assert!(queue.is_in_queue(&song("B")));
    }
}
