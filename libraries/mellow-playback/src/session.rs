//! The playback session controller
//!
//! One [`PlayerSession`] owns everything the player remembers: the
//! current song, the playing flag, the three persisted collections and
//! the single in-flight resolution. State lives behind one mutex that
//! is never held across an await; every resolution carries a cancel
//! token that is checked before any post-await mutation, so a
//! superseded resolution can finish late without clobbering newer
//! state.

use crate::events::{PlaybackErrorKind, PlayerEvent};
use crate::favorites::Favorites;
use crate::history::PlayHistory;
use crate::lyrics::{active_line, LyricTracker};
use crate::queue::PlayQueue;
use crate::types::PlayerConfig;
use mellow_core::{KeyValueStore, Platform, Song};
use mellow_resolver::{ResolveRequest, ResolvedMedia, ResolverError, SongResolver};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

const CURRENT_SONG_KEY: &str = "current_song";

/// Cancellation handle for one resolution
///
/// Replacing the session's stored token supersedes the resolution that
/// holds the old one; that resolution notices the next time it checks.
#[derive(Clone)]
struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

enum ResolveFailure {
    /// Superseded or abandoned; nothing is surfaced
    Cancelled,
    /// All attempts exhausted
    Terminal(ResolverError),
}

struct SessionState {
    current_song: Option<Song>,
    is_playing: bool,
    is_loading: bool,
    selected_quality: u32,
    search_term: String,
    search_results: Vec<Song>,
    resume_checked: bool,
    in_flight: Option<CancelToken>,
    lyric: LyricTracker,
    pending_events: Vec<PlayerEvent>,
    history: PlayHistory,
    queue: PlayQueue,
    favorites: Favorites,
}

/// Playback continuity and queue-state engine
pub struct PlayerSession {
    config: PlayerConfig,
    resolver: Arc<dyn SongResolver>,
    store: Arc<dyn KeyValueStore>,
    state: Mutex<SessionState>,
}

impl PlayerSession {
    /// Create a session over a resolution backend and a store
    pub fn new(
        resolver: Arc<dyn SongResolver>,
        store: Arc<dyn KeyValueStore>,
        config: PlayerConfig,
    ) -> Self {
        let state = SessionState {
            current_song: None,
            is_playing: false,
            is_loading: false,
            selected_quality: config.default_quality,
            search_term: String::new(),
            search_results: Vec::new(),
            resume_checked: false,
            in_flight: None,
            lyric: LyricTracker::default(),
            pending_events: Vec::new(),
            history: PlayHistory::new(store.clone(), config.history_size),
            queue: PlayQueue::new(store.clone()),
            favorites: Favorites::new(store.clone()),
        };
        Self {
            config,
            resolver,
            store,
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Session lifecycle =====

    /// Restore the previous session's current song, once
    ///
    /// The restored song is presented paused; playback never starts
    /// without an explicit request.
    pub fn resume_last_session(&self) {
        let mut st = self.state();
        if st.resume_checked {
            return;
        }
        st.resume_checked = true;

        let stored = match self.store.get(CURRENT_SONG_KEY) {
            Ok(Some(value)) => value,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted current song");
                return;
            }
        };
        match serde_json::from_value::<Song>(stored) {
            Ok(song) => {
                info!(name = %song.name, singer = %song.singer, "Resuming previous session");
                st.pending_events.push(PlayerEvent::SessionResumed {
                    name: song.name.clone(),
                    singer: song.singer.clone(),
                });
                st.current_song = Some(song);
            }
            Err(e) => warn!(error = %e, "Discarding undecodable persisted current song"),
        }
    }

    /// Drain queued events for the embedding layer
    pub fn take_events(&self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.state().pending_events)
    }

    // ===== State accessors =====

    /// The current song, if any
    pub fn current_song(&self) -> Option<Song> {
        self.state().current_song.clone()
    }

    /// Whether playback is on
    pub fn is_playing(&self) -> bool {
        self.state().is_playing
    }

    /// Whether a resolution is in flight
    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    /// The quality tier applied to `qq` resolutions
    pub fn selected_quality(&self) -> u32 {
        self.state().selected_quality
    }

    /// Choose the quality tier for subsequent `qq` resolutions
    pub fn set_quality(&self, quality: u32) {
        self.state().selected_quality = quality;
    }

    /// The term of the most recent search
    pub fn search_term(&self) -> String {
        self.state().search_term.clone()
    }

    /// The interleaved results of the most recent search
    pub fn search_results(&self) -> Vec<Song> {
        self.state().search_results.clone()
    }

    /// Pause playback, keeping the current song
    pub fn pause(&self) {
        let mut st = self.state();
        Self::set_playing(&mut st, false);
    }

    /// Resume playback of the current song
    ///
    /// Ignored while no playable URL is loaded; a restored or
    /// unresolved song must go through [`play_song`] first.
    ///
    /// [`play_song`]: PlayerSession::play_song
    pub fn resume(&self) {
        let mut st = self.state();
        Self::set_playing(&mut st, true);
    }

    // ===== Collections =====

    /// Listening history, most recent first
    pub fn history(&self) -> Vec<Song> {
        self.state().history.all().to_vec()
    }

    /// Drop a song from the history
    pub fn remove_from_history(&self, song: &Song) {
        self.state().history.remove(song);
    }

    /// The play queue, in queue order
    pub fn queue(&self) -> Vec<Song> {
        self.state().queue.all().to_vec()
    }

    /// Whether a song is queued
    pub fn is_in_queue(&self, song: &Song) -> bool {
        self.state().queue.is_in_queue(song)
    }

    /// Queue the song, or remove it if already queued
    pub fn toggle_queue(&self, song: &Song) -> bool {
        self.state().queue.toggle(song)
    }

    /// Empty the play queue
    pub fn clear_queue(&self) {
        self.state().queue.clear();
    }

    /// Favorited songs, oldest first
    pub fn favorites(&self) -> Vec<Song> {
        self.state().favorites.all().to_vec()
    }

    /// Whether a song is favorited
    pub fn is_favorite(&self, song: &Song) -> bool {
        self.state().favorites.is_favorite(song)
    }

    /// Favorite the song, or unfavorite it if already favorited
    pub fn toggle_favorite(&self, song: &Song) -> bool {
        self.state().favorites.toggle(song)
    }

    // ===== Search =====

    /// Search both platforms concurrently and interleave the results
    ///
    /// One platform failing is tolerated; only when both fail is a
    /// [`PlayerEvent::SearchFailed`] queued. Results replace the
    /// previous list only on at least partial success.
    pub async fn search(&self, term: &str) {
        let term = term.trim();
        if term.is_empty() {
            return;
        }

        let (wy, qq) = tokio::join!(
            self.resolver.search(Platform::Wy, term),
            self.resolver.search(Platform::Qq, term),
        );

        let mut st = self.state();
        st.search_term = term.to_string();
        match (wy, qq) {
            (Err(wy_err), Err(qq_err)) => {
                warn!(term, wy = %wy_err, qq = %qq_err, "Search failed on both platforms");
                st.pending_events.push(PlayerEvent::SearchFailed {
                    message: wy_err.to_string(),
                });
            }
            (wy, qq) => {
                if let Err(e) = &wy {
                    warn!(term, error = %e, "wy search failed, keeping qq results");
                }
                if let Err(e) = &qq {
                    warn!(term, error = %e, "qq search failed, keeping wy results");
                }
                st.search_results =
                    interleave(wy.unwrap_or_default(), qq.unwrap_or_default());
            }
        }
    }

    // ===== Playback =====

    /// Make `song` the current track, resolving it first if needed
    ///
    /// Duplicate intents are dropped while a resolution is loading,
    /// unless the call is a retry or comes from a fresh search
    /// selection; a fresh selection instead supersedes the in-flight
    /// resolution. A song that already carries a URL plays directly,
    /// except `qq` songs, whose stored URLs are too short-lived to
    /// trust, and retries, which exist to fetch a fresh URL.
    pub async fn play_song(
        &self,
        song: &Song,
        index: Option<usize>,
        quality: Option<u32>,
        is_retry: bool,
        from_search: bool,
    ) {
        let (token, request) = {
            let mut st = self.state();
            if st.is_loading && !is_retry && !from_search {
                debug!(name = %song.name, "Dropping duplicate play intent while loading");
                return;
            }
            if song.is_directly_playable() && !is_retry {
                // A direct play supersedes a pending resolution just
                // like a new resolution would
                if let Some(previous) = st.in_flight.take() {
                    previous.cancel();
                }
                st.is_loading = false;
                let fallback = st.search_term.clone();
                st.history.add(song, &fallback);
                self.commit_current(&mut st, song.clone(), true);
                return;
            }

            if let Some(previous) = st.in_flight.take() {
                previous.cancel();
            }
            let token = CancelToken::new();
            st.in_flight = Some(token.clone());
            st.is_loading = true;

            let request = Self::build_request(&st, song, index, quality, from_search);
            (token, request)
        };

        debug!(query = %request.query_string(), retry = is_retry, "Resolving song");
        match self.resolve_with_retry(&request, &token).await {
            Ok(media) => {
                let mut st = self.state();
                if token.is_cancelled() {
                    return;
                }
                st.in_flight = None;
                st.is_loading = false;

                let resolved = merge_media(song, media, &request);
                let fallback = st.search_term.clone();
                st.history.add(&resolved, &fallback);
                st.queue.replace_matching(&resolved);
                st.favorites.replace_matching(&resolved);
                for result in st.search_results.iter_mut() {
                    if result.same_song(&resolved) {
                        *result = resolved.clone();
                    }
                }

                // A retry keeps whatever playing state the user had
                let playing = if is_retry { st.is_playing } else { true };
                self.commit_current(&mut st, resolved, playing);
            }
            Err(ResolveFailure::Cancelled) => {
                debug!(name = %song.name, "Resolution superseded");
            }
            Err(ResolveFailure::Terminal(error)) => {
                let kind = failure_kind(&error);
                if token.is_cancelled() {
                    return;
                }
                // A blocked request can sometimes be salvaged by
                // rebuilding it from search context instead of
                // replaying the stored URL
                if kind == PlaybackErrorKind::Network
                    && !is_retry
                    && song.request_url.is_some()
                {
                    debug!(name = %song.name, "Re-resolving with a rebuilt request");
                    return Box::pin(self.play_song(song, index, quality, true, true)).await;
                }

                let mut st = self.state();
                if token.is_cancelled() {
                    return;
                }
                st.in_flight = None;
                st.is_loading = false;
                Self::set_playing(&mut st, false);
                warn!(name = %song.name, error = %error, "Giving up on resolution");
                st.pending_events.push(PlayerEvent::PlaybackFailed {
                    kind,
                    message: error.to_string(),
                });
            }
        }
    }

    /// Advance to the next queue entry
    pub async fn play_next(&self) {
        self.step_queue(Direction::Forward).await;
    }

    /// Go back to the previous queue entry
    pub async fn play_previous(&self) {
        self.step_queue(Direction::Backward).await;
    }

    /// React to the current track finishing naturally
    ///
    /// This is the only path that auto-advances; an explicit pause
    /// never does.
    pub async fn handle_track_ended(&self) {
        {
            let mut st = self.state();
            Self::set_playing(&mut st, false);
        }
        self.step_queue(Direction::Forward).await;
    }

    /// Feed the playback position, in seconds, to lyric sync
    ///
    /// Queues [`PlayerEvent::LyricLineChanged`] when the active line
    /// changes.
    pub fn playback_position(&self, elapsed: f64) {
        let mut st = self.state();
        let index = st
            .current_song
            .as_ref()
            .and_then(|song| active_line(&song.lyrics, elapsed));
        if let Some(index) = st.lyric.observe(index) {
            st.pending_events.push(PlayerEvent::LyricLineChanged { index });
        }
    }

    /// The currently highlighted lyric line, if any
    pub fn current_lyric_index(&self) -> Option<usize> {
        self.state().lyric.current()
    }

    // ===== Internals =====

    async fn step_queue(&self, direction: Direction) {
        let target = {
            let st = self.state();
            let Some(current) = st.current_song.as_ref() else {
                return;
            };
            match direction {
                Direction::Forward => st.queue.next_after(current),
                Direction::Backward => st.queue.previous_before(current),
            }
        };
        let Some(target) = target else {
            return;
        };

        if target.is_directly_playable() {
            let mut st = self.state();
            if let Some(previous) = st.in_flight.take() {
                previous.cancel();
            }
            st.is_loading = false;
            let fallback = st.search_term.clone();
            st.history.add(&target, &fallback);
            self.commit_current(&mut st, target, true);
        } else {
            self.play_song(&target, target.search_index, None, false, false)
                .await;
        }
    }

    async fn resolve_with_retry(
        &self,
        request: &ResolveRequest,
        token: &CancelToken,
    ) -> Result<ResolvedMedia, ResolveFailure> {
        let mut last_error = None;
        for attempt in 1..=self.config.max_attempts {
            if token.is_cancelled() {
                return Err(ResolveFailure::Cancelled);
            }

            let outcome =
                tokio::time::timeout(self.config.resolve_timeout, self.resolver.resolve(request))
                    .await;
            if token.is_cancelled() {
                return Err(ResolveFailure::Cancelled);
            }

            match outcome {
                Ok(Ok(media)) => return Ok(media),
                Ok(Err(error)) => {
                    warn!(attempt, error = %error, "Resolution attempt failed");
                    last_error = Some(error);
                }
                Err(_) => {
                    warn!(attempt, "Resolution attempt timed out");
                    last_error = Some(ResolverError::Timeout);
                }
            }

            if attempt < self.config.max_attempts {
                tokio::time::sleep(self.config.retry_delay).await;
                if token.is_cancelled() {
                    return Err(ResolveFailure::Cancelled);
                }
            }
        }
        Err(ResolveFailure::Terminal(
            last_error.unwrap_or(ResolverError::Timeout),
        ))
    }

    /// Build the resolution request for a song
    ///
    /// A parseable stored `request_url` is reused as-is (so a history
    /// or resumed entry replays the exact request that worked before)
    /// unless the song was just picked from search results, which
    /// always rebuilds against the live search term.
    fn build_request(
        st: &SessionState,
        song: &Song,
        index: Option<usize>,
        quality: Option<u32>,
        from_search: bool,
    ) -> ResolveRequest {
        if !from_search {
            if let Some(stored) = song.request_url.as_deref() {
                if let Some(mut request) = ResolveRequest::parse(stored) {
                    if quality.is_some() {
                        request = request.with_quality(quality);
                    }
                    if request.index.is_none() {
                        request.index = index.or(song.search_index).or(Some(0));
                    }
                    return request;
                }
            }
        }

        let term = if from_search && !st.search_term.is_empty() {
            st.search_term.clone()
        } else {
            song.search_term
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| {
                    if st.search_term.is_empty() {
                        song.default_search_term()
                    } else {
                        st.search_term.clone()
                    }
                })
        };
        let index = index.or(song.search_index).unwrap_or(0);
        ResolveRequest::detail(song.platform, term, index)
            .with_quality(Some(quality.unwrap_or(st.selected_quality)))
    }

    /// Install a new current song: reset lyric sync, persist it,
    /// queue the change event and apply the playing flag
    fn commit_current(&self, st: &mut SessionState, song: Song, playing: bool) {
        st.lyric.reset();
        match serde_json::to_value(&song) {
            Ok(value) => {
                if let Err(e) = self.store.set(CURRENT_SONG_KEY, value) {
                    warn!(error = %e, "Failed to persist current song");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode current song"),
        }

        st.current_song = Some(song.clone());
        st.pending_events.push(PlayerEvent::TrackChanged { song });
        Self::set_playing(st, playing);
    }

    /// Flip the playing flag, upholding that playback is only ever on
    /// while the current song has a URL
    fn set_playing(st: &mut SessionState, playing: bool) {
        let playing = playing
            && st
                .current_song
                .as_ref()
                .is_some_and(|song| song.url.is_some());
        if st.is_playing != playing {
            st.is_playing = playing;
            st.pending_events
                .push(PlayerEvent::StateChanged { is_playing: playing });
        }
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

/// Apply resolved media onto a song reference, stamping the request it
/// came from
fn merge_media(song: &Song, media: ResolvedMedia, request: &ResolveRequest) -> Song {
    let mut resolved = song.clone();
    resolved.url = Some(media.url);
    resolved.cover = media.cover.or(resolved.cover);
    resolved.lyrics = media.lyrics;
    resolved.details = media.details.or(resolved.details);
    resolved.search_term = Some(request.term.clone());
    resolved.search_index = request.index.or(resolved.search_index);
    resolved.quality = request.quality.or(resolved.quality);
    resolved.request_url = Some(request.query_string());
    resolved
}

fn failure_kind(error: &ResolverError) -> PlaybackErrorKind {
    match error {
        ResolverError::Timeout => PlaybackErrorKind::Timeout,
        ResolverError::Unreachable(_) | ResolverError::Request(_) => PlaybackErrorKind::Network,
        ResolverError::Api { .. }
        | ResolverError::InvalidAudioUrl(_)
        | ResolverError::Parse(_)
        | ResolverError::InvalidUrl(_) => PlaybackErrorKind::Other,
    }
}

fn interleave(wy: Vec<Song>, qq: Vec<Song>) -> Vec<Song> {
    let mut combined = Vec::with_capacity(wy.len() + qq.len());
    let mut wy = wy.into_iter();
    let mut qq = qq.into_iter();
    loop {
        match (wy.next(), qq.next()) {
            (None, None) => break,
            (a, b) => {
                combined.extend(a);
                combined.extend(b);
            }
        }
    }
    combined
}
