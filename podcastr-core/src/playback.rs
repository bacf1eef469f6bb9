//! Playback state and its transitions.
//!
//! [`PlaybackState`] is a plain value: every operation is a synchronous,
//! total transition that keeps the invariants below. The shared, observable
//! instance lives in [`PlayerStore`](crate::PlayerStore).
//!
//! Invariants:
//! - `current_index` is `None` or a valid position in `episodes`.
//! - An empty playlist has no current index and is never playing.

use crate::episode::Episode;
use crate::error::{CoreError, Result};
use rand::Rng;
use std::sync::Arc;

/// What is loaded and what the listener wants the player to do with it.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    episodes: Arc<[Episode]>,
    current_index: Option<usize>,
    is_playing: bool,
    is_looping: bool,
    is_shuffling: bool,
    /// Bumped every time a track is (re)selected, including loop replays
    selection: u64,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            episodes: Arc::from(Vec::new()),
            current_index: None,
            is_playing: false,
            is_looping: false,
            is_shuffling: false,
            selection: 0,
        }
    }
}

impl PlaybackState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the playlist with a single episode and start it.
    pub fn play(&mut self, episode: Episode) {
        self.episodes = Arc::from(vec![episode]);
        self.select(0);
        self.is_playing = true;
    }

    /// Replace the playlist and start the episode at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidIndex`] if `index` is not a position in `episodes`;
    /// the state is left untouched in that case.
    pub fn play_list(&mut self, episodes: impl Into<Arc<[Episode]>>, index: usize) -> Result<()> {
        let episodes = episodes.into();
        if index >= episodes.len() {
            return Err(CoreError::InvalidIndex {
                index,
                len: episodes.len(),
            });
        }
        self.episodes = episodes;
        self.select(index);
        self.is_playing = true;
        Ok(())
    }

    /// Flip the transport intent. Nothing to play means nothing to toggle.
    pub fn toggle_play(&mut self) {
        self.set_playing_state(!self.is_playing);
    }

    /// Set the transport intent, e.g. when the audio element reports pause on its own.
    pub fn set_playing_state(&mut self, playing: bool) {
        self.is_playing = playing && self.current_index.is_some();
    }

    pub fn toggle_loop(&mut self) {
        self.is_looping = !self.is_looping;
    }

    pub fn toggle_shuffle(&mut self) {
        self.is_shuffling = !self.is_shuffling;
    }

    /// Advance to the next track.
    ///
    /// Looping replays the current track and wins over shuffling. Shuffling picks
    /// any index uniformly, the current one included. Sequential mode stops silently
    /// at the last track.
    pub fn play_next<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let Some(current) = self.current_index else {
            return;
        };

        if self.is_looping {
            self.select(current);
            self.is_playing = true;
        } else if self.is_shuffling {
            let next = rng.gen_range(0..self.episodes.len());
            self.select(next);
        } else if current + 1 < self.episodes.len() {
            self.select(current + 1);
        }
    }

    /// Step back one track; a no-op on the first one. Shuffle has no backward rule.
    pub fn play_previous(&mut self) {
        if let Some(current) = self.current_index.filter(|&i| i > 0) {
            self.select(current - 1);
        }
    }

    /// Drop the playlist and stop.
    pub fn clear(&mut self) {
        self.episodes = Arc::from(Vec::new());
        self.current_index = None;
        self.is_playing = false;
    }

    fn select(&mut self, index: usize) {
        self.current_index = Some(index);
        self.selection = self.selection.wrapping_add(1);
    }

    /// Another track is available: always while shuffling, otherwise unless on the last one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        match self.current_index {
            Some(current) => self.is_shuffling || current + 1 < self.episodes.len(),
            None => false,
        }
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.current_index.is_some_and(|i| i > 0)
    }

    #[must_use]
    pub fn episodes(&self) -> &Arc<[Episode]> {
        &self.episodes
    }

    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    #[must_use]
    pub fn current_episode(&self) -> Option<&Episode> {
        self.current_index.and_then(|i| self.episodes.get(i))
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.is_playing
    }

    #[must_use]
    pub const fn is_looping(&self) -> bool {
        self.is_looping
    }

    #[must_use]
    pub const fn is_shuffling(&self) -> bool {
        self.is_shuffling
    }

    #[must_use]
    pub const fn selection(&self) -> u64 {
        self.selection
    }

    /// Check if a different track (or a replay of the same one) was selected
    #[must_use]
    pub const fn track_changed(&self, other: &Self) -> bool {
        self.selection != other.selection
    }

    /// Check if transport intent changed (playing <-> paused)
    #[must_use]
    pub const fn playback_state_changed(&self, other: &Self) -> bool {
        self.is_playing != other.is_playing
    }

    /// Field-wise equality, ignoring playlist identity beyond its contents.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.selection == other.selection
            && self.current_index == other.current_index
            && self.is_playing == other.is_playing
            && self.is_looping == other.is_looping
            && self.is_shuffling == other.is_shuffling
            && (Arc::ptr_eq(&self.episodes, &other.episodes) || self.episodes == other.episodes)
    }
}
