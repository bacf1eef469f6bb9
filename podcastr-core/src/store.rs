//! The shared player store: the only way to change playback.

use crate::command::PlayerCommand;
use crate::episode::Episode;
use crate::error::Result;
use crate::playback::PlaybackState;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Owns the single authoritative [`PlaybackState`].
///
/// Created once by the composition root and handed out as `Arc<PlayerStore>`.
/// Readers get snapshots or a [`watch::Receiver`]; every write goes through the
/// operations below, and a change is published only when something differs.
pub struct PlayerStore {
    state: watch::Sender<PlaybackState>,
}

impl PlayerStore {
    /// Create a new store with nothing loaded
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Subscribe to state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    /// Get a copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> PlaybackState {
        self.state.borrow().clone()
    }

    pub fn play(&self, episode: Episode) {
        self.apply("play", |state| state.play(episode));
    }

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidIndex`](crate::CoreError::InvalidIndex) when `index` is
    /// outside `episodes`; nothing is published in that case.
    pub fn play_list(&self, episodes: impl Into<Arc<[Episode]>>, index: usize) -> Result<()> {
        let mut result = Ok(());
        self.apply("play_list", |state| result = state.play_list(episodes, index));
        result
    }

    pub fn toggle_play(&self) {
        self.apply("toggle_play", PlaybackState::toggle_play);
    }

    pub fn set_playing_state(&self, playing: bool) {
        self.apply("set_playing", |state| state.set_playing_state(playing));
    }

    pub fn toggle_loop(&self) {
        self.apply("toggle_loop", PlaybackState::toggle_loop);
    }

    pub fn toggle_shuffle(&self) {
        self.apply("toggle_shuffle", PlaybackState::toggle_shuffle);
    }

    pub fn play_next(&self) {
        self.play_next_with(&mut rand::thread_rng());
    }

    /// [`Self::play_next`] with a caller supplied random source for shuffle picks.
    pub fn play_next_with<R: Rng + ?Sized>(&self, rng: &mut R) {
        self.apply("next", |state| state.play_next(rng));
    }

    pub fn play_previous(&self) {
        self.apply("previous", PlaybackState::play_previous);
    }

    pub fn clear_player_state(&self) {
        self.apply("clear", PlaybackState::clear);
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.state.borrow().has_next()
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.state.borrow().has_previous()
    }

    /// Apply a command message.
    ///
    /// # Errors
    ///
    /// Only [`PlayerCommand::PlayList`] can fail, with an out-of-range index.
    pub fn dispatch(&self, command: PlayerCommand) -> Result<()> {
        match command {
            PlayerCommand::Play(episode) => self.play(episode),
            PlayerCommand::PlayList { episodes, index } => return self.play_list(episodes, index),
            PlayerCommand::TogglePlay => self.toggle_play(),
            PlayerCommand::SetPlaying(playing) => self.set_playing_state(playing),
            PlayerCommand::ToggleLoop => self.toggle_loop(),
            PlayerCommand::ToggleShuffle => self.toggle_shuffle(),
            PlayerCommand::Next => self.play_next(),
            PlayerCommand::Previous => self.play_previous(),
            PlayerCommand::Clear => self.clear_player_state(),
        }
        Ok(())
    }

    fn apply(&self, op: &'static str, f: impl FnOnce(&mut PlaybackState)) {
        self.state.send_if_modified(|state| {
            let before = state.clone();
            f(state);
            let changed = !state.same_as(&before);
            if changed {
                debug!(
                    op,
                    index = ?state.current_index(),
                    playing = state.is_playing(),
                    looping = state.is_looping(),
                    shuffling = state.is_shuffling(),
                    "Playback state changed"
                );
            }
            changed
        });
    }
}

impl Default for PlayerStore {
    fn default() -> Self {
        let (state, _) = watch::channel(PlaybackState::default());
        Self { state }
    }
}
