//! Controller commands as messages.
//!
//! Every way of changing playback is one [`PlayerCommand`]; the media binder and
//! the front-end both speak this type to the [`PlayerStore`](crate::PlayerStore).

use crate::episode::Episode;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    /// Play a single episode
    Play(Episode),
    /// Play `episodes` starting at `index`
    PlayList {
        episodes: Arc<[Episode]>,
        index: usize,
    },
    TogglePlay,
    SetPlaying(bool),
    ToggleLoop,
    ToggleShuffle,
    Next,
    Previous,
    Clear,
}

impl PlayerCommand {
    /// Short stable name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Play(_) => "play",
            Self::PlayList { .. } => "play_list",
            Self::TogglePlay => "toggle_play",
            Self::SetPlaying(_) => "set_playing",
            Self::ToggleLoop => "toggle_loop",
            Self::ToggleShuffle => "toggle_shuffle",
            Self::Next => "next",
            Self::Previous => "previous",
            Self::Clear => "clear",
        }
    }
}
