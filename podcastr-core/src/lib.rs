pub mod binder;
pub mod catalog;
pub mod command;
pub mod config;
pub mod episode;
pub mod error;
pub mod listing;
pub mod media;
pub mod paths;
pub mod playback;
pub mod store;
pub mod time;

pub use binder::{reaction, BinderEvent, MediaBinder};
pub use catalog::{load_episode, load_episodes, EpisodeCatalog, ListParams};
pub use command::PlayerCommand;
pub use config::{
    CatalogConfig, DisplayConfig, LoggingConfig, PlayerConfig, PodcastrConfig,
};

pub use episode::{DisplayOptions, Episode, RawDuration, RawEpisode, RawEpisodeFile};
pub use error::{CoreError, Result};
pub use listing::HomeListing;
pub use media::{LoadId, LoadRequest, MediaElement, MediaEvent, Progress};
pub use paths::{config_dir, config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME, LOG_FILE_NAME};
pub use playback::PlaybackState;
pub use store::PlayerStore;
pub use time::{format_clock, scale_duration, DurationExt};
