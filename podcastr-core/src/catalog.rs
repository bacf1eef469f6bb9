//! Episode catalog abstraction and normalization helpers.

use crate::episode::{DisplayOptions, Episode, RawEpisode};
use crate::error::Result;
use async_trait::async_trait;
use tracing::{info, warn};

/// Query parameters for the episode list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// Maximum number of episodes
    pub limit: u32,
    /// `asc` or `desc`
    pub order: String,
    /// Field to sort by, e.g. `published_at`
    pub sort: String,
}

impl ListParams {
    #[must_use]
    pub fn new(limit: u32, order: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            limit,
            order: order.into(),
            sort: sort.into(),
        }
    }
}

impl Default for ListParams {
    fn default() -> Self {
        Self::new(12, "desc", "published_at")
    }
}

/// Source of episode records
#[async_trait]
pub trait EpisodeCatalog: Send + Sync {
    /// Get the catalog name
    fn name(&self) -> &'static str;

    /// Fetch an ordered page of episodes
    async fn fetch_episode_list(&self, params: &ListParams) -> Result<Vec<RawEpisode>>;

    /// Fetch a single episode by ID
    async fn fetch_episode_by_id(&self, id: &str) -> Result<RawEpisode>;
}

/// Fetch and normalize the episode list, skipping records that fail normalization.
///
/// # Errors
///
/// Returns the catalog's error if the list cannot be fetched.
pub async fn load_episodes(
    catalog: &dyn EpisodeCatalog,
    params: &ListParams,
    display: &DisplayOptions,
) -> Result<Vec<Episode>> {
    let raw = catalog.fetch_episode_list(params).await?;
    let fetched = raw.len();
    let episodes = normalize_all(raw, display);
    info!(
        "Loaded {} of {} episode(s) from {}",
        episodes.len(),
        fetched,
        catalog.name()
    );
    Ok(episodes)
}

/// Fetch and normalize one episode.
///
/// # Errors
///
/// Returns the catalog's error, or [`CoreError::InvalidRecord`](crate::CoreError::InvalidRecord)
/// if the record cannot be normalized.
pub async fn load_episode(
    catalog: &dyn EpisodeCatalog,
    id: &str,
    display: &DisplayOptions,
) -> Result<Episode> {
    let raw = catalog.fetch_episode_by_id(id).await?;
    Episode::from_raw(raw, display)
}

fn normalize_all(raw: Vec<RawEpisode>, display: &DisplayOptions) -> Vec<Episode> {
    raw.into_iter()
        .filter_map(|record| match Episode::from_raw(record, display) {
            Ok(episode) => Some(episode),
            Err(e) => {
                warn!("Skipping episode: {}", e);
                None
            }
        })
        .collect()
}
