//! The home page listing: a "latest releases" section followed by everything else.
//!
//! Both sections play from one combined playlist, so the row index in the second
//! section is offset by the size of the first.

use crate::episode::Episode;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct HomeListing {
    playlist: Arc<[Episode]>,
    latest_count: usize,
}

impl HomeListing {
    /// Split `episodes` (already in display order) after the first `latest_count`.
    #[must_use]
    pub fn new(episodes: Vec<Episode>, latest_count: usize) -> Self {
        let latest_count = latest_count.min(episodes.len());
        Self {
            playlist: episodes.into(),
            latest_count,
        }
    }

    #[must_use]
    pub fn latest(&self) -> &[Episode] {
        &self.playlist[..self.latest_count]
    }

    #[must_use]
    pub fn rest(&self) -> &[Episode] {
        &self.playlist[self.latest_count..]
    }

    /// The playlist handed to the player from either section
    #[must_use]
    pub fn playlist(&self) -> Arc<[Episode]> {
        Arc::clone(&self.playlist)
    }

    /// Playlist index of row `row` in the latest section
    #[must_use]
    pub const fn latest_index(&self, row: usize) -> usize {
        row
    }

    /// Playlist index of row `row` in the rest section
    #[must_use]
    pub const fn rest_index(&self, row: usize) -> usize {
        row + self.latest_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.playlist.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::tests::episode;

    fn five() -> Vec<Episode> {
        ["a", "b", "c", "d", "e"].iter().map(|id| episode(id)).collect()
    }

    #[test]
    fn test_split_sections() {
        let listing = HomeListing::new(five(), 2);
        let latest: Vec<_> = listing.latest().iter().map(Episode::id).collect();
        let rest: Vec<_> = listing.rest().iter().map(Episode::id).collect();
        assert_eq!(latest, vec!["a", "b"]);
        assert_eq!(rest, vec!["c", "d", "e"]);
        assert_eq!(listing.playlist().len(), 5);
    }

    #[test]
    fn test_rest_index_is_offset() {
        let listing = HomeListing::new(five(), 2);
        assert_eq!(listing.latest_index(1), 1);
        assert_eq!(listing.rest_index(0), 2);
        assert_eq!(listing.playlist()[listing.rest_index(1)].id(), "d");
    }

    #[test]
    fn test_short_list() {
        let listing = HomeListing::new(vec![episode("a")], 2);
        assert_eq!(listing.latest().len(), 1);
        assert!(listing.rest().is_empty());
        assert_eq!(listing.rest_index(0), 1);
    }

    #[test]
    fn test_playlist_feeds_store() {
        let listing = HomeListing::new(five(), 2);
        let store = crate::PlayerStore::new();
        store.play_list(listing.playlist(), listing.rest_index(2)).unwrap();
        assert_eq!(store.snapshot().current_episode().map(Episode::id), Some("e"));
    }
}
