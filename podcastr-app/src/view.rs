//! Plain-text rendering of the listing, episode details and player status.

use podcastr_core::{DurationExt, Episode, HomeListing, PlaybackState, Progress};
use std::fmt::Write;

/// Render both listing sections with row numbers matching `play <row>`.
#[must_use]
pub fn render_listing(listing: &HomeListing) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Latest releases");
    for (row, episode) in listing.latest().iter().enumerate() {
        let _ = writeln!(out, "{}", render_row(listing.latest_index(row) + 1, episode));
    }

    let _ = writeln!(out, "\nAll episodes");
    for (row, episode) in listing.rest().iter().enumerate() {
        let _ = writeln!(out, "{}", render_row(listing.rest_index(row) + 1, episode));
    }

    if listing.is_empty() {
        let _ = writeln!(out, "  (no episodes)");
    }
    out
}

fn render_row(number: usize, episode: &Episode) -> String {
    format!(
        "{number:>3}. {}  [{}]  {}  {}",
        episode.title(),
        episode.members(),
        episode.published_at_display(),
        episode.duration_display()
    )
}

/// Render the detail view of one episode.
#[must_use]
pub fn render_episode(episode: &Episode) -> String {
    format!(
        "{}\n{}  |  {}  |  {} ({} s)\n{}\n{}",
        episode.title(),
        episode.members(),
        episode.published_at_display(),
        episode.duration_display(),
        episode.duration_seconds(),
        episode.thumbnail_url(),
        episode.description()
    )
}

/// Render what the player is doing.
#[must_use]
pub fn render_status(state: &PlaybackState, progress: Progress) -> String {
    let Some(episode) = state.current_episode() else {
        return "Nothing playing. Pick an episode with 'play <row>'.".to_string();
    };

    let position = state.current_index().map_or(0, |i| i + 1);
    let mut flags = Vec::new();
    if state.is_looping() {
        flags.push("loop");
    }
    if state.is_shuffling() {
        flags.push("shuffle");
    }

    let mut out = format!(
        "{} {} ({}/{})\n{}  ({} left)",
        if state.is_playing() { "Playing" } else { "Paused" },
        episode.title(),
        position,
        state.episodes().len(),
        progress,
        progress.remaining().to_clock_string()
    );
    if !flags.is_empty() {
        let _ = write!(out, "  [{}]", flags.join(", "));
    }
    let _ = write!(
        out,
        "\nnext: {}  previous: {}",
        if state.has_next() { "yes" } else { "no" },
        if state.has_previous() { "yes" } else { "no" }
    );
    out
}
