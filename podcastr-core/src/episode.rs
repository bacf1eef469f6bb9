//! Episode records as served by the catalog, and their display-ready form.

use crate::error::{CoreError, Result};
use crate::time::format_clock;
use chrono::{DateTime, Locale, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Episode record exactly as the catalog API returns it.
///
/// Unknown fields are ignored by serde.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEpisode {
    pub id: String,
    pub title: String,
    pub members: String,
    pub thumbnail: String,
    #[serde(default)]
    pub description: String,
    pub published_at: String,
    pub file: RawEpisodeFile,
}

/// Nested audio file descriptor of a [`RawEpisode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEpisodeFile {
    pub url: String,
    #[serde(default, rename = "type")]
    pub mime_type: Option<String>,
    /// Duration in seconds; the API sends a numeric string but plain numbers are accepted
    pub duration: RawDuration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDuration {
    Number(f64),
    Text(String),
}

impl RawDuration {
    fn to_duration(&self) -> Option<Duration> {
        let secs: f64 = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().ok()?,
        };
        Duration::try_from_secs_f64(secs).ok()
    }
}

/// How dates are rendered for display.
#[derive(Debug, Clone)]
pub struct DisplayOptions {
    locale: Locale,
    date_format: String,
}

impl DisplayOptions {
    #[must_use]
    pub fn new(locale: Locale, date_format: impl Into<String>) -> Self {
        Self {
            locale,
            date_format: date_format.into(),
        }
    }

    /// Format a catalog timestamp for display.
    ///
    /// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD`.
    /// The wall-clock date as written is kept; offsets are not converted.
    #[must_use]
    pub fn format_date(&self, published_at: &str) -> Option<String> {
        let naive = parse_timestamp(published_at)?;
        Some(
            Utc.from_utc_datetime(&naive)
                .format_localized(&self.date_format, self.locale)
                .to_string(),
        )
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self::new(Locale::pt_BR, "%-d %b %y")
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// A playable episode with precomputed display strings.
///
/// Immutable once built; shared freely between the listing and the player.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    id: String,
    title: String,
    members: String,
    thumbnail_url: String,
    audio_url: String,
    description: String,
    duration: Duration,
    duration_display: String,
    published_at_display: String,
}

impl Episode {
    /// Normalize a catalog record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRecord`] when the duration is not a non-negative number
    /// or the publication date cannot be parsed.
    pub fn from_raw(raw: RawEpisode, display: &DisplayOptions) -> Result<Self> {
        let Some(duration) = raw.file.duration.to_duration() else {
            return Err(CoreError::InvalidRecord {
                id: raw.id,
                reason: format!("invalid duration {:?}", raw.file.duration),
            });
        };
        let Some(published_at_display) = display.format_date(&raw.published_at) else {
            return Err(CoreError::InvalidRecord {
                id: raw.id,
                reason: format!("invalid published_at '{}'", raw.published_at),
            });
        };
        Ok(Self {
            duration_display: format_clock(duration.as_secs()),
            published_at_display,
            id: raw.id,
            title: raw.title,
            members: raw.members,
            thumbnail_url: raw.thumbnail,
            audio_url: raw.file.url,
            description: raw.description,
            duration,
        })
    }

    /// Build an episode directly, formatting the duration.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        audio_url: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            members: String::new(),
            thumbnail_url: String::new(),
            audio_url: audio_url.into(),
            description: String::new(),
            duration,
            duration_display: format_clock(duration.as_secs()),
            published_at_display: String::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn members(&self) -> &str {
        &self.members
    }

    #[must_use]
    pub fn thumbnail_url(&self) -> &str {
        &self.thumbnail_url
    }

    #[must_use]
    pub fn audio_url(&self) -> &str {
        &self.audio_url
    }

    /// HTML show notes, only shown on the detail view
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    #[must_use]
    pub fn duration_seconds(&self) -> u64 {
        self.duration.as_secs()
    }

    #[must_use]
    pub fn duration_display(&self) -> &str {
        &self.duration_display
    }

    #[must_use]
    pub fn published_at_display(&self) -> &str {
        &self.published_at_display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(duration: RawDuration, published_at: &str) -> RawEpisode {
        RawEpisode {
            id: "a-importancia-da-contribuicao-em-open-source".into(),
            title: "Faladev #30".into(),
            members: "Diego, Richard".into(),
            thumbnail: "https://example.com/thumb.jpg".into(),
            description: "<p>notes</p>".into(),
            published_at: published_at.into(),
            file: RawEpisodeFile {
                url: "https://example.com/ep.m4a".into(),
                mime_type: Some("audio/x-m4a".into()),
                duration,
            },
        }
    }

    fn english() -> DisplayOptions {
        DisplayOptions::new(Locale::en_US, "%-d %b %y")
    }

    #[test]
    fn test_from_raw_formats_fields() {
        let episode = Episode::from_raw(
            raw(RawDuration::Text("3981".into()), "2021-01-08 11:00:00"),
            &english(),
        )
        .unwrap();

        assert_eq!(episode.id(), "a-importancia-da-contribuicao-em-open-source");
        assert_eq!(episode.audio_url(), "https://example.com/ep.m4a");
        assert_eq!(episode.thumbnail_url(), "https://example.com/thumb.jpg");
        assert_eq!(episode.duration_seconds(), 3981);
        assert_eq!(episode.duration_display(), "01:06:21");
        assert_eq!(episode.published_at_display(), "8 Jan 21");
        assert_eq!(episode.description(), "<p>notes</p>");
    }

    #[test]
    fn test_from_raw_accepts_numeric_duration() {
        let episode =
            Episode::from_raw(raw(RawDuration::Number(94.0), "2021-01-08"), &english()).unwrap();
        assert_eq!(episode.duration_display(), "00:01:34");
    }

    #[test]
    fn test_from_raw_accepts_rfc3339() {
        let episode = Episode::from_raw(
            raw(RawDuration::Number(1.0), "2021-03-15T23:30:00-03:00"),
            &english(),
        )
        .unwrap();
        assert_eq!(episode.published_at_display(), "15 Mar 21");
    }

    #[test]
    fn test_from_raw_rejects_bad_duration() {
        let err = Episode::from_raw(raw(RawDuration::Text("abc".into()), "2021-01-08"), &english())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidRecord { .. }));

        let err = Episode::from_raw(raw(RawDuration::Number(-1.0), "2021-01-08"), &english())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidRecord { .. }));
    }

    #[test]
    fn test_from_raw_rejects_bad_date() {
        let err = Episode::from_raw(raw(RawDuration::Number(1.0), "yesterday"), &english())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidRecord { .. }));
    }

    #[test]
    fn test_raw_episode_deserializes_api_shape() {
        let json = r#"{
            "id": "ep-1",
            "title": "Title",
            "members": "A, B",
            "published_at": "2021-01-22 19:20:09",
            "thumbnail": "https://example.com/t.jpg",
            "description": "<p>x</p>",
            "file": { "url": "https://example.com/a.m4a", "type": "audio/x-m4a", "duration": "1254" },
            "extra": true
        }"#;
        let parsed: RawEpisode = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.file.duration, RawDuration::Text("1254".into()));
        assert_eq!(parsed.file.mime_type.as_deref(), Some("audio/x-m4a"));
    }

    #[test]
    fn test_new_precomputes_duration_display() {
        let episode = Episode::new("x", "X", "https://example.com/x.mp3", Duration::from_secs(3600));
        assert_eq!(episode.duration_display(), "01:00:00");
        assert!(episode.published_at_display().is_empty());
    }
}
