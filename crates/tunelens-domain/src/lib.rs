// SPDX-License-Identifier: GPL-3.0-or-later
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Value Objects & IDs
// ============================================================================

/// Opaque catalog identifier of a track.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque catalog identifier of an artist.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtistId(pub String);

impl ArtistId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ArtistId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for ArtistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Image {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: None,
            height: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: ArtistId,
    pub name: String,
}

impl ArtistRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ArtistId::new(id),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlbumRef {
    pub id: Option<String>,
    pub name: String,
    pub images: Vec<Image>,
}

impl AlbumRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            images: Vec::new(),
        }
    }

    pub fn has_artwork(&self) -> bool {
        self.images.iter().any(|image| !image.url.trim().is_empty())
    }

    /// URL of the first usable image, if any.
    pub fn cover_url(&self) -> Option<&str> {
        self.images
            .iter()
            .map(|image| image.url.as_str())
            .find(|url| !url.trim().is_empty())
    }
}

// ============================================================================
// Time Dimensions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeDimension {
    Week,
    Month,
    ThreeMonths,
    SixMonths,
    Year,
    AllTime,
}

impl TimeDimension {
    pub const ALL: [TimeDimension; 6] = [
        Self::Week,
        Self::Month,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::Year,
        Self::AllTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::ThreeMonths => "three_months",
            Self::SixMonths => "six_months",
            Self::Year => "year",
            Self::AllTime => "all_time",
        }
    }
}

impl std::fmt::Display for TimeDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown time dimension: {0}")]
pub struct ParseTimeDimensionError(pub String);

impl FromStr for TimeDimension {
    type Err = ParseTimeDimensionError;

    /// Accepts the snake_case tags as well as hyphenated spellings (`all-time`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|dimension| dimension.as_str() == normalized)
            .ok_or_else(|| ParseTimeDimensionError(s.to_string()))
    }
}

/// Concrete interval a [`TimeDimension`] resolves to. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Window length in fractional days; never negative.
    pub fn length_days(&self) -> f64 {
        let seconds = (self.end - self.start).num_seconds().max(0);
        seconds as f64 / 86_400.0
    }
}

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub artists: Vec<ArtistRef>,
    pub album: AlbumRef,
    pub duration_ms: u64,
    pub popularity: Option<u8>,
    pub played_at: Option<DateTime<Utc>>,
    pub added_at: Option<DateTime<Utc>>,
}

impl Track {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: TrackId::new(id),
            name: name.into(),
            artists: Vec::new(),
            album: AlbumRef::default(),
            duration_ms: 0,
            popularity: None,
            played_at: None,
            added_at: None,
        }
    }

    pub fn with_artist(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.artists.push(ArtistRef::new(id, name));
        self
    }

    pub fn with_album(mut self, name: impl Into<String>) -> Self {
        self.album = AlbumRef::new(name);
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_popularity(mut self, popularity: u8) -> Self {
        self.popularity = Some(popularity);
        self
    }

    pub fn with_played_at(mut self, played_at: DateTime<Utc>) -> Self {
        self.played_at = Some(played_at);
        self
    }

    pub fn with_added_at(mut self, added_at: DateTime<Utc>) -> Self {
        self.added_at = Some(added_at);
        self
    }

    pub fn primary_artist(&self) -> Option<&ArtistRef> {
        self.artists.first()
    }

    pub fn is_credited_to(&self, artist_id: &ArtistId) -> bool {
        self.artists.iter().any(|artist| &artist.id == artist_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
    pub genres: Vec<String>,
    pub popularity: Option<u8>,
    pub followers: Option<u64>,
    pub images: Vec<Image>,
}

impl Artist {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ArtistId::new(id),
            name: name.into(),
            genres: Vec::new(),
            popularity: None,
            followers: None,
            images: Vec::new(),
        }
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_popularity(mut self, popularity: u8) -> Self {
        self.popularity = Some(popularity);
        self
    }

    pub fn with_followers(mut self, followers: u64) -> Self {
        self.followers = Some(followers);
        self
    }
}

/// One listen event. Several records may reference the same track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRecord {
    pub track: Track,
    pub played_at: Option<DateTime<Utc>>,
}

impl PlayRecord {
    pub fn new(track: Track, played_at: DateTime<Utc>) -> Self {
        Self {
            track,
            played_at: Some(played_at),
        }
    }
}

// ============================================================================
// Capabilities
// ============================================================================

/// Records that can be placed on the timeline.
pub trait Timestamped {
    /// `played_at` when present, otherwise `added_at`.
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

impl Timestamped for Track {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.played_at.or(self.added_at)
    }
}

impl Timestamped for PlayRecord {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.played_at.or_else(|| self.track.timestamp())
    }
}

/// Records that can be ranked by catalog popularity. Missing popularity ranks as 0.
pub trait Popularity {
    fn popularity_score(&self) -> u8;
}

impl Popularity for Track {
    fn popularity_score(&self) -> u8 {
        self.popularity.unwrap_or(0)
    }
}

impl Popularity for Artist {
    fn popularity_score(&self) -> u8 {
        self.popularity.unwrap_or(0)
    }
}

// ============================================================================
// Derived Views
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreAggregate {
    pub name: String,
    /// Number of artist-genre occurrences.
    pub count: u32,
    pub artists: BTreeSet<ArtistId>,
    pub tracks: BTreeSet<TrackId>,
    pub avg_popularity: f64,
    /// Share of all genre occurrences, 0-100.
    pub percentage: f64,
}

impl GenreAggregate {
    pub fn artist_count(&self) -> usize {
        self.artists.len()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LibraryStats {
    pub total_tracks: usize,
    pub total_artists: usize,
    pub listening_time_hours: f64,
    pub top_genre: Option<String>,
    pub unique_genres: usize,
    pub average_popularity: f64,
    pub recent_tracks_count: usize,
    pub total_plays: usize,
    pub daily_average_minutes: f64,
    pub has_data: bool,
}

impl LibraryStats {
    /// Zero-valued stats with `has_data == false`.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A record paired with the number of listen events that referenced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayCount<T> {
    pub item: T,
    pub plays: usize,
}

// ============================================================================
// Timestamp Parsing
// ============================================================================

/// Parse a timestamp in the shapes catalog payloads use.
///
/// Supported formats:
/// - RFC 3339: `2024-06-01T12:30:00Z`, `2024-06-01T12:30:00.123+02:00`
/// - Naive date-time, read as UTC: `2024-06-01T12:30:00`, `2024-06-01 12:30:00`
/// - Date only, midnight UTC: `2024-06-01`
/// - Epoch milliseconds (at least 10 digits): `1717245000000`
///
/// Returns `None` for anything else, including dates outside 1900-2100.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let parsed = if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        Some(dt.with_timezone(&Utc))
    } else if let Some(naive) = parse_naive_datetime(s) {
        Some(Utc.from_utc_datetime(&naive))
    } else if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        date.and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive))
    } else if s.len() >= 10 && s.chars().all(|c| c.is_ascii_digit()) {
        s.parse::<i64>()
            .ok()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
    } else {
        None
    };

    parsed.filter(|dt| (1900..=2100).contains(&chrono::Datelike::year(dt)))
}

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

// ============================================================================
// Domain Validation
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

pub trait Validate {
    fn validate(&self) -> Result<(), Vec<ValidationError>>;
}

impl Validate for Track {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(ValidationError {
                field: "name",
                message: "name cannot be empty".into(),
            });
        }
        if self.artists.is_empty() {
            errors.push(ValidationError {
                field: "artists",
                message: "track must credit at least one artist".into(),
            });
        }
        if self.duration_ms == 0 {
            errors.push(ValidationError {
                field: "duration_ms",
                message: "duration must be > 0".into(),
            });
        }
        if let Some(p) = self.popularity {
            if p > 100 {
                errors.push(ValidationError {
                    field: "popularity",
                    message: "popularity must be within 0-100".into(),
                });
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Validate for Artist {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(ValidationError {
                field: "name",
                message: "name cannot be empty".into(),
            });
        }
        if let Some(p) = self.popularity {
            if p > 100 {
                errors.push(ValidationError {
                    field: "popularity",
                    message: "popularity must be within 0-100".into(),
                });
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn parse_timestamp_rfc3339_with_offsets() {
        assert_eq!(
            parse_timestamp("2024-06-01T12:30:00Z"),
            Some(at("2024-06-01T12:30:00Z"))
        );
        assert_eq!(
            parse_timestamp("2024-06-01T14:30:00+02:00"),
            Some(at("2024-06-01T12:30:00Z"))
        );
        assert_eq!(
            parse_timestamp("2024-06-01T12:30:00.250Z").map(|dt| dt.timestamp_subsec_millis()),
            Some(250)
        );
    }

    #[test]
    fn parse_timestamp_naive_and_date_only() {
        assert_eq!(
            parse_timestamp("2024-06-01T12:30:00"),
            Some(at("2024-06-01T12:30:00Z"))
        );
        assert_eq!(
            parse_timestamp("2024-06-01 12:30:00"),
            Some(at("2024-06-01T12:30:00Z"))
        );
        assert_eq!(
            parse_timestamp("  2024-06-01 "),
            Some(at("2024-06-01T00:00:00Z"))
        );
    }

    #[test]
    fn parse_timestamp_epoch_millis() {
        assert_eq!(
            parse_timestamp("1717245000000"),
            Some(at("2024-06-01T12:30:00Z"))
        );
        // Too short to be a millisecond timestamp
        assert!(parse_timestamp("2024").is_none());
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-02-30").is_none());
        assert!(parse_timestamp("2024-13-01T00:00:00Z").is_none());
        assert!(parse_timestamp("1850-01-01T00:00:00Z").is_none());
    }

    #[test]
    fn time_dimension_round_trips_through_str() {
        for dimension in TimeDimension::ALL {
            assert_eq!(dimension.as_str().parse::<TimeDimension>(), Ok(dimension));
        }
        assert_eq!("All-Time".parse::<TimeDimension>(), Ok(TimeDimension::AllTime));
        let err = "fortnight".parse::<TimeDimension>().unwrap_err();
        assert_eq!(err.to_string(), "unknown time dimension: fortnight");
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn time_dimension_serializes_snake_case() {
        let json = serde_json::to_string(&TimeDimension::ThreeMonths).unwrap();
        assert_eq!(json, "\"three_months\"");
    }

    #[test]
    fn time_window_includes_both_bounds() {
        let start = at("2024-06-01T00:00:00Z");
        let end = at("2024-06-08T00:00:00Z");
        let window = TimeWindow::new(start, end);

        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(!window.contains(start - Duration::milliseconds(1)));
        assert!(!window.contains(end + Duration::milliseconds(1)));
        assert!((window.length_days() - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn play_record_timestamp_falls_back_to_track() {
        let added = at("2024-05-01T00:00:00Z");
        let track = Track::new("t1", "Song").with_added_at(added);

        let record = PlayRecord {
            track: track.clone(),
            played_at: None,
        };
        assert_eq!(record.timestamp(), Some(added));

        let played = at("2024-06-01T00:00:00Z");
        assert_eq!(PlayRecord::new(track, played).timestamp(), Some(played));
    }

    #[test]
    fn track_timestamp_prefers_played_at() {
        let played = at("2024-06-01T00:00:00Z");
        let added = at("2024-01-01T00:00:00Z");
        let track = Track::new("t1", "Song")
            .with_added_at(added)
            .with_played_at(played);
        assert_eq!(track.timestamp(), Some(played));
        assert_eq!(Track::new("t2", "Bare").timestamp(), None);
    }

    #[test]
    fn popularity_defaults_to_zero() {
        assert_eq!(Track::new("t1", "Song").popularity_score(), 0);
        assert_eq!(Artist::new("a1", "Band").with_popularity(42).popularity_score(), 42);
    }

    #[test]
    fn track_validation_flags_missing_artists_and_duration() {
        let errs = Track::new("t1", "Song").validate().unwrap_err();
        assert!(errs.iter().any(|e| e.field == "artists"));
        assert!(errs.iter().any(|e| e.field == "duration_ms"));

        let ok = Track::new("t2", "Song")
            .with_artist("a1", "Band")
            .with_duration_ms(180_000)
            .with_popularity(50);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn artist_validation_rejects_out_of_range_popularity() {
        let errs = Artist::new("a1", " ").with_popularity(101).validate().unwrap_err();
        assert_eq!(errs.len(), 2);
        assert!(errs.iter().any(|e| e.field == "popularity"));
    }

    #[test]
    fn album_cover_url_skips_blank_images() {
        let mut album = AlbumRef::new("Album");
        assert!(!album.has_artwork());
        album.images.push(Image::new(""));
        album.images.push(Image::new("https://img/cover.jpg"));
        assert!(album.has_artwork());
        assert_eq!(album.cover_url(), Some("https://img/cover.jpg"));
    }

    #[test]
    fn empty_stats_have_no_data() {
        let stats = LibraryStats::empty();
        assert!(!stats.has_data);
        assert_eq!(stats.total_tracks, 0);
        assert_eq!(stats.top_genre, None);
    }
}
