// SPDX-License-Identifier: GPL-3.0-or-later
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use tunelens_domain::{
    Artist, LibraryStats, PlayRecord, TimeDimension, TimeWindow, Timestamped, Track,
};

use crate::filter::filter_in_window;
use crate::genres::{genre_labels, ratio};
use crate::window::resolve_window;

/// Length of the trailing window `recent_tracks_count` is measured over.
pub const RECENT_WINDOW_DAYS: i64 = 30;

const MS_PER_HOUR: f64 = 3_600_000.0;
const MS_PER_MINUTE: f64 = 60_000.0;

pub fn compute_stats(
    tracks: &[Track],
    artists: &[Artist],
    play_records: &[PlayRecord],
    dimension: Option<TimeDimension>,
) -> LibraryStats {
    compute_stats_at(tracks, artists, play_records, dimension, Utc::now())
}

/// Library-wide statistics evaluated at `now`.
///
/// `dimension` only scopes `daily_average_minutes`; without one the trailing
/// 30-day window is used. Returns [`LibraryStats::empty`] when there are
/// neither tracks nor artists.
pub fn compute_stats_at(
    tracks: &[Track],
    artists: &[Artist],
    play_records: &[PlayRecord],
    dimension: Option<TimeDimension>,
    now: DateTime<Utc>,
) -> LibraryStats {
    if tracks.is_empty() && artists.is_empty() {
        return LibraryStats::empty();
    }

    let unique_artists: HashSet<_> = artists.iter().map(|artist| &artist.id).collect();
    let unique_genres: HashSet<_> = artists.iter().flat_map(genre_labels).collect();

    let total_duration_ms: u64 = tracks.iter().map(|track| track.duration_ms).sum();
    let popularity_sum: u64 = tracks
        .iter()
        .map(|track| u64::from(track.popularity.unwrap_or(0)))
        .sum();

    let recent_window = TimeWindow::new(now - Duration::days(RECENT_WINDOW_DAYS), now);
    let recent_tracks_count = play_records
        .iter()
        .filter(|record| {
            record
                .timestamp()
                .is_some_and(|instant| recent_window.contains(instant))
        })
        .count();

    let average_window = dimension
        .map(|dimension| resolve_window(dimension, now))
        .unwrap_or(recent_window);
    let window_minutes: f64 = filter_in_window(play_records, &average_window)
        .iter()
        .map(|record| record.track.duration_ms as f64 / MS_PER_MINUTE)
        .sum();

    let stats = LibraryStats {
        total_tracks: tracks.len(),
        total_artists: unique_artists.len(),
        listening_time_hours: total_duration_ms as f64 / MS_PER_HOUR,
        top_genre: top_genre(artists),
        unique_genres: unique_genres.len(),
        average_popularity: ratio(popularity_sum as f64, tracks.len() as f64),
        recent_tracks_count,
        total_plays: play_records.len(),
        daily_average_minutes: ratio(window_minutes, average_window.length_days()),
        has_data: true,
    };

    debug!(
        target: "analytics",
        tracks = stats.total_tracks,
        artists = stats.total_artists,
        plays = stats.total_plays,
        "library stats computed"
    );

    stats
}

/// Genre with the most occurrences; the first one seen wins a tie.
fn top_genre(artists: &[Artist]) -> Option<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, u32> = HashMap::new();

    for genre in artists.iter().flat_map(genre_labels) {
        *counts.entry(genre.as_str()).or_insert_with(|| {
            order.push(genre.as_str());
            0
        }) += 1;
    }

    let mut best: Option<(&str, u32)> = None;
    for name in order {
        let count = counts.get(name).copied().unwrap_or(0);
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((name, count));
        }
    }

    best.map(|(name, _)| name.to_string())
}
