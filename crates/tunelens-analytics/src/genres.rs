// SPDX-License-Identifier: GPL-3.0-or-later
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use tracing::debug;
use tunelens_domain::{Artist, ArtistId, GenreAggregate, Popularity, Track, TrackId};

#[derive(Default)]
struct GenreAccumulator {
    occurrences: u32,
    artists: BTreeSet<ArtistId>,
    popularity_sum: u64,
}

pub fn analyze_genres(artists: &[Artist]) -> Vec<GenreAggregate> {
    analyze_genres_with_tracks(artists, &[])
}

/// Roll artist genres up into per-genre aggregates, most frequent first.
///
/// Every genre label on every artist counts as one occurrence; an artist with
/// three genres feeds three aggregates at full weight. Blank or whitespace-only
/// strings are not labels and are skipped here and in `compute_stats` alike.
/// Ties keep the order in which the genres were first seen. Tracks are
/// attributed to a genre when any of their credited artists contributed to it.
pub fn analyze_genres_with_tracks(artists: &[Artist], tracks: &[Track]) -> Vec<GenreAggregate> {
    let mut order: Vec<&str> = Vec::new();
    let mut accumulators: HashMap<&str, GenreAccumulator> = HashMap::new();

    for artist in artists {
        for genre in genre_labels(artist) {
            let acc = accumulators.entry(genre.as_str()).or_insert_with(|| {
                order.push(genre.as_str());
                GenreAccumulator::default()
            });
            acc.occurrences += 1;
            acc.artists.insert(artist.id.clone());
            acc.popularity_sum += u64::from(artist.popularity_score());
        }
    }

    let total_occurrences: u32 = accumulators.values().map(|acc| acc.occurrences).sum();

    let mut tracks_by_artist: HashMap<&ArtistId, Vec<&TrackId>> = HashMap::new();
    for track in tracks {
        for credit in &track.artists {
            tracks_by_artist.entry(&credit.id).or_default().push(&track.id);
        }
    }

    let mut aggregates: Vec<GenreAggregate> = order
        .into_iter()
        .filter_map(|name| {
            let acc = accumulators.remove(name)?;
            let tracks = acc
                .artists
                .iter()
                .filter_map(|artist_id| tracks_by_artist.get(artist_id))
                .flatten()
                .map(|track_id| (*track_id).clone())
                .collect();

            Some(GenreAggregate {
                name: name.to_string(),
                count: acc.occurrences,
                avg_popularity: ratio(acc.popularity_sum as f64, f64::from(acc.occurrences)),
                percentage: 100.0
                    * ratio(f64::from(acc.occurrences), f64::from(total_occurrences)),
                artists: acc.artists,
                tracks,
            })
        })
        .collect();

    aggregates.sort_by_key(|aggregate| Reverse(aggregate.count));

    debug!(
        target: "analytics",
        artists = artists.len(),
        genres = aggregates.len(),
        occurrences = total_occurrences,
        "genre analysis complete"
    );

    aggregates
}

/// The artist's genre labels, without blank entries.
pub(crate) fn genre_labels(artist: &Artist) -> impl Iterator<Item = &String> {
    artist.genres.iter().filter(|genre| !genre.trim().is_empty())
}

pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
