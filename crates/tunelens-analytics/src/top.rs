// SPDX-License-Identifier: GPL-3.0-or-later
use std::cmp::Reverse;
use std::collections::HashMap;
use std::hash::Hash;

use tunelens_domain::{ArtistRef, PlayCount, PlayRecord, Popularity, Track};

/// Highest-popularity items first, at most `limit` of them.
///
/// The sort is stable: items with equal popularity keep their input order.
pub fn top_by_popularity<T>(items: &[T], limit: usize) -> Vec<T>
where
    T: Popularity + Clone,
{
    if limit == 0 {
        return Vec::new();
    }

    let mut ranked = items.to_vec();
    ranked.sort_by_key(|item| Reverse(item.popularity_score()));
    ranked.truncate(limit);
    ranked
}

/// Tracks ordered by how many play records reference them.
pub fn most_played_tracks(play_records: &[PlayRecord], limit: usize) -> Vec<PlayCount<Track>> {
    rank_by_plays(
        play_records
            .iter()
            .map(|record| (record.track.id.clone(), record.track.clone())),
        limit,
    )
}

/// Artists ordered by plays; a play counts once for every artist credited on the track.
pub fn most_played_artists(
    play_records: &[PlayRecord],
    limit: usize,
) -> Vec<PlayCount<ArtistRef>> {
    rank_by_plays(
        play_records
            .iter()
            .flat_map(|record| record.track.artists.iter())
            .map(|artist| (artist.id.clone(), artist.clone())),
        limit,
    )
}

fn rank_by_plays<K, V>(entries: impl Iterator<Item = (K, V)>, limit: usize) -> Vec<PlayCount<V>>
where
    K: Eq + Hash,
{
    if limit == 0 {
        return Vec::new();
    }

    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<PlayCount<V>> = Vec::new();

    for (key, item) in entries {
        match positions.get(&key) {
            Some(&index) => counts[index].plays += 1,
            None => {
                positions.insert(key, counts.len());
                counts.push(PlayCount { item, plays: 1 });
            }
        }
    }

    counts.sort_by_key(|count| Reverse(count.plays));
    counts.truncate(limit);
    counts
}
