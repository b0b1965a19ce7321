// SPDX-License-Identifier: GPL-3.0-or-later

use futures::future::join_all;
use tracing::debug;
use tunelens_domain::{Image, PlayRecord, Track};
use tunelens_metadata::AlbumArtResolver;

/// Fills missing album covers through an [`AlbumArtResolver`].
///
/// Returns new snapshots; tracks that already carry artwork pass through
/// untouched. Lookups for every track run concurrently and the resolver
/// collapses duplicates, so one album costs at most one external call.
#[derive(Clone)]
pub struct ArtworkEnricher {
    resolver: AlbumArtResolver,
}

impl ArtworkEnricher {
    pub fn new(resolver: AlbumArtResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &AlbumArtResolver {
        &self.resolver
    }

    pub async fn enrich_track(&self, mut track: Track) -> Track {
        if track.album.has_artwork() {
            return track;
        }
        let artist = track
            .primary_artist()
            .map(|artist| artist.name.clone())
            .unwrap_or_default();
        let url = self.resolver.resolve(&artist, &track.album.name).await;
        track.album.images = vec![Image::new(url)];
        track
    }

    pub async fn enrich_tracks(&self, tracks: Vec<Track>) -> Vec<Track> {
        let missing = tracks
            .iter()
            .filter(|track| !track.album.has_artwork())
            .count();
        debug!(target: "album-art", total = tracks.len(), missing, "enriching tracks");

        join_all(tracks.into_iter().map(|track| self.enrich_track(track))).await
    }

    pub async fn enrich_play_records(&self, records: Vec<PlayRecord>) -> Vec<PlayRecord> {
        join_all(records.into_iter().map(|record| async move {
            PlayRecord {
                track: self.enrich_track(record.track).await,
                played_at: record.played_at,
            }
        }))
        .await
    }
}
