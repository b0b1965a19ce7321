// SPDX-License-Identifier: GPL-3.0-or-later

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tunelens_analytics::{
    analyze_genres_with_tracks, compute_stats_at, filter_by_window_at, top_by_popularity,
};
use tunelens_domain::{
    Artist, ArtistId, GenreAggregate, LibraryStats, PlayRecord, TimeDimension, Track, TrackId,
};

use crate::catalog::UserProfile;
use crate::data_source::{DataSource, Result};
use crate::enrichment::ArtworkEnricher;
use crate::error::SourceError;
use crate::ingest::{normalize_artists, normalize_tracks, RawArtist, RawTimestamp, RawTrack};

const BUNDLED_DATASET: &str = include_str!("../fixtures/dataset.json");

#[derive(Debug, Deserialize)]
struct FixtureFile {
    anchor: String,
    user: UserProfile,
    #[serde(default)]
    artists: Vec<RawArtist>,
    #[serde(default)]
    tracks: Vec<RawTrack>,
    #[serde(default)]
    recently_played: Vec<FixturePlay>,
}

#[derive(Debug, Deserialize)]
struct FixturePlay {
    track_id: String,
    played_at: Option<RawTimestamp>,
}

/// A deterministic listening history.
///
/// All timestamps are relative to `anchor`; [`FixtureDataset::rebased`] moves
/// the whole history so that `anchor` lands on a chosen instant.
#[derive(Debug, Clone)]
pub struct FixtureDataset {
    pub anchor: DateTime<Utc>,
    pub user: UserProfile,
    pub artists: Vec<Artist>,
    pub tracks: Vec<Track>,
    /// Newest first.
    pub plays: Vec<PlayRecord>,
}

impl FixtureDataset {
    /// The dataset shipped with the crate, at its recorded anchor.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_DATASET)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: FixtureFile = serde_json::from_str(json)?;
        let anchor = tunelens_domain::parse_timestamp(&file.anchor)
            .ok_or_else(|| SourceError::InvalidFixture(format!("bad anchor {:?}", file.anchor)))?;

        let artists = normalize_artists(file.artists);
        let tracks = normalize_tracks(file.tracks);

        let mut plays: Vec<PlayRecord> = {
            let by_id: HashMap<&TrackId, &Track> =
                tracks.iter().map(|track| (&track.id, track)).collect();
            file.recently_played
                .into_iter()
                .filter_map(|play| {
                    let id = TrackId::new(play.track_id);
                    let Some(track) = by_id.get(&id) else {
                        debug!(target: "data-source", track_id = %id, "fixture play references unknown track");
                        return None;
                    };
                    Some(PlayRecord {
                        track: (*track).clone(),
                        played_at: play.played_at.as_ref().and_then(RawTimestamp::resolve),
                    })
                })
                .collect()
        };
        plays.sort_by_key(|play| Reverse(play.played_at));

        Ok(Self {
            anchor,
            user: file.user,
            artists,
            tracks,
            plays,
        })
    }

    /// Shift every timestamp so the history ends relative to `anchor`.
    pub fn rebased(mut self, anchor: DateTime<Utc>) -> Self {
        let delta = anchor.signed_duration_since(self.anchor);
        let shift = |instant: Option<DateTime<Utc>>| {
            instant.and_then(|instant| instant.checked_add_signed(delta))
        };
        let shift_track = |track: &mut Track| {
            track.played_at = shift(track.played_at);
            track.added_at = shift(track.added_at);
        };

        for track in &mut self.tracks {
            shift_track(track);
        }
        for play in &mut self.plays {
            play.played_at = shift(play.played_at);
            shift_track(&mut play.track);
        }
        self.anchor = anchor;
        self
    }
}

/// Data source over a bundled, deterministic dataset.
///
/// Repeated calls with the same arguments return identical data. Time ranges
/// are resolved against the dataset anchor rather than the wall clock.
pub struct FixtureDataSource {
    dataset: Arc<FixtureDataset>,
    latency: Duration,
    artwork: Option<ArtworkEnricher>,
}

impl FixtureDataSource {
    pub fn new(dataset: FixtureDataset) -> Self {
        Self {
            dataset: Arc::new(dataset),
            latency: Duration::ZERO,
            artwork: None,
        }
    }

    /// The bundled dataset, rebased so its history ends now.
    pub fn bundled() -> Result<Self> {
        Ok(Self::new(FixtureDataset::bundled()?.rebased(Utc::now())))
    }

    pub fn with_anchor(self, anchor: DateTime<Utc>) -> Self {
        let dataset = (*self.dataset).clone().rebased(anchor);
        Self {
            dataset: Arc::new(dataset),
            ..self
        }
    }

    /// Simulated response time of every `DataSource` call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_artwork(mut self, artwork: ArtworkEnricher) -> Self {
        self.artwork = Some(artwork);
        self
    }

    pub fn anchor(&self) -> DateTime<Utc> {
        self.dataset.anchor
    }

    pub fn dataset(&self) -> &FixtureDataset {
        &self.dataset
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn tracks_in_range(&self, time_range: Option<TimeDimension>) -> Vec<Track> {
        match time_range {
            Some(dimension) => filter_by_window_at(&self.dataset.tracks, dimension, self.anchor()),
            None => self.dataset.tracks.clone(),
        }
    }
}

#[async_trait]
impl DataSource for FixtureDataSource {
    fn name(&self) -> &'static str {
        "fixture"
    }

    async fn top_tracks(
        &self,
        limit: usize,
        time_range: Option<TimeDimension>,
    ) -> Result<Vec<Track>> {
        self.simulate_latency().await;
        Ok(top_by_popularity(&self.tracks_in_range(time_range), limit))
    }

    /// With a time range, only artists credited on a track from that range qualify.
    async fn top_artists(
        &self,
        limit: usize,
        time_range: Option<TimeDimension>,
    ) -> Result<Vec<Artist>> {
        self.simulate_latency().await;
        let candidates: Vec<Artist> = match time_range {
            Some(dimension) => {
                let tracks = filter_by_window_at(&self.dataset.tracks, dimension, self.anchor());
                let credited: HashSet<&ArtistId> = tracks
                    .iter()
                    .flat_map(|track| track.artists.iter().map(|artist| &artist.id))
                    .collect();
                self.dataset
                    .artists
                    .iter()
                    .filter(|artist| credited.contains(&artist.id))
                    .cloned()
                    .collect()
            }
            None => self.dataset.artists.clone(),
        };
        Ok(top_by_popularity(&candidates, limit))
    }

    async fn recently_played(&self, limit: usize) -> Result<Vec<PlayRecord>> {
        self.simulate_latency().await;
        Ok(self.dataset.plays.iter().take(limit).cloned().collect())
    }

    async fn stats(&self) -> Result<LibraryStats> {
        self.simulate_latency().await;
        Ok(compute_stats_at(
            &self.dataset.tracks,
            &self.dataset.artists,
            &self.dataset.plays,
            None,
            self.anchor(),
        ))
    }

    async fn genre_analysis(&self) -> Result<Vec<GenreAggregate>> {
        self.simulate_latency().await;
        Ok(analyze_genres_with_tracks(
            &self.dataset.artists,
            &self.dataset.tracks,
        ))
    }

    fn clear_cache(&self) {
        debug!(target: "data-source", source = "fixture", "nothing to clear");
    }

    async fn enrich_tracks(&self, tracks: Vec<Track>) -> Vec<Track> {
        match &self.artwork {
            Some(artwork) => artwork.enrich_tracks(tracks).await,
            None => tracks,
        }
    }

    async fn enrich_play_records(&self, records: Vec<PlayRecord>) -> Vec<PlayRecord> {
        match &self.artwork {
            Some(artwork) => artwork.enrich_play_records(records).await,
            None => records,
        }
    }
}
