// SPDX-License-Identifier: GPL-3.0-or-later

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use tunelens_analytics::{
    analyze_genres_with_tracks, compute_stats_at, data_quality_report, filter_in_window,
    most_played_artists, most_played_tracks, resolve_window, DataQualityReport,
};
use tunelens_domain::{
    Artist, ArtistRef, GenreAggregate, LibraryStats, PlayCount, PlayRecord, TimeDimension,
    TimeWindow, Track,
};

use crate::data_source::{DataSource, Result};

/// Records fetched per list before aggregation; the catalog's page size.
pub const AGGREGATION_SAMPLE: usize = 50;

/// Everything the dashboard shows for one time dimension.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub source: &'static str,
    pub dimension: TimeDimension,
    pub window: TimeWindow,
    pub top_tracks: Vec<Track>,
    pub top_artists: Vec<Artist>,
    pub recent_plays: Vec<PlayRecord>,
    pub most_played_tracks: Vec<PlayCount<Track>>,
    pub most_played_artists: Vec<PlayCount<ArtistRef>>,
    pub stats: LibraryStats,
    pub genres: Vec<GenreAggregate>,
    pub quality: DataQualityReport,
}

/// Consumer of a [`DataSource`] that derives statistics locally.
///
/// It never asks the source for `stats` or `genre_analysis`, so it produces
/// the same kind of numbers whichever source it was given.
#[derive(Clone)]
pub struct Dashboard {
    source: Arc<dyn DataSource>,
}

impl Dashboard {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    pub async fn snapshot(&self, dimension: TimeDimension, limit: usize) -> Result<DashboardSnapshot> {
        self.snapshot_at(dimension, limit, Utc::now()).await
    }

    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn snapshot_at(
        &self,
        dimension: TimeDimension,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<DashboardSnapshot> {
        let (tracks, artists, plays) = tokio::try_join!(
            self.source.top_tracks(AGGREGATION_SAMPLE, Some(dimension)),
            self.source.top_artists(AGGREGATION_SAMPLE, Some(dimension)),
            self.source.recently_played(AGGREGATION_SAMPLE),
        )?;

        // Stats see every fetched play: the 30-day count has its own window.
        let stats = compute_stats_at(&tracks, &artists, &plays, Some(dimension), now);

        let window = resolve_window(dimension, now);
        let plays = filter_in_window(&plays, &window);
        debug!(
            target: "data-source",
            tracks = tracks.len(),
            artists = artists.len(),
            plays = plays.len(),
            "building dashboard snapshot"
        );

        let genres = analyze_genres_with_tracks(&artists, &tracks);
        let quality = data_quality_report(&tracks, &artists);
        let most_played_tracks = most_played_tracks(&plays, limit);
        let most_played_artists = most_played_artists(&plays, limit);

        let top_tracks = self
            .source
            .enrich_tracks(tracks.into_iter().take(limit).collect())
            .await;
        let recent_plays = self
            .source
            .enrich_play_records(plays.into_iter().take(limit).collect())
            .await;

        Ok(DashboardSnapshot {
            source: self.source.name(),
            dimension,
            window,
            top_tracks,
            top_artists: artists.into_iter().take(limit).collect(),
            recent_plays,
            most_played_tracks,
            most_played_artists,
            stats,
            genres,
            quality,
        })
    }
}
