// SPDX-License-Identifier: GPL-3.0-or-later

use async_trait::async_trait;
use tunelens_domain::{Artist, GenreAggregate, LibraryStats, PlayRecord, TimeDimension, Track};

use crate::error::SourceError;

pub type Result<T> = std::result::Result<T, SourceError>;

/// Where the dashboard's records come from.
///
/// Implementations are chosen when the application is composed and are used
/// only through this trait. `limit == 0` always yields an empty list.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Short label for logs and output.
    fn name(&self) -> &'static str;

    async fn top_tracks(&self, limit: usize, time_range: Option<TimeDimension>)
        -> Result<Vec<Track>>;

    async fn top_artists(
        &self,
        limit: usize,
        time_range: Option<TimeDimension>,
    ) -> Result<Vec<Artist>>;

    /// Most recent listen events, newest first.
    async fn recently_played(&self, limit: usize) -> Result<Vec<PlayRecord>>;

    async fn stats(&self) -> Result<LibraryStats>;

    async fn genre_analysis(&self) -> Result<Vec<GenreAggregate>>;

    fn clear_cache(&self);

    /// Fill in missing album artwork. Sources without an artwork lookup
    /// return their input unchanged.
    async fn enrich_tracks(&self, tracks: Vec<Track>) -> Vec<Track> {
        tracks
    }

    async fn enrich_play_records(&self, records: Vec<PlayRecord>) -> Vec<PlayRecord> {
        records
    }
}
