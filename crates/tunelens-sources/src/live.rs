// SPDX-License-Identifier: GPL-3.0-or-later

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use tunelens_domain::{Artist, GenreAggregate, LibraryStats, PlayRecord, TimeDimension, Track};

use crate::catalog::CatalogClient;
use crate::data_source::{DataSource, Result};

/// Data source backed by the remote catalog.
///
/// `stats` and `genre_analysis` return empty placeholders: this source holds
/// no local record set to aggregate. Fetch the raw records through it and run
/// them through `tunelens_analytics` (which is what `Dashboard` does).
pub struct LiveDataSource {
    catalog: Arc<dyn CatalogClient>,
}

impl LiveDataSource {
    pub fn new(catalog: Arc<dyn CatalogClient>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl DataSource for LiveDataSource {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn top_tracks(
        &self,
        limit: usize,
        time_range: Option<TimeDimension>,
    ) -> Result<Vec<Track>> {
        Ok(self.catalog.top_tracks(limit, time_range).await?)
    }

    async fn top_artists(
        &self,
        limit: usize,
        time_range: Option<TimeDimension>,
    ) -> Result<Vec<Artist>> {
        Ok(self.catalog.top_artists(limit, time_range).await?)
    }

    async fn recently_played(&self, limit: usize) -> Result<Vec<PlayRecord>> {
        Ok(self.catalog.recently_played(limit).await?)
    }

    async fn stats(&self) -> Result<LibraryStats> {
        Ok(LibraryStats::empty())
    }

    async fn genre_analysis(&self) -> Result<Vec<GenreAggregate>> {
        Ok(Vec::new())
    }

    fn clear_cache(&self) {
        debug!(target: "data-source", source = "live", "cache cleared");
        self.catalog.clear_cache();
    }
}
