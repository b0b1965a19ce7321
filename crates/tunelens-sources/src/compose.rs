// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tunelens_config::{AppConfig, CatalogConfig, MetadataConfig, SourceMode};
use tunelens_metadata::{AlbumArtResolver, ImageSize, LastFmClient};

use crate::auth::{AuthProvider, CatalogTokenBackend, FixtureAuth, LiveAuth};
use crate::catalog::HttpCatalogClient;
use crate::data_source::{DataSource, Result};
use crate::enrichment::ArtworkEnricher;
use crate::fixture::FixtureDataSource;
use crate::live::LiveDataSource;

/// The data and auth strategies the application runs with.
#[derive(Clone)]
pub struct Composition {
    pub mode: SourceMode,
    pub data_source: Arc<dyn DataSource>,
    pub auth: Arc<dyn AuthProvider>,
}

/// Pick and build the strategy pair named by `source.mode`.
pub fn compose(config: &AppConfig) -> Result<Composition> {
    let composition = match config.source.mode {
        SourceMode::Fixture => compose_fixture(config)?,
        SourceMode::Live => compose_live(&config.catalog)?,
    };
    info!(
        target: "data-source",
        mode = ?composition.mode,
        source = composition.data_source.name(),
        "data source composed"
    );
    Ok(composition)
}

fn compose_fixture(config: &AppConfig) -> Result<Composition> {
    let mut source = FixtureDataSource::bundled()?
        .with_latency(Duration::from_millis(config.source.fixture_latency_ms));
    if let Some(resolver) = album_art_resolver(&config.metadata) {
        source = source.with_artwork(ArtworkEnricher::new(resolver));
    }

    let auth = FixtureAuth::new(
        source.dataset().user.clone(),
        Duration::from_millis(config.source.auth_delay_ms),
    );

    Ok(Composition {
        mode: SourceMode::Fixture,
        data_source: Arc::new(source),
        auth: Arc::new(auth),
    })
}

fn compose_live(config: &CatalogConfig) -> Result<Composition> {
    if config.access_token.is_none() {
        warn!(target: "data-source", "live mode without catalog.access_token; requests will be rejected");
    }

    let catalog = Arc::new(
        HttpCatalogClient::builder()
            .base_url(config.base_url.clone())
            .access_token(config.access_token.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .cache_ttl(Duration::from_secs(config.cache_ttl_secs))
            .cache_capacity(config.cache_capacity)
            .build()?,
    );

    Ok(Composition {
        mode: SourceMode::Live,
        data_source: Arc::new(LiveDataSource::new(catalog.clone())),
        auth: Arc::new(LiveAuth::new(Arc::new(CatalogTokenBackend::new(catalog)))),
    })
}

/// Artwork resolver over Last.fm, when an API key is configured.
pub fn album_art_resolver(config: &MetadataConfig) -> Option<AlbumArtResolver> {
    let api_key = config.lastfm.api_key.clone()?;
    let client = LastFmClient::new_with_limits_and_base_url(
        api_key,
        config.lastfm.max_concurrent_requests,
        config.lastfm.base_url.clone(),
    );

    let size = config.image_size.parse().unwrap_or_else(|_| {
        warn!(target: "album-art", size = %config.image_size, "unknown image size, using extralarge");
        ImageSize::ExtraLarge
    });

    let mut resolver = AlbumArtResolver::new(Arc::new(client)).with_size(size);
    if let Some(placeholder) = &config.placeholder_image {
        resolver = resolver.with_placeholder(placeholder.clone());
    }
    Some(resolver)
}
