// SPDX-License-Identifier: GPL-3.0-or-later

use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

use crate::lastfm::{ImageSize, LastFmClient, LastFmError};

pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "/images/album-placeholder.svg";

const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

#[derive(Debug, Error)]
pub enum AlbumArtError {
    #[error("Last.fm lookup failed: {0}")]
    LastFm(#[from] LastFmError),
    #[error("No artwork found for {artist} - {album}")]
    NotFound { artist: String, album: String },
    #[error("{0}")]
    Other(String),
}

/// A remote service able to turn `(artist, album)` into a cover image URL.
#[async_trait]
pub trait AlbumArtLookup: Send + Sync {
    async fn lookup(
        &self,
        artist: &str,
        album: &str,
        size: ImageSize,
    ) -> Result<String, AlbumArtError>;
}

#[async_trait]
impl AlbumArtLookup for LastFmClient {
    async fn lookup(
        &self,
        artist: &str,
        album: &str,
        size: ImageSize,
    ) -> Result<String, AlbumArtError> {
        self.fetch_album_image(artist, album, size)
            .await?
            .ok_or_else(|| AlbumArtError::NotFound {
                artist: artist.to_string(),
                album: album.to_string(),
            })
    }
}

/// Cache key for an album: NFKC-normalized, lowercased, whitespace collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlbumKey {
    artist: String,
    album: String,
}

impl AlbumKey {
    pub fn new(artist: &str, album: &str) -> Self {
        Self {
            artist: normalize(artist),
            album: normalize(album),
        }
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn album(&self) -> &str {
        &self.album
    }
}

fn normalize(value: &str) -> String {
    let folded: String = value.nfkc().collect::<String>().to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Memoizing front for an [`AlbumArtLookup`].
///
/// Concurrent `resolve` calls for the same album share one lookup. Failures
/// resolve to the placeholder and are not cached, so a later call retries.
#[derive(Clone)]
pub struct AlbumArtResolver {
    lookup: Arc<dyn AlbumArtLookup>,
    size: ImageSize,
    placeholder: String,
    cache: Cache<AlbumKey, String>,
}

impl AlbumArtResolver {
    pub fn new(lookup: Arc<dyn AlbumArtLookup>) -> Self {
        Self {
            lookup,
            size: ImageSize::ExtraLarge,
            placeholder: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
            cache: Cache::builder()
                .max_capacity(DEFAULT_CACHE_CAPACITY)
                .build(),
        }
    }

    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub async fn resolve(&self, artist: &str, album: &str) -> String {
        if artist.trim().is_empty() || album.trim().is_empty() {
            return self.placeholder.clone();
        }

        let key = AlbumKey::new(artist, album);
        let lookup = Arc::clone(&self.lookup);
        let size = self.size;

        let result = self
            .cache
            .try_get_with(key.clone(), async move {
                debug!(target: "album-art", artist, album, "looking up album art");
                lookup.lookup(artist, album, size).await
            })
            .await;

        match result {
            Ok(url) => url,
            Err(error) => {
                warn!(
                    target: "album-art",
                    artist = key.artist(),
                    album = key.album(),
                    "album art lookup failed: {}",
                    error
                );
                self.placeholder.clone()
            }
        }
    }

    /// Cached URL for an album, without triggering a lookup.
    pub fn cached(&self, artist: &str, album: &str) -> Option<String> {
        self.cache.get(&AlbumKey::new(artist, album))
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}
