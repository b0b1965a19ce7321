// SPDX-License-Identifier: GPL-3.0-or-later

//! Last.fm API client implementation

use moka::sync::Cache;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, instrument};

const LASTFM_API_BASE: &str = "https://ws.audioscrobbler.com/2.0";

/// Image sizes Last.fm publishes, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImageSize {
    Small,
    Medium,
    Large,
    ExtraLarge,
    Mega,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::ExtraLarge => "extralarge",
            Self::Mega => "mega",
        }
    }
}

impl FromStr for ImageSize {
    type Err = LastFmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            "extralarge" | "extra_large" | "xl" => Ok(Self::ExtraLarge),
            "mega" => Ok(Self::Mega),
            other => Err(LastFmError::UnknownImageSize(other.to_string())),
        }
    }
}

/// Struct representing the Last.fm API client.
pub struct LastFmClient {
    api_key: String,
    client: Client,
    base_url: String,
    rate_limiter: Arc<Semaphore>,
    cache_album: Cache<String, AlbumInfo>,
}

impl LastFmClient {
    /// Creates a new Last.fm API client.
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self::new_with_limits_and_base_url(api_key, 1, base_url)
    }

    /// Creates a new Last.fm API client allowing `max_concurrent_requests` in flight.
    pub fn new_with_limits(api_key: String, max_concurrent_requests: usize) -> Self {
        Self::new_with_limits_and_base_url(api_key, max_concurrent_requests, None)
    }

    pub fn new_with_limits_and_base_url(
        api_key: String,
        max_concurrent_requests: usize,
        base_url: Option<String>,
    ) -> Self {
        Self {
            api_key,
            client: Client::new(),
            base_url: base_url
                .unwrap_or_else(|| LASTFM_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            rate_limiter: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
            cache_album: Cache::new(10_000),
        }
    }

    /// Fetches album metadata, including its cover images.
    #[instrument(skip(self), fields(artist = artist_name, album = album_name))]
    pub async fn fetch_album_info(
        &self,
        artist_name: &str,
        album_name: &str,
    ) -> Result<AlbumInfo, LastFmError> {
        let cache_key = format!("{}:{}", artist_name, album_name);
        if let Some(cached) = self.cache_album.get(&cache_key) {
            debug!(target: "lastfm", "album info cache hit");
            return Ok(cached);
        }

        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|_| LastFmError::RateLimiterClosed)?;

        let url = format!("{}/", self.base_url);
        let params = [
            ("method", "album.getinfo"),
            ("artist", artist_name),
            ("album", album_name),
            ("api_key", self.api_key.as_str()),
            ("autocorrect", "1"),
            ("format", "json"),
        ];
        debug!(target: "lastfm", url = %url, "fetching album info");

        let response = self.client.get(&url).query(&params).send().await?;
        let status = response.status();
        let body = response.text().await?;
        let value = parse_lastfm_body(status, &body)?;

        let payload: AlbumInfoResponse = serde_json::from_value(value)?;
        let info = AlbumInfo::from(payload.album);
        self.cache_album.insert(cache_key, info.clone());
        Ok(info)
    }

    /// URL of the album cover at `size`, falling back to the largest image available.
    pub async fn fetch_album_image(
        &self,
        artist_name: &str,
        album_name: &str,
        size: ImageSize,
    ) -> Result<Option<String>, LastFmError> {
        let info = self.fetch_album_info(artist_name, album_name).await?;
        Ok(info.image_url(size).map(str::to_string))
    }
}

/// Struct representing album metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumInfo {
    pub name: String,
    pub artist: String,
    pub images: Vec<AlbumImage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumImage {
    pub url: String,
    pub size: Option<ImageSize>,
}

impl AlbumInfo {
    pub fn image_url(&self, size: ImageSize) -> Option<&str> {
        self.images
            .iter()
            .find(|image| image.size == Some(size))
            .or_else(|| self.images.iter().max_by_key(|image| image.size))
            .map(|image| image.url.as_str())
    }
}

impl From<WireAlbum> for AlbumInfo {
    fn from(album: WireAlbum) -> Self {
        Self {
            name: album.name,
            artist: album.artist,
            images: album
                .image
                .into_iter()
                .filter(|image| !image.url.trim().is_empty())
                .map(|image| AlbumImage {
                    size: image.size.parse().ok(),
                    url: image.url,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LastFmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },
    #[error("Last.fm API error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
    #[error("Unknown image size: {0}")]
    UnknownImageSize(String),
    #[error("Rate limiter closed")]
    RateLimiterClosed,
}

#[derive(Debug, Deserialize)]
struct AlbumInfoResponse {
    album: WireAlbum,
}

#[derive(Debug, Deserialize)]
struct WireAlbum {
    name: String,
    artist: String,
    #[serde(default)]
    image: Vec<WireImage>,
}

#[derive(Debug, Deserialize)]
struct WireImage {
    #[serde(rename = "#text", default)]
    url: String,
    #[serde(default)]
    size: String,
}

/// Last.fm reports failures as `{"error": <code>, "message": ...}`, sometimes with a 200.
fn parse_lastfm_body(status: StatusCode, response_body: &str) -> Result<Value, LastFmError> {
    let parsed: Result<Value, _> = serde_json::from_str(response_body);

    if let Ok(value) = &parsed {
        if let Some(code) = value.get("error").and_then(|error| error.as_i64()) {
            let message = value
                .get("message")
                .and_then(|message| message.as_str())
                .unwrap_or("unknown error")
                .to_string();
            return Err(LastFmError::Api { code, message });
        }
    }

    if !status.is_success() {
        return Err(LastFmError::HttpStatus {
            status,
            body: response_body.to_string(),
        });
    }

    Ok(parsed?)
}
