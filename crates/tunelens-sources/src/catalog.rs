// SPDX-License-Identifier: GPL-3.0-or-later

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, trace};
use tunelens_domain::{Artist, PlayRecord, TimeDimension, Track};

use crate::error::CatalogError;
use crate::ingest::{
    normalize_artists, normalize_play_history, normalize_tracks, Paging, RawArtist,
    RawPlayHistory, RawTrack,
};

pub type Result<T> = std::result::Result<T, CatalogError>;

const CATALOG_API_BASE: &str = "https://api.spotify.com/v1";
const USER_AGENT: &str = concat!("tunelens/", env!("CARGO_PKG_VERSION"));

/// Largest page the catalog serves in one request.
pub const MAX_PAGE_SIZE: usize = 50;

/// Time range sent when the caller does not ask for one.
pub const DEFAULT_TIME_RANGE: &str = "medium_term";

fn truncated<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    items.truncate(limit);
    items
}

/// Catalog time-range parameter for a time dimension.
pub fn catalog_time_range(dimension: TimeDimension) -> &'static str {
    match dimension {
        TimeDimension::Week | TimeDimension::Month => "short_term",
        TimeDimension::ThreeMonths | TimeDimension::SixMonths => "medium_term",
        TimeDimension::Year | TimeDimension::AllTime => "long_term",
    }
}

/// The signed-in listener, as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
}

/// Remote catalog operations the live strategies depend on.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn top_tracks(&self, limit: usize, range: Option<TimeDimension>) -> Result<Vec<Track>>;
    async fn top_artists(&self, limit: usize, range: Option<TimeDimension>)
        -> Result<Vec<Artist>>;
    async fn recently_played(&self, limit: usize) -> Result<Vec<PlayRecord>>;
    async fn current_user(&self) -> Result<UserProfile>;
    /// Drop every cached response.
    fn clear_cache(&self);
}

/// Catalog client over the Web API, with a TTL response cache.
#[derive(Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
    cache: Cache<String, String>,
}

impl HttpCatalogClient {
    pub fn builder() -> HttpCatalogClientBuilder {
        HttpCatalogClientBuilder::default()
    }

    fn top_params(limit: usize, range: Option<TimeDimension>) -> Vec<(&'static str, String)> {
        let time_range = range.map_or(DEFAULT_TIME_RANGE, catalog_time_range);
        vec![
            ("limit", limit.min(MAX_PAGE_SIZE).to_string()),
            ("time_range", time_range.to_string()),
        ]
    }

    fn url(&self, path: &str, params: &[(&'static str, String)]) -> Result<Url> {
        Url::parse_with_params(&format!("{}{}", self.base_url, path), params)
            .map_err(|e| CatalogError::InvalidRequest(e.to_string()))
    }

    /// GET through the response cache.
    async fn get_cached<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let key = url.to_string();
        let body = match self.cache.get(&key) {
            Some(body) => {
                debug!(target: "catalog", url = %key, "response cache hit");
                body
            }
            None => {
                let body = self.fetch(url).await?;
                self.cache.insert(key, body.clone()).await;
                body
            }
        };
        Self::decode(&body)
    }

    async fn fetch(&self, url: Url) -> Result<String> {
        trace!(target: "catalog", "GET {}", url);

        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        let status = response.status();
        debug!(target: "catalog", %status, "response status");

        match status {
            StatusCode::NOT_FOUND => return Err(CatalogError::NotFound(url.path().to_string())),
            StatusCode::UNAUTHORIZED => return Err(CatalogError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.trim().parse().ok());
                return Err(CatalogError::RateLimited { retry_after_secs });
            }
            _ => {}
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CatalogError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.text().await?)
    }

    fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
        serde_json::from_str(body).map_err(|e| {
            CatalogError::InvalidResponse(format!("Failed to parse response: {}", e))
        })
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    #[instrument(skip(self))]
    async fn top_tracks(&self, limit: usize, range: Option<TimeDimension>) -> Result<Vec<Track>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let url = self.url("/me/top/tracks", &Self::top_params(limit, range))?;
        let page: Paging<RawTrack> = self.get_cached(url).await?;
        Ok(truncated(normalize_tracks(page.items), limit))
    }

    #[instrument(skip(self))]
    async fn top_artists(
        &self,
        limit: usize,
        range: Option<TimeDimension>,
    ) -> Result<Vec<Artist>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let url = self.url("/me/top/artists", &Self::top_params(limit, range))?;
        let page: Paging<RawArtist> = self.get_cached(url).await?;
        Ok(truncated(normalize_artists(page.items), limit))
    }

    #[instrument(skip(self))]
    async fn recently_played(&self, limit: usize) -> Result<Vec<PlayRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let url = self.url(
            "/me/player/recently-played",
            &[("limit", limit.min(MAX_PAGE_SIZE).to_string())],
        )?;
        let page: Paging<RawPlayHistory> = self.get_cached(url).await?;
        Ok(truncated(normalize_play_history(page.items), limit))
    }

    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<UserProfile> {
        let url = self.url("/me", &[])?;
        let body = self.fetch(url).await?;
        Self::decode(&body)
    }

    fn clear_cache(&self) {
        debug!(target: "catalog", "clearing response cache");
        self.cache.invalidate_all();
    }
}

/// Builder for configuring a catalog client.
pub struct HttpCatalogClientBuilder {
    base_url: String,
    access_token: Option<String>,
    timeout: Duration,
    cache_ttl: Duration,
    cache_capacity: u64,
}

impl fmt::Debug for HttpCatalogClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpCatalogClientBuilder")
            .field("base_url", &self.base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("timeout", &self.timeout)
            .field("cache_ttl", &self.cache_ttl)
            .field("cache_capacity", &self.cache_capacity)
            .finish()
    }
}

impl Default for HttpCatalogClientBuilder {
    fn default() -> Self {
        Self {
            base_url: CATALOG_API_BASE.to_string(),
            access_token: None,
            timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 1_000,
        }
    }
}

impl HttpCatalogClientBuilder {
    /// Set a custom base URL (useful for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|token| !token.trim().is_empty());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// How long a cached response stays fresh.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<HttpCatalogClient> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(self.cache_capacity)
            .time_to_live(self.cache_ttl)
            .build();

        Ok(HttpCatalogClient {
            client,
            base_url: self.base_url,
            access_token: self.access_token,
            cache,
        })
    }
}
