// SPDX-License-Identifier: GPL-3.0-or-later
use std::fmt;
use std::path::Path;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Which data and auth strategies the application is composed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    #[default]
    Fixture,
    Live,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub mode: SourceMode,
    pub fixture_latency_ms: u64,
    pub auth_delay_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::Fixture,
            fixture_latency_ms: 0,
            auth_delay_ms: 400,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub base_url: String,
    pub access_token: Option<String>,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.spotify.com/v1".to_string(),
            access_token: None,
            timeout_secs: 30,
            cache_ttl_secs: 300,
            cache_capacity: 1_000,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LastFmConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub max_concurrent_requests: usize,
}

impl fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &redacted(&self.access_token))
            .field("timeout_secs", &self.timeout_secs)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("cache_capacity", &self.cache_capacity)
            .finish()
    }
}

impl fmt::Debug for LastFmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LastFmConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("base_url", &self.base_url)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .finish()
    }
}

/// Debug stand-in for a secret: shows whether it is set, never its value.
fn redacted(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "<redacted>")
}

impl Default for LastFmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            max_concurrent_requests: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub lastfm: LastFmConfig,
    pub image_size: String,
    /// Image used when artwork cannot be resolved; `None` keeps the built-in placeholder.
    pub placeholder_image: Option<String>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            lastfm: LastFmConfig::default(),
            image_size: "extralarge".to_string(),
            placeholder_image: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub telemetry: TelemetryConfig,
    pub source: SourceConfig,
    pub catalog: CatalogConfig,
    pub metadata: MetadataConfig,
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: TUNELENS_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("TUNELENS_").split("__"));

    let config: AppConfig = figment.extract()?;
    info!(target: "config", mode = ?config.source.mode, "configuration loaded");
    Ok(config)
}
