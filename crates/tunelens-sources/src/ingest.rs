// SPDX-License-Identifier: GPL-3.0-or-later

//! Normalization boundary between catalog payloads and domain records.
//!
//! Every field of the raw shapes is optional. Defaults are applied here, once:
//! missing lists become empty, missing numbers become zero or absent, and
//! timestamps that cannot be parsed become absent. Numbers and timestamps of
//! the wrong JSON type read as missing, and a page item that still fails to
//! decode is skipped, so one bad record never rejects a page. Records without an id
//! are dropped because nothing downstream can key them.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;
use tunelens_domain::{
    parse_timestamp, AlbumRef, Artist, ArtistId, ArtistRef, Image, PlayRecord, Track, TrackId,
};

/// Catalog timestamps arrive as strings or as epoch milliseconds. Anything
/// else is kept as `Other` and never resolves.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    Text(String),
    Other(Value),
}

impl RawTimestamp {
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Millis(millis) => parse_timestamp(&millis.to_string()),
            Self::Text(text) => parse_timestamp(text),
            Self::Other(_) => None,
        }
    }
}

/// A numeric field. Fractions are truncated; non-numbers read as absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Int(i64),
    Float(f64),
    Other(Value),
}

impl RawNumber {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Float(value) if value.is_finite() => Some(value.trunc() as i64),
            _ => None,
        }
    }
}

fn number<T: TryFrom<i64>>(raw: Option<RawNumber>) -> Option<T> {
    raw.as_ref()
        .and_then(RawNumber::as_i64)
        .and_then(|value| T::try_from(value).ok())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawImage {
    pub url: Option<String>,
    pub width: Option<RawNumber>,
    pub height: Option<RawNumber>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawArtistRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAlbum {
    pub id: Option<String>,
    pub name: Option<String>,
    pub images: Option<Vec<RawImage>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTrack {
    pub id: Option<String>,
    pub name: Option<String>,
    pub artists: Option<Vec<RawArtistRef>>,
    pub album: Option<RawAlbum>,
    pub duration_ms: Option<RawNumber>,
    pub popularity: Option<RawNumber>,
    pub played_at: Option<RawTimestamp>,
    pub added_at: Option<RawTimestamp>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFollowers {
    pub total: Option<RawNumber>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawArtist {
    pub id: Option<String>,
    pub name: Option<String>,
    pub genres: Option<Vec<String>>,
    pub popularity: Option<RawNumber>,
    pub followers: Option<RawFollowers>,
    pub images: Option<Vec<RawImage>>,
}

/// One entry of a recently-played listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPlayHistory {
    pub track: Option<RawTrack>,
    pub played_at: Option<RawTimestamp>,
}

/// Paged listing wrapper.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Paging<T> {
    #[serde(default = "Vec::new", deserialize_with = "lenient_items")]
    pub items: Vec<T>,
}

/// Deserialize each item on its own and skip the ones that do not fit.
fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(error) => {
                debug!(target: "data-source", %error, "skipping malformed page item");
                None
            }
        })
        .collect())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn normalize_images(images: Option<Vec<RawImage>>) -> Vec<Image> {
    images
        .unwrap_or_default()
        .into_iter()
        .filter_map(|image| {
            non_blank(image.url).map(|url| Image {
                url,
                width: number(image.width),
                height: number(image.height),
            })
        })
        .collect()
}

fn normalize_popularity(popularity: Option<RawNumber>) -> Option<u8> {
    number(popularity)
}

impl RawTrack {
    pub fn normalize(self) -> Option<Track> {
        let Some(id) = non_blank(self.id) else {
            debug!(target: "data-source", name = ?self.name, "dropping track without id");
            return None;
        };

        let artists = self
            .artists
            .unwrap_or_default()
            .into_iter()
            .filter_map(|artist| {
                non_blank(artist.id).map(|id| ArtistRef {
                    id: ArtistId::new(id),
                    name: artist.name.unwrap_or_default(),
                })
            })
            .collect();

        let album = self
            .album
            .map(|album| AlbumRef {
                id: non_blank(album.id),
                name: album.name.unwrap_or_default(),
                images: normalize_images(album.images),
            })
            .unwrap_or_default();

        Some(Track {
            id: TrackId::new(id),
            name: self.name.unwrap_or_default(),
            artists,
            album,
            duration_ms: number(self.duration_ms).unwrap_or(0),
            popularity: normalize_popularity(self.popularity),
            played_at: self.played_at.as_ref().and_then(RawTimestamp::resolve),
            added_at: self.added_at.as_ref().and_then(RawTimestamp::resolve),
        })
    }
}

impl RawArtist {
    pub fn normalize(self) -> Option<Artist> {
        let Some(id) = non_blank(self.id) else {
            debug!(target: "data-source", name = ?self.name, "dropping artist without id");
            return None;
        };

        Some(Artist {
            id: ArtistId::new(id),
            name: self.name.unwrap_or_default(),
            genres: self
                .genres
                .unwrap_or_default()
                .into_iter()
                .filter(|genre| !genre.trim().is_empty())
                .collect(),
            popularity: normalize_popularity(self.popularity),
            followers: number(self.followers.and_then(|followers| followers.total)),
            images: normalize_images(self.images),
        })
    }
}

impl RawPlayHistory {
    /// The listen time is the entry's `played_at`, else the embedded track's.
    pub fn normalize(self) -> Option<PlayRecord> {
        let track = self.track?.normalize()?;
        let played_at = self
            .played_at
            .as_ref()
            .and_then(RawTimestamp::resolve)
            .or(track.played_at);
        Some(PlayRecord { track, played_at })
    }
}

pub fn normalize_tracks(raw: Vec<RawTrack>) -> Vec<Track> {
    raw.into_iter().filter_map(RawTrack::normalize).collect()
}

pub fn normalize_artists(raw: Vec<RawArtist>) -> Vec<Artist> {
    raw.into_iter().filter_map(RawArtist::normalize).collect()
}

pub fn normalize_play_history(raw: Vec<RawPlayHistory>) -> Vec<PlayRecord> {
    raw.into_iter()
        .filter_map(RawPlayHistory::normalize)
        .collect()
}
