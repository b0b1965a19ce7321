// SPDX-License-Identifier: GPL-3.0-or-later

//! Album artwork lookup.
//!
//! [`lastfm::LastFmClient`] talks to the Last.fm `album.getinfo` endpoint;
//! [`album_art::AlbumArtResolver`] sits in front of any [`album_art::AlbumArtLookup`]
//! and memoizes results per `(artist, album)`, sharing in-flight lookups between
//! concurrent callers and substituting a placeholder when a lookup fails.

pub mod album_art;
pub mod lastfm;

pub use album_art::{
    AlbumArtError, AlbumArtLookup, AlbumArtResolver, AlbumKey, DEFAULT_PLACEHOLDER_IMAGE,
};
pub use lastfm::{AlbumImage, AlbumInfo, ImageSize, LastFmClient, LastFmError};
