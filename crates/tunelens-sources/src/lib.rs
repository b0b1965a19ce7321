// SPDX-License-Identifier: GPL-3.0-or-later

//! Where dashboard records come from.
//!
//! Two strategy pairs live here: [`DataSource`] (live catalog or bundled
//! fixture) and [`AuthProvider`] (catalog token or always-signed-in fixture).
//! [`compose`] picks a pair from configuration; the rest of the application
//! only ever holds the trait objects.

pub mod auth;
pub mod catalog;
pub mod compose;
pub mod dashboard;
pub mod data_source;
pub mod enrichment;
pub mod error;
pub mod fixture;
pub mod ingest;
pub mod live;

pub use auth::{AuthProvider, AuthorizationBackend, CatalogTokenBackend, FixtureAuth, LiveAuth};
pub use catalog::{catalog_time_range, CatalogClient, HttpCatalogClient, UserProfile};
pub use compose::{album_art_resolver, compose, Composition};
pub use dashboard::{Dashboard, DashboardSnapshot};
pub use data_source::DataSource;
pub use enrichment::ArtworkEnricher;
pub use error::{AuthError, CatalogError, SourceError};
pub use fixture::{FixtureDataSource, FixtureDataset};
pub use live::LiveDataSource;
