// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid request URL: {0}")]
    InvalidRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Access token missing, expired or revoked")]
    Unauthorized,

    #[error("Rate limit exceeded (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response from catalog: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Fixture dataset could not be parsed: {0}")]
    FixtureParse(#[from] serde_json::Error),

    #[error("Fixture dataset is invalid: {0}")]
    InvalidFixture(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization backend failed: {0}")]
    Backend(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("A login is already in progress")]
    LoginInProgress,
}
