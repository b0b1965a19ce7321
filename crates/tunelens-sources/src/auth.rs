// SPDX-License-Identifier: GPL-3.0-or-later

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

use crate::catalog::{CatalogClient, UserProfile};
use crate::error::AuthError;

pub type Result<T> = std::result::Result<T, AuthError>;

/// Session capabilities the dashboard consumes.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn login(&self) -> Result<UserProfile>;
    async fn logout(&self) -> Result<()>;
    async fn refresh_token(&self) -> Result<()>;
    fn user(&self) -> Option<UserProfile>;
    fn is_loading(&self) -> bool;
    /// Message of the last failed operation, until cleared.
    fn error(&self) -> Option<String>;
    fn clear_error(&self);

    fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }
}

/// External authorization subsystem behind [`LiveAuth`].
#[async_trait]
pub trait AuthorizationBackend: Send + Sync {
    async fn authorize(&self) -> Result<UserProfile>;
    async fn refresh(&self) -> Result<()>;
    async fn revoke(&self) -> Result<()>;
}

#[derive(Debug, Default)]
struct SessionState {
    user: Option<UserProfile>,
    loading: bool,
    error: Option<String>,
}

/// Shared session bookkeeping for both providers.
#[derive(Debug, Default)]
struct Session {
    state: Mutex<SessionState>,
}

impl Session {
    fn with_user(user: UserProfile) -> Self {
        Self {
            state: Mutex::new(SessionState {
                user: Some(user),
                ..SessionState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_login(&self) -> Result<LoginAttempt<'_>> {
        let mut state = self.lock();
        if state.loading {
            return Err(AuthError::LoginInProgress);
        }
        state.loading = true;
        state.error = None;
        Ok(LoginAttempt { session: self })
    }

    fn record<T>(&self, outcome: Result<T>) -> Result<T> {
        if let Err(error) = &outcome {
            self.lock().error = Some(error.to_string());
        }
        outcome
    }
}

/// A login in flight. Dropping it, finished or not, clears `loading`.
struct LoginAttempt<'a> {
    session: &'a Session,
}

impl LoginAttempt<'_> {
    fn finish(self, outcome: &Result<UserProfile>) {
        let mut state = self.session.lock();
        match outcome {
            Ok(user) => {
                state.user = Some(user.clone());
                state.error = None;
            }
            Err(error) => state.error = Some(error.to_string()),
        }
    }
}

impl Drop for LoginAttempt<'_> {
    fn drop(&mut self) {
        self.session.lock().loading = false;
    }
}

/// Always-signed-in provider for demos and tests.
///
/// Starts authenticated. `login` waits `login_delay` before succeeding;
/// `refresh_token` does nothing.
pub struct FixtureAuth {
    profile: UserProfile,
    login_delay: Duration,
    session: Session,
}

impl FixtureAuth {
    pub fn new(profile: UserProfile, login_delay: Duration) -> Self {
        Self {
            session: Session::with_user(profile.clone()),
            profile,
            login_delay,
        }
    }
}

#[async_trait]
impl AuthProvider for FixtureAuth {
    async fn login(&self) -> Result<UserProfile> {
        let attempt = self.session.begin_login()?;
        if !self.login_delay.is_zero() {
            tokio::time::sleep(self.login_delay).await;
        }
        let outcome = Ok(self.profile.clone());
        attempt.finish(&outcome);
        info!(target: "auth", provider = "fixture", user = %self.profile.id, "logged in");
        outcome
    }

    async fn logout(&self) -> Result<()> {
        self.session.lock().user = None;
        info!(target: "auth", provider = "fixture", "logged out");
        Ok(())
    }

    async fn refresh_token(&self) -> Result<()> {
        Ok(())
    }

    fn user(&self) -> Option<UserProfile> {
        self.session.lock().user.clone()
    }

    fn is_loading(&self) -> bool {
        self.session.lock().loading
    }

    fn error(&self) -> Option<String> {
        self.session.lock().error.clone()
    }

    fn clear_error(&self) {
        self.session.lock().error = None;
    }
}

/// Provider that delegates to an [`AuthorizationBackend`]. Starts signed out.
pub struct LiveAuth {
    backend: Arc<dyn AuthorizationBackend>,
    session: Session,
}

impl LiveAuth {
    pub fn new(backend: Arc<dyn AuthorizationBackend>) -> Self {
        Self {
            backend,
            session: Session::default(),
        }
    }
}

#[async_trait]
impl AuthProvider for LiveAuth {
    async fn login(&self) -> Result<UserProfile> {
        let attempt = self.session.begin_login()?;
        let outcome = self.backend.authorize().await;
        attempt.finish(&outcome);
        match &outcome {
            Ok(user) => info!(target: "auth", provider = "live", user = %user.id, "logged in"),
            Err(error) => warn!(target: "auth", provider = "live", %error, "login failed"),
        }
        outcome
    }

    async fn logout(&self) -> Result<()> {
        let outcome = self.backend.revoke().await;
        if outcome.is_ok() {
            self.session.lock().user = None;
            info!(target: "auth", provider = "live", "logged out");
        }
        self.session.record(outcome)
    }

    async fn refresh_token(&self) -> Result<()> {
        if self.user().is_none() {
            return Err(AuthError::NotAuthenticated);
        }
        let outcome = self.backend.refresh().await;
        self.session.record(outcome)
    }

    fn user(&self) -> Option<UserProfile> {
        self.session.lock().user.clone()
    }

    fn is_loading(&self) -> bool {
        self.session.lock().loading
    }

    fn error(&self) -> Option<String> {
        self.session.lock().error.clone()
    }

    fn clear_error(&self) {
        self.session.lock().error = None;
    }
}

/// Authorizes a pre-issued catalog access token by asking the catalog who it belongs to.
pub struct CatalogTokenBackend {
    catalog: Arc<dyn CatalogClient>,
}

impl CatalogTokenBackend {
    pub fn new(catalog: Arc<dyn CatalogClient>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl AuthorizationBackend for CatalogTokenBackend {
    async fn authorize(&self) -> Result<UserProfile> {
        Ok(self.catalog.current_user().await?)
    }

    /// A static token cannot be renewed; this confirms it is still accepted.
    async fn refresh(&self) -> Result<()> {
        self.catalog.current_user().await?;
        Ok(())
    }

    async fn revoke(&self) -> Result<()> {
        self.catalog.clear_cache();
        Ok(())
    }
}
