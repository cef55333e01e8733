//! `RizalApp` builder: wires every layer over one storage backend.
//!
//! The store, the session layer, and the progress layer must all see the
//! same backend and the same clock; the builder is the one place that
//! guarantees it.

use std::sync::Arc;

use rizal_progress::{ProgressEngine, ProgressStore};
use rizal_session::{
    LoginResponse, PermissionChecker, Session, SessionKind, SessionOptions, SessionStore,
    SessionValidator, StoredPermissions,
};
use rizal_store::{Clock, KeyValueStore, SystemClock};

use crate::admin::require_session;
use crate::{AdminGate, AppConfig, ProgressTracker, RizalError, SharedTracker};

/// Builder for a [`RizalApp`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use rizal::prelude::*;
///
/// let app = RizalAppBuilder::new()
///     .config(AppConfig::default())
///     .build(Arc::new(MemoryStore::new()));
/// assert!(!app.sessions().is_user_session_valid());
/// ```
pub struct RizalAppBuilder {
    config: AppConfig,
    clock: Arc<dyn Clock>,
}

impl RizalAppBuilder {
    /// Creates a builder with default settings and the system clock.
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the clock (tests use a `ManualClock`).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builds the app, checking permissions against the stored principal.
    pub fn build<S: KeyValueStore>(self, backend: Arc<S>) -> RizalApp<S> {
        let sessions = self.session_store(&backend);
        let permissions = StoredPermissions::new(sessions.clone());
        self.assemble(backend, sessions, permissions)
    }

    /// Builds the app with a custom permission check.
    pub fn build_with_permissions<S: KeyValueStore, P: PermissionChecker>(
        self,
        backend: Arc<S>,
        permissions: P,
    ) -> RizalApp<S, P> {
        let sessions = self.session_store(&backend);
        self.assemble(backend, sessions, permissions)
    }

    fn session_store<S: KeyValueStore>(&self, backend: &Arc<S>) -> SessionStore<S> {
        SessionStore::new(
            Arc::clone(backend),
            Arc::clone(&self.clock),
            self.config.session.clone(),
        )
    }

    fn assemble<S: KeyValueStore, P: PermissionChecker>(
        self,
        backend: Arc<S>,
        sessions: SessionStore<S>,
        permissions: P,
    ) -> RizalApp<S, P> {
        let validator = Arc::new(SessionValidator::with_permissions(sessions.clone(), permissions));
        let progress = ProgressStore::new(backend, self.clock, self.config.course.clone());
        tracing::info!(
            chapters = progress.layout().chapters.len(),
            levels = progress.layout().total_levels(),
            "rizal app assembled"
        );
        RizalApp {
            config: self.config,
            sessions,
            validator,
            progress,
        }
    }
}

impl Default for RizalAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The game core: sessions, progress, and admin access over one backend.
pub struct RizalApp<S: KeyValueStore, P: PermissionChecker = StoredPermissions<S>> {
    config: AppConfig,
    sessions: SessionStore<S>,
    validator: Arc<SessionValidator<S, P>>,
    progress: ProgressStore<S>,
}

impl<S: KeyValueStore, P: PermissionChecker> RizalApp<S, P> {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore<S> {
        &self.sessions
    }

    pub fn validator(&self) -> &SessionValidator<S, P> {
        &self.validator
    }

    pub fn progress_store(&self) -> &ProgressStore<S> {
        &self.progress
    }

    /// Signs someone in with the auth backend's response.
    ///
    /// A player sign-in also starts a new play session in their progress,
    /// so `speed_runner` counts levels from this login. The sign-in stands
    /// even if that save fails; only the session count is left as it was.
    pub fn login(&self, kind: SessionKind, response: &LoginResponse) -> Result<Session, RizalError> {
        let options = SessionOptions::for_kind(kind, self.sessions.config());
        let session = self.sessions.establish(kind, response, options)?;

        if kind == SessionKind::User {
            let username = &session.principal.username;
            let mut progress =
                ProgressEngine::reset_session_tracking(&self.progress.load(username));
            if let Err(err) = self.progress.try_save(username, &mut progress) {
                tracing::warn!(%username, error = %err, "failed to start play session at login");
            }
        }
        Ok(session)
    }

    /// Signs out; the other kind's session is untouched.
    pub fn logout(&self, kind: SessionKind) {
        self.sessions.clear_session(kind);
    }

    /// A tracker for `username`, regardless of who is signed in.
    pub fn tracker_for(&self, username: &str) -> SharedTracker<S> {
        ProgressTracker::new(self.progress.clone(), username).shared()
    }

    /// A tracker for the signed-in player.
    ///
    /// # Errors
    ///
    /// [`RizalError::AccessDenied`] if the player session doesn't validate
    /// and can't be recovered.
    pub async fn player_tracker(&self) -> Result<SharedTracker<S>, RizalError> {
        let session = require_session(&self.validator, SessionKind::User).await?;
        Ok(self.tracker_for(&session.principal.username))
    }

    /// Admin operations, each gated on the admin session.
    pub fn admin(&self) -> AdminGate<S, P> {
        AdminGate::new(Arc::clone(&self.validator), self.progress.clone())
    }
}
