//! Admin operations over locally stored progress.
//!
//! Every operation first runs the admin session through
//! [`SessionValidator`]: validate, and on failure recover or clear. Only a
//! granted admin session reaches the progress store. The player session is
//! never consulted, so an admin and a player can be signed in side by side.

use std::sync::Arc;

use rizal_progress::{ProgressEngine, ProgressStore, UserProgress};
use rizal_session::{
    FailureAction, PermissionChecker, Session, SessionKind, SessionValidator, StoredPermissions,
};
use rizal_store::KeyValueStore;
use serde::Serialize;

use crate::RizalError;

/// Validates `kind`, running the recovery protocol on failure.
///
/// Unlike [`SessionValidator::authorize`] this keeps the validation error,
/// so callers can report why access was refused.
pub(crate) async fn require_session<S: KeyValueStore, P: PermissionChecker>(
    validator: &SessionValidator<S, P>,
    kind: SessionKind,
) -> Result<Session, RizalError> {
    let reason = match validator.validate(kind).await {
        Ok(session) => return Ok(session),
        Err(err) => err,
    };
    match validator.handle_failure(kind, &reason).await {
        FailureAction::Recovered(session) => Ok(session),
        FailureAction::Redirect { to } => {
            tracing::warn!(%kind, error = %reason, redirect = %to, "access refused");
            Err(RizalError::AccessDenied {
                redirect: to,
                reason,
            })
        }
    }
}

/// One row of the admin dashboard's player list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub username: String,
    pub completed_levels: u32,
    pub total_levels: u32,
    pub average_score: u32,
    pub badge_count: u32,
    pub last_accessed: Option<i64>,
}

impl PlayerSummary {
    fn of(progress: &UserProgress) -> Self {
        let overview = ProgressEngine::overall_summary(progress);
        Self {
            username: progress.username.clone(),
            completed_levels: overview.completed_levels,
            total_levels: overview.total_levels,
            average_score: overview.average_score,
            badge_count: overview.badge_count,
            last_accessed: progress.last_accessed,
        }
    }
}

/// Admin-only access to every player's progress.
pub struct AdminGate<S: KeyValueStore, P: PermissionChecker = StoredPermissions<S>> {
    validator: Arc<SessionValidator<S, P>>,
    progress: ProgressStore<S>,
}

impl<S: KeyValueStore, P: PermissionChecker> Clone for AdminGate<S, P> {
    fn clone(&self) -> Self {
        Self {
            validator: Arc::clone(&self.validator),
            progress: self.progress.clone(),
        }
    }
}

impl<S: KeyValueStore, P: PermissionChecker> AdminGate<S, P> {
    pub fn new(validator: Arc<SessionValidator<S, P>>, progress: ProgressStore<S>) -> Self {
        Self {
            validator,
            progress,
        }
    }

    /// Returns the admin session, or why there isn't a usable one.
    ///
    /// # Errors
    ///
    /// [`RizalError::AccessDenied`] carrying the validation failure and
    /// the admin login path. The admin session has been cleared by then.
    pub async fn require_admin(&self) -> Result<Session, RizalError> {
        require_session(&self.validator, SessionKind::Admin).await
    }

    /// Every player with a save, with headline numbers.
    pub async fn list_users(&self) -> Result<Vec<PlayerSummary>, RizalError> {
        self.require_admin().await?;
        let players = self
            .progress
            .enumerate_users()
            .iter()
            .map(|name| PlayerSummary::of(&self.progress.load(name)))
            .collect();
        Ok(players)
    }

    /// One player's full save, or `None` if they have none.
    pub async fn user_progress(&self, username: &str) -> Result<Option<UserProgress>, RizalError> {
        self.require_admin().await?;
        if !self.progress.exists(username) {
            return Ok(None);
        }
        Ok(Some(self.progress.try_load(username)?))
    }

    /// Wipes a player's progress back to a fresh save.
    ///
    /// Returns `false` if the player has no save.
    pub async fn reset_user(&self, username: &str) -> Result<bool, RizalError> {
        let admin = self.require_admin().await?;
        if !self.progress.exists(username) {
            return Ok(false);
        }
        let current = self.progress.try_load(username)?;
        let mut fresh = ProgressEngine::reset(&current);
        self.progress.try_save(username, &mut fresh)?;
        tracing::info!(admin = %admin.principal.username, username, "player progress reset");
        Ok(true)
    }

    /// Deletes a player's save entirely. Deleting a missing save succeeds.
    pub async fn delete_user(&self, username: &str) -> Result<bool, RizalError> {
        let admin = self.require_admin().await?;
        let erased = self.progress.erase(username);
        tracing::info!(admin = %admin.principal.username, username, erased, "player progress deleted");
        Ok(erased)
    }
}
