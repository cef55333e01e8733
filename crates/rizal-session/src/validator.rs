//! The session validator: "is this session usable right now?".
//!
//! [`SessionStore`] answers "is there a session?". The validator goes
//! further before an operation is allowed through:
//!
//! 1. **Structure** — the record decodes and names a principal
//! 2. **Kind** — an admin record was not handed in where a player one is
//!    required (or vice versa)
//! 3. **Expiry** — both the token's embedded `exp` and the record's
//!    `expires_at` are still in the future
//! 4. **Permission** — the [`PermissionChecker`] still vouches for the
//!    principal
//!
//! Failures come back as a [`ValidationError`] value, never a panic.
//! [`SessionValidator::handle_failure`] is the one place that turns an
//! error into recovery or a redirect.
//!
//! ```text
//! validate() ──Ok──→ Granted
//!     │
//!    Err
//!     ▼
//! handle_failure() ── TokenExpired ──→ attempt_recovery() ──Ok──→ Recovered
//!     │                                      │
//!     └──────── anything else ───────────────┴──Err──→ Redirect(login path)
//! ```
//!
//! # Concurrency note
//!
//! Two validations for the same kind may interleave across the permission
//! await. Both end by refreshing `last_activity`; whichever writes last
//! wins. The result of a late validation is still safe to apply.

use rizal_store::KeyValueStore;

use crate::token::decode_token_expiry;
use crate::{
    PermissionChecker, PrincipalId, Session, SessionError, SessionKind,
    SessionStore, StoredPermissions, ValidationError,
};

/// What [`SessionValidator::handle_failure`] decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureAction {
    /// A fresh session was recovered; re-run the guarded operation.
    Recovered(Session),

    /// The session is gone; send the browser to `to`.
    Redirect { to: String },
}

/// Final answer of [`SessionValidator::authorize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted(Session),
    Redirect(String),
}

impl Access {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }
}

/// Validates sessions from a [`SessionStore`], with a recovery path.
///
/// Generic over the permission check so tests (and deployments with a
/// real backend) can inject their own. `SessionValidator::new` uses
/// [`StoredPermissions`].
pub struct SessionValidator<S: KeyValueStore, P: PermissionChecker = StoredPermissions<S>> {
    store: SessionStore<S>,
    permissions: P,
}

impl<S: KeyValueStore> SessionValidator<S> {
    /// Creates a validator that checks permissions against the stored
    /// principal.
    pub fn new(store: SessionStore<S>) -> Self {
        let permissions = StoredPermissions::new(store.clone());
        Self { store, permissions }
    }
}

impl<S: KeyValueStore, P: PermissionChecker> SessionValidator<S, P> {
    /// Creates a validator with a custom permission checker.
    pub fn with_permissions(store: SessionStore<S>, permissions: P) -> Self {
        Self { store, permissions }
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    // =====================================================================
    // validate()
    // =====================================================================

    /// Checks the stored `kind` session end to end.
    ///
    /// On success the session's `last_activity` is refreshed and the
    /// refreshed session is returned.
    ///
    /// # Errors
    /// - [`ValidationError::InvalidToken`] — nothing stored, malformed
    ///   record, or undecodable token
    /// - [`ValidationError::SessionMixing`] — record of the other kind
    /// - [`ValidationError::TokenExpired`] — token `exp` or `expires_at` passed
    /// - [`ValidationError::InsufficientPermissions`] — admin check failed
    /// - [`ValidationError::UserInactive`] — player check failed
    pub async fn validate(&self, kind: SessionKind) -> Result<Session, ValidationError> {
        let session = self.load(kind)?;

        let token_expiry = decode_token_expiry(&session.token)?;
        let now = self.store.now_ms();
        if now >= token_expiry || session.is_expired(now) {
            tracing::debug!(%kind, token_expiry, expires_at = session.expires_at, "session expired");
            return Err(ValidationError::TokenExpired);
        }

        let user_id = session.principal.id.clone();
        if !self.check_permission(kind, &user_id).await {
            tracing::warn!(%kind, %user_id, "permission check failed");
            return Err(match kind {
                SessionKind::Admin => ValidationError::InsufficientPermissions {
                    user_id,
                    permission: "admin".into(),
                },
                SessionKind::User => ValidationError::UserInactive { user_id },
            });
        }

        Ok(self.store.touch(kind).unwrap_or(session))
    }

    /// Reads the raw record and applies the structural and kind checks.
    fn load(&self, kind: SessionKind) -> Result<Session, ValidationError> {
        let session = match self.store.peek(kind) {
            Ok(Some(session)) => session,
            Ok(None) => return Err(ValidationError::invalid(format!("no {kind} session stored"))),
            Err(SessionError::KindMismatch { stored, requested }) => {
                return Err(ValidationError::SessionMixing {
                    attempted: stored,
                    expected: requested,
                });
            }
            Err(err) => return Err(ValidationError::invalid(err.to_string())),
        };
        Ok(session)
    }

    /// Asks the injected [`PermissionChecker`] about `principal_id`.
    pub async fn check_permission(&self, kind: SessionKind, principal_id: &PrincipalId) -> bool {
        self.permissions.check_permission(kind, principal_id).await
    }

    // =====================================================================
    // Recovery
    // =====================================================================

    /// Tries to bring back a usable session from legacy keys.
    ///
    /// Succeeds only if a legacy session can be reconstructed AND the
    /// reconstructed form passes [`validate`](Self::validate) on its own.
    /// A reconstructed record that fails validation is discarded again.
    pub async fn attempt_recovery(&self, kind: SessionKind) -> Result<Session, ValidationError> {
        if self.store.restore(kind).is_none() {
            tracing::debug!(%kind, "no legacy session to recover");
            return Err(ValidationError::invalid(format!(
                "no {kind} session to recover"
            )));
        }

        match self.validate(kind).await {
            Ok(session) => {
                tracing::info!(%kind, user = %session.principal.username, "session recovered");
                Ok(session)
            }
            Err(err) => {
                tracing::info!(%kind, error = %err, "recovered session failed validation");
                self.store.discard(kind);
                Err(err)
            }
        }
    }

    /// Decides what to do after a failed validation.
    ///
    /// The composite record is always dropped first, so no half-valid
    /// state survives. Only an expired token is worth a recovery attempt,
    /// and recovery only succeeds if the legacy keys describe a different,
    /// still-live session (another tab signed in again). Legacy keys that
    /// mirror the expired record carry its expiry and never recover.
    /// Every other failure, and a failed recovery, clears the session
    /// entirely and redirects to the kind's login screen.
    pub async fn handle_failure(&self, kind: SessionKind, error: &ValidationError) -> FailureAction {
        tracing::info!(%kind, %error, "handling session validation failure");
        self.store.discard(kind);

        if matches!(error, ValidationError::TokenExpired) {
            match self.attempt_recovery(kind).await {
                Ok(session) => return FailureAction::Recovered(session),
                Err(err) => tracing::debug!(%kind, error = %err, "recovery failed"),
            }
        }

        self.store.clear_session(kind);
        FailureAction::Redirect {
            to: self.store.config().login_path(kind).to_string(),
        }
    }

    /// Validates `kind`, running the failure protocol when needed.
    ///
    /// This is the gate guarded operations call before doing anything.
    pub async fn authorize(&self, kind: SessionKind) -> Access {
        let error = match self.validate(kind).await {
            Ok(session) => return Access::Granted(session),
            Err(err) => err,
        };

        match self.handle_failure(kind, &error).await {
            FailureAction::Recovered(session) => Access::Granted(session),
            FailureAction::Redirect { to } => Access::Redirect(to),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
