//! Error types for the session layer.

use rizal_store::StoreError;

use crate::{PrincipalId, SessionKind};

/// Errors from reading or writing session records.
///
/// Most public [`SessionStore`](crate::SessionStore) operations swallow
/// these (logging them) and degrade to "no session". The `try_*`
/// variants and [`SessionStore::peek`](crate::SessionStore::peek) hand
/// them back for callers that want to know why.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The backend refused the read or write (quota, poisoned lock, ...).
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// A record exists but doesn't have the shape of a session.
    #[error("malformed {kind} session: {reason}")]
    Malformed { kind: SessionKind, reason: String },

    /// The record under one kind's key belongs to the other kind.
    #[error("{stored} session stored under the {requested} key")]
    KindMismatch {
        stored: SessionKind,
        requested: SessionKind,
    },

    /// The auth backend's login response can't become a session.
    #[error("login rejected: {0}")]
    LoginRejected(String),
}

/// Why a session failed validation.
///
/// This is a closed set: [`SessionValidator::handle_failure`] matches on
/// it to decide between recovery and redirect, and nothing else reaches
/// the UI.
///
/// [`SessionValidator::handle_failure`]: crate::SessionValidator::handle_failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The token's embedded `exp`, or the record's `expiresAt`, has passed.
    #[error("session token expired")]
    TokenExpired,

    /// No session, a structurally broken record, or an undecodable token.
    #[error("invalid session token: {reason}")]
    InvalidToken { reason: String },

    /// A record of one kind turned up where the other kind was required.
    #[error("{attempted} session presented where a {expected} session is required")]
    SessionMixing {
        attempted: SessionKind,
        expected: SessionKind,
    },

    /// The player account has been deactivated.
    #[error("user {user_id} is inactive")]
    UserInactive { user_id: PrincipalId },

    /// The principal lacks the permission the session kind requires.
    #[error("user {user_id} lacks {permission} permission")]
    InsufficientPermissions {
        user_id: PrincipalId,
        permission: String,
    },
}

impl ValidationError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            reason: reason.into(),
        }
    }
}
