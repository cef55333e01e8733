//! Unified error type for Rizal Quest.

use rizal_progress::ProgressError;
use rizal_session::{SessionError, ValidationError};
use rizal_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// Callers of the `rizal` facade deal with this single type; `?` converts
/// from each layer's own error through the `#[from]` impls.
#[derive(Debug, thiserror::Error)]
pub enum RizalError {
    /// Reading or writing the key-value store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A session record couldn't be written, read, or established.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The caller's session didn't pass validation.
    #[error(transparent)]
    Unauthorized(#[from] ValidationError),

    /// An admin operation was refused; the browser belongs at `redirect`.
    #[error("access denied ({reason}), redirecting to {redirect}")]
    AccessDenied {
        redirect: String,
        #[source]
        reason: ValidationError,
    },

    /// Progress couldn't be loaded, saved, or imported.
    #[error(transparent)]
    Progress(#[from] ProgressError),

    /// The app configuration couldn't be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[source] serde_json::Error),

    /// The configuration file couldn't be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}
