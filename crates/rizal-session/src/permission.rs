//! Permission hook used during validation.
//!
//! The validator doesn't decide on its own whether a principal still has
//! the right to the session it holds. It asks a [`PermissionChecker`].
//! Today's checker re-reads the stored principal; a deployment that wants
//! a live backend check (was this admin demoted five minutes ago?) swaps
//! in its own implementation without touching the validator.

use rizal_store::KeyValueStore;

use crate::{PrincipalId, SessionKind, SessionStore};

/// Answers "may this principal still hold a session of this kind?".
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → the checker lives inside the validator,
///   which may be shared across UI tasks.
///
/// # Example
///
/// ```rust
/// use rizal_session::{PermissionChecker, PrincipalId, SessionKind};
///
/// /// Grants everything. Only for development!
/// struct AllowAll;
///
/// impl PermissionChecker for AllowAll {
///     async fn check_permission(&self, _kind: SessionKind, _id: &PrincipalId) -> bool {
///         true
///     }
/// }
/// ```
pub trait PermissionChecker: Send + Sync + 'static {
    /// Returns `true` if `principal_id` may hold a `kind` session.
    ///
    /// - Admin → the principal must still be an admin.
    /// - User  → the principal must still be active.
    fn check_permission(
        &self,
        kind: SessionKind,
        principal_id: &PrincipalId,
    ) -> impl std::future::Future<Output = bool> + Send;
}

/// The default checker: trusts the flags on the stored principal.
///
/// Stands in for a backend permission lookup. It only answers for the
/// principal currently stored under `kind`; any other id is refused.
pub struct StoredPermissions<S: KeyValueStore> {
    store: SessionStore<S>,
}

impl<S: KeyValueStore> StoredPermissions<S> {
    pub fn new(store: SessionStore<S>) -> Self {
        Self { store }
    }
}

impl<S: KeyValueStore> PermissionChecker for StoredPermissions<S> {
    async fn check_permission(&self, kind: SessionKind, principal_id: &PrincipalId) -> bool {
        match self.store.peek(kind) {
            Ok(Some(session)) if session.principal.id == *principal_id => {
                session.principal.permits(kind)
            }
            Ok(_) => {
                tracing::debug!(%kind, %principal_id, "no stored principal to check");
                false
            }
            Err(err) => {
                tracing::warn!(%kind, error = %err, "permission check could not read session");
                false
            }
        }
    }
}
