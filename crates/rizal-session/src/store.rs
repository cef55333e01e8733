//! The session store: durable, kind-segregated session records.
//!
//! This is the lowest piece of the session layer. It's responsible for:
//! - Writing a session when someone signs in (composite record + legacy keys)
//! - Reading it back, refreshing its activity stamp on every read
//! - Rebuilding a composite record from legacy keys written by older builds
//! - Removing every trace of a session on logout or expiry
//!
//! # Failure policy
//!
//! Storage failures never escape the boolean / optional operations. They
//! are logged and turned into "no session": losing a session costs the
//! player a re-login, a panic would cost them the page.
//!
//! # Concurrency note
//!
//! Reads and writes are last-write-wins on one key. Two overlapping
//! read-refresh cycles can overwrite each other's `last_activity` stamp.
//! That stamp is advisory only; nothing security sensitive reads it.

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use rizal_store::{Clock, Codec, JsonCodec, KeyValueStore, StoreError};

use crate::{
    LoginResponse, Principal, Session, SessionConfig, SessionError, SessionKind,
    SessionOptions,
};

/// Stores the admin and player sessions in a shared key-value backend.
///
/// ## Lifecycle
///
/// ```text
/// set_session() ──→ get_session() / is_valid() ──→ clear_session()
///                        │
///                        ├─ composite record missing → reconstruct from legacy keys
///                        ├─ malformed                → clear, None
///                        └─ expired                  → clear, None
/// ```
pub struct SessionStore<S: KeyValueStore> {
    backend: Arc<S>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    codec: JsonCodec,
}

// A derived `Clone` would demand `S: Clone`; the backend is behind an
// `Arc`, so cloning the store only bumps reference counts.
impl<S: KeyValueStore> Clone for SessionStore<S> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
            codec: self.codec,
        }
    }
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Creates a store over `backend`, reading time from `clock`.
    pub fn new(backend: Arc<S>, clock: Arc<dyn Clock>, config: SessionConfig) -> Self {
        Self {
            backend,
            clock,
            config,
            codec: JsonCodec,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    // =====================================================================
    // Writing
    // =====================================================================

    /// Records a new session for `kind`, replacing any previous one.
    ///
    /// `issued_at` is now and `expires_at` is `issued_at + expires_in_ms`.
    /// Returns `false` (after logging) if the backend refused the write.
    pub fn set_session(
        &self,
        kind: SessionKind,
        token: &str,
        principal: Principal,
        options: SessionOptions,
    ) -> bool {
        match self.try_set_session(kind, token, principal, options) {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(%kind, error = %err, "failed to store session");
                false
            }
        }
    }

    /// Like [`set_session`](Self::set_session), but returns the stored
    /// session or the reason it couldn't be stored.
    pub fn try_set_session(
        &self,
        kind: SessionKind,
        token: &str,
        principal: Principal,
        options: SessionOptions,
    ) -> Result<Session, SessionError> {
        let issued_at = self.now_ms();
        let session = Session {
            kind: Some(kind),
            token: token.to_string(),
            principal,
            issued_at,
            expires_at: issued_at.saturating_add(options.expires_in_ms),
            last_activity: issued_at,
            persistent: options.persistent,
        };

        // Legacy keys first: a composite record must never outlive a
        // partial write.
        if let Err(err) = self
            .write_legacy(kind, &session)
            .and_then(|()| self.write_record(kind, &session))
        {
            self.clear_session(kind);
            return Err(err.into());
        }

        tracing::info!(
            %kind,
            user = %session.principal.username,
            expires_at = session.expires_at,
            "session created"
        );
        Ok(session)
    }

    /// Turns the auth backend's login response into a stored session.
    ///
    /// # Errors
    /// [`SessionError::LoginRejected`] if the response reports failure,
    /// lacks a token or user, or (for admin) the user isn't an admin.
    pub fn establish(
        &self,
        kind: SessionKind,
        response: &LoginResponse,
        options: SessionOptions,
    ) -> Result<Session, SessionError> {
        if !response.success {
            let reason = response
                .message
                .clone()
                .unwrap_or_else(|| "backend reported failure".into());
            return Err(SessionError::LoginRejected(reason));
        }
        let token = response
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SessionError::LoginRejected("response has no token".into()))?;
        let user = response
            .user
            .clone()
            .ok_or_else(|| SessionError::LoginRejected("response has no user".into()))?;
        if !user.permits(kind) {
            return Err(SessionError::LoginRejected(format!(
                "{} may not hold a {kind} session",
                user.username
            )));
        }

        self.try_set_session(kind, token, user, options)
    }

    // =====================================================================
    // Reading
    // =====================================================================

    /// Returns the live session for `kind`, or `None`.
    ///
    /// Falls back to legacy keys when no composite record exists. A
    /// malformed or expired record is cleared. A returned session has had
    /// its `last_activity` stamped and persisted.
    pub fn get_session(&self, kind: SessionKind) -> Option<Session> {
        let mut session = match self.peek(kind) {
            Ok(Some(session)) => session,
            Ok(None) => self.reconstruct(kind)?,
            Err(err) => {
                tracing::warn!(%kind, error = %err, "discarding unreadable session");
                self.clear_session(kind);
                return None;
            }
        };

        let now = self.now_ms();
        if session.is_expired(now) {
            tracing::info!(%kind, user = %session.principal.username, "session expired");
            self.clear_session(kind);
            return None;
        }

        session.last_activity = now.max(session.issued_at);
        if let Err(err) = self.write_record(kind, &session) {
            // The session is still good; only the activity stamp is lost.
            tracing::warn!(%kind, error = %err, "failed to refresh session activity");
        }
        Some(session)
    }

    /// Reads the composite record as stored, with no fallback and no
    /// side effects.
    ///
    /// # Errors
    /// [`SessionError::Malformed`] if the record doesn't decode or fails
    /// structural checks; [`SessionError::KindMismatch`] if it belongs to
    /// the other kind; [`SessionError::Storage`] if the backend fails.
    pub fn peek(&self, kind: SessionKind) -> Result<Option<Session>, SessionError> {
        let Some(raw) = self.backend.get(kind.record_key())? else {
            return Ok(None);
        };

        let mut session: Session =
            self.codec
                .decode(&raw)
                .map_err(|err| SessionError::Malformed {
                    kind,
                    reason: err.to_string(),
                })?;

        if let Some(reason) = session.structural_problem() {
            return Err(SessionError::Malformed { kind, reason });
        }
        if let Some(stored) = session.mismatched_kind(kind) {
            return Err(SessionError::KindMismatch {
                stored,
                requested: kind,
            });
        }
        if session.last_activity < session.issued_at {
            session.last_activity = session.issued_at;
        }
        Ok(Some(session))
    }

    /// `true` iff a session exists, is unexpired, and its principal is
    /// allowed to hold that kind of session (admin flag / active flag).
    ///
    /// A session that fails the principal check is cleared.
    pub fn is_valid(&self, kind: SessionKind) -> bool {
        let Some(session) = self.get_session(kind) else {
            return false;
        };
        if session.principal.permits(kind) {
            true
        } else {
            tracing::warn!(
                %kind,
                user = %session.principal.username,
                "principal not permitted for session kind, clearing"
            );
            self.clear_session(kind);
            false
        }
    }

    pub fn is_admin_session_valid(&self) -> bool {
        self.is_valid(SessionKind::Admin)
    }

    pub fn is_user_session_valid(&self) -> bool {
        self.is_valid(SessionKind::User)
    }

    /// Time left before the stored session expires, without refreshing it.
    pub fn time_remaining(&self, kind: SessionKind) -> Option<Duration> {
        let session = self.peek(kind).ok().flatten()?;
        let remaining = session.remaining_ms(self.now_ms());
        Some(Duration::from_millis(remaining as u64))
    }

    /// Stamps `last_activity = now` on the stored record and returns it.
    pub fn touch(&self, kind: SessionKind) -> Option<Session> {
        let mut session = self.peek(kind).ok().flatten()?;
        session.last_activity = self.now_ms().max(session.issued_at);
        if let Err(err) = self.write_record(kind, &session) {
            tracing::warn!(%kind, error = %err, "failed to refresh session activity");
        }
        Some(session)
    }

    // =====================================================================
    // Removing
    // =====================================================================

    /// Removes every key belonging to `kind`. Safe to call repeatedly.
    pub fn clear_session(&self, kind: SessionKind) {
        let legacy = kind.legacy_keys();
        for key in std::iter::once(kind.record_key()).chain(legacy.all()) {
            if let Err(err) = self.backend.remove(key) {
                tracing::warn!(%kind, key, error = %err, "failed to remove session key");
            }
        }
        tracing::info!(%kind, "session cleared");
    }

    /// Removes only the composite record, leaving legacy keys for a later
    /// [`restore`](Self::restore).
    pub fn discard(&self, kind: SessionKind) {
        if let Err(err) = self.backend.remove(kind.record_key()) {
            tracing::warn!(%kind, error = %err, "failed to discard session record");
        }
    }

    // =====================================================================
    // Legacy migration
    // =====================================================================

    /// Rebuilds the composite record from legacy keys and persists it.
    ///
    /// This is the one place legacy keys are interpreted. Returns `None`
    /// when they don't describe a usable session.
    pub fn restore(&self, kind: SessionKind) -> Option<Session> {
        self.reconstruct(kind)
    }

    fn reconstruct(&self, kind: SessionKind) -> Option<Session> {
        let keys = kind.legacy_keys();
        let read = |key: &str| match self.backend.get(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%kind, key, error = %err, "failed to read legacy key");
                None
            }
        };

        let token = read(keys.token).filter(|t| !t.is_empty())?;
        if let Some(flag) = read(keys.authenticated) {
            if flag != "true" {
                tracing::debug!(%kind, "legacy session marked unauthenticated");
                return None;
            }
        }
        let principal: Principal = match read(keys.principal).map(|raw| self.codec.decode::<Principal>(&raw)) {
            Some(Ok(principal)) => principal,
            Some(Err(err)) => {
                tracing::warn!(%kind, error = %err, "legacy principal unreadable");
                return None;
            }
            None => return None,
        };

        let now = self.now_ms();
        let issued_at = read(keys.login_time)
            .and_then(|raw| parse_timestamp(&raw))
            .unwrap_or(now);
        let expires_at = read(keys.expires_at)
            .and_then(|raw| parse_timestamp(&raw))
            .unwrap_or_else(|| issued_at.saturating_add(self.config.legacy_expiry_ms));

        let session = Session {
            kind: Some(kind),
            token,
            principal,
            issued_at,
            expires_at,
            last_activity: now.max(issued_at),
            persistent: true,
        };
        if session.structural_problem().is_some() {
            return None;
        }
        if session.is_expired(now) {
            tracing::info!(%kind, user = %session.principal.username, "legacy session already expired");
            self.clear_session(kind);
            return None;
        }

        if let Err(err) = self.write_record(kind, &session) {
            tracing::warn!(%kind, error = %err, "failed to persist reconstructed session");
        }
        tracing::info!(%kind, user = %session.principal.username, "session reconstructed from legacy keys");
        Some(session)
    }

    // =====================================================================
    // Raw writes
    // =====================================================================

    fn write_record(&self, kind: SessionKind, session: &Session) -> Result<(), StoreError> {
        let encoded = self.codec.encode(session)?;
        self.backend.set(kind.record_key(), &encoded)
    }

    fn write_legacy(&self, kind: SessionKind, session: &Session) -> Result<(), StoreError> {
        let keys = kind.legacy_keys();
        self.backend.set(keys.token, &session.token)?;
        self.backend.set(keys.authenticated, "true")?;
        self.backend
            .set(keys.login_time, &session.issued_at.to_string())?;
        self.backend
            .set(keys.principal, &self.codec.encode(&session.principal)?)?;
        self.backend
            .set(keys.expires_at, &session.expires_at.to_string())
    }
}

/// Legacy timestamps are either epoch milliseconds or an RFC 3339 string.
fn parse_timestamp(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|dt| dt.timestamp_millis())
    })
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionStore`.
    //!
    //! Naming convention: `test_{function}_{scenario}_{expected}`.
    //!
    //! Time-dependent behavior uses a `ManualClock` shared with the store,
    //! so "an hour later" is one call instead of a sleep.

    use rizal_store::{ManualClock, MemoryStore};

    use super::*;
    use crate::PrincipalId;

    const HOUR_MS: i64 = 60 * 60 * 1000;

    // -- Helpers ----------------------------------------------------------

    struct Fixture {
        backend: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        store: SessionStore<MemoryStore>,
    }

    fn fixture_with(backend: MemoryStore) -> Fixture {
        let backend = Arc::new(backend);
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let store = SessionStore::new(
            Arc::clone(&backend),
            clock.clone(),
            SessionConfig::default(),
        );
        Fixture {
            backend,
            clock,
            store,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MemoryStore::new())
    }

    fn admin() -> Principal {
        Principal {
            id: PrincipalId::from(1),
            username: "tasio".into(),
            is_admin: true,
            is_active: true,
        }
    }

    fn player() -> Principal {
        Principal {
            id: PrincipalId::from(2),
            username: "maria clara".into(),
            is_admin: false,
            is_active: true,
        }
    }

    fn hours(n: i64) -> SessionOptions {
        SessionOptions {
            persistent: true,
            expires_in_ms: n * HOUR_MS,
        }
    }

    // =====================================================================
    // set_session()
    // =====================================================================

    #[test]
    fn test_set_session_stores_composite_and_legacy_keys() {
        let f = fixture();

        assert!(f.store.set_session(SessionKind::Admin, "tok", admin(), hours(1)));

        assert!(f.backend.get("admin.session").unwrap().is_some());
        assert_eq!(f.backend.get("adminToken").unwrap().as_deref(), Some("tok"));
        assert_eq!(
            f.backend.get("adminAuthenticated").unwrap().as_deref(),
            Some("true")
        );
        assert_eq!(
            f.backend.get("adminLoginTime").unwrap().as_deref(),
            Some("1700000000000")
        );
        assert!(f.backend.get("adminUser").unwrap().is_some());
        assert_eq!(
            f.backend.get("adminExpiresAt").unwrap().as_deref(),
            Some("1700003600000")
        );
    }

    #[test]
    fn test_set_session_computes_expiry_from_now() {
        let f = fixture();
        f.store.set_session(SessionKind::User, "tok", player(), hours(2));

        let session = f.store.peek(SessionKind::User).unwrap().unwrap();

        assert_eq!(session.issued_at, 1_700_000_000_000);
        assert_eq!(session.expires_at, 1_700_000_000_000 + 2 * HOUR_MS);
        assert_eq!(session.kind, Some(SessionKind::User));
    }

    #[test]
    fn test_set_session_quota_exceeded_returns_false() {
        let f = fixture_with(MemoryStore::with_quota(16));

        let stored = f.store.set_session(SessionKind::Admin, "tok", admin(), hours(1));

        assert!(!stored, "a full store should report failure, not panic");
    }

    #[test]
    fn test_set_session_partial_write_leaves_no_session() {
        let f = fixture_with(MemoryStore::with_quota(210));

        let stored = f.store.set_session(SessionKind::User, "tok", player(), hours(1));

        assert!(!stored);
        assert!(f.store.get_session(SessionKind::User).is_none());
        assert!(f.backend.is_empty(), "a failed write must not leave keys behind");
    }

    #[test]
    fn test_sessions_of_different_kinds_are_independent() {
        let f = fixture();
        f.store.set_session(SessionKind::Admin, "a", admin(), hours(1));
        f.store.set_session(SessionKind::User, "u", player(), hours(1));

        f.store.clear_session(SessionKind::Admin);

        assert!(f.store.get_session(SessionKind::Admin).is_none());
        assert_eq!(f.store.get_session(SessionKind::User).unwrap().token, "u");
    }

    // =====================================================================
    // get_session()
    // =====================================================================

    #[test]
    fn test_get_session_refreshes_last_activity() {
        let f = fixture();
        f.store.set_session(SessionKind::User, "tok", player(), hours(1));
        f.clock.advance_ms(5_000);

        let session = f.store.get_session(SessionKind::User).unwrap();

        assert_eq!(session.last_activity, 1_700_000_005_000);
        let stored = f.store.peek(SessionKind::User).unwrap().unwrap();
        assert_eq!(stored.last_activity, 1_700_000_005_000, "stamp must be persisted");
    }

    #[test]
    fn test_get_session_expired_returns_none_and_clears() {
        let f = fixture();
        f.store.set_session(SessionKind::User, "tok", player(), hours(1));
        f.clock.advance_ms(HOUR_MS);

        assert!(f.store.get_session(SessionKind::User).is_none());
        assert!(f.backend.get("user.session").unwrap().is_none());
        assert!(f.backend.get("userToken").unwrap().is_none());
    }

    #[test]
    fn test_get_session_malformed_record_returns_none_and_clears() {
        let f = fixture();
        f.backend.set("admin.session", r#"{"token":"t"}"#).unwrap();
        f.backend.set("adminToken", "t").unwrap();

        assert!(f.store.get_session(SessionKind::Admin).is_none());
        assert!(f.backend.get("admin.session").unwrap().is_none());
        assert!(f.backend.get("adminToken").unwrap().is_none());
    }

    #[test]
    fn test_get_session_kind_mismatch_is_treated_as_malformed() {
        let f = fixture();
        f.store.set_session(SessionKind::Admin, "tok", admin(), hours(1));
        let raw = f.backend.get("admin.session").unwrap().unwrap();
        f.backend.set("user.session", &raw).unwrap();

        assert!(f.store.get_session(SessionKind::User).is_none());
    }

    #[test]
    fn test_get_session_reconstructs_from_legacy_keys() {
        let f = fixture();
        f.backend.set("adminToken", "legacy-tok").unwrap();
        f.backend.set("adminAuthenticated", "true").unwrap();
        f.backend
            .set("adminUser", r#"{"id":9,"username":"tasio","isAdmin":true}"#)
            .unwrap();

        let session = f.store.get_session(SessionKind::Admin).unwrap();

        assert_eq!(session.token, "legacy-tok");
        // No login time stored → counted from now with the legacy window.
        assert_eq!(session.issued_at, 1_700_000_000_000);
        assert_eq!(session.expires_at, 1_700_000_000_000 + 24 * HOUR_MS);
        assert!(
            f.backend.get("admin.session").unwrap().is_some(),
            "reconstruction should persist the composite record"
        );
    }

    #[test]
    fn test_get_session_legacy_login_time_rfc3339_is_honored() {
        let f = fixture();
        f.backend.set("userToken", "t").unwrap();
        f.backend.set("userData", r#"{"id":"p1","username":"basilio"}"#).unwrap();
        f.backend
            .set("userLoginTime", "2023-11-14T22:13:20Z")
            .unwrap();

        let session = f.store.get_session(SessionKind::User).unwrap();

        assert_eq!(session.issued_at, 1_700_000_000_000);
    }

    #[test]
    fn test_get_session_legacy_mirror_of_expired_record_returns_none() {
        let f = fixture();
        f.store.set_session(SessionKind::Admin, "tok", admin(), hours(8));
        f.store.discard(SessionKind::Admin);
        f.clock.advance_ms(9 * HOUR_MS);

        assert!(f.store.get_session(SessionKind::Admin).is_none());
        assert!(f.backend.is_empty(), "expired legacy keys should be cleared");
    }

    #[test]
    fn test_restore_honors_mirrored_expiry() {
        let f = fixture();
        f.store.set_session(SessionKind::User, "tok", player(), hours(2));
        f.store.discard(SessionKind::User);
        f.clock.advance_ms(HOUR_MS);

        let session = f.store.restore(SessionKind::User).unwrap();

        assert_eq!(session.expires_at, 1_700_000_000_000 + 2 * HOUR_MS);
    }

    #[test]
    fn test_get_session_legacy_unauthenticated_flag_returns_none() {
        let f = fixture();
        f.backend.set("adminToken", "t").unwrap();
        f.backend.set("adminAuthenticated", "false").unwrap();
        f.backend
            .set("adminUser", r#"{"id":1,"username":"tasio","isAdmin":true}"#)
            .unwrap();

        assert!(f.store.get_session(SessionKind::Admin).is_none());
    }

    #[test]
    fn test_get_session_nothing_stored_returns_none() {
        let f = fixture();
        assert!(f.store.get_session(SessionKind::User).is_none());
    }

    // =====================================================================
    // is_valid()
    // =====================================================================

    #[test]
    fn test_is_valid_admin_already_expired_is_false() {
        let f = fixture();
        f.store.set_session(
            SessionKind::Admin,
            "tok",
            admin(),
            SessionOptions {
                persistent: false,
                expires_in_ms: -1,
            },
        );

        assert!(!f.store.is_admin_session_valid());
    }

    #[test]
    fn test_is_valid_admin_without_admin_flag_is_false_and_cleared() {
        let f = fixture();
        f.store.set_session(SessionKind::Admin, "tok", player(), hours(1));

        assert!(!f.store.is_admin_session_valid());
        assert!(f.backend.get("admin.session").unwrap().is_none());
    }

    #[test]
    fn test_is_valid_inactive_user_is_false() {
        let f = fixture();
        let mut p = player();
        p.is_active = false;
        f.store.set_session(SessionKind::User, "tok", p, hours(1));

        assert!(!f.store.is_user_session_valid());
    }

    #[test]
    fn test_is_valid_live_sessions_are_true() {
        let f = fixture();
        f.store.set_session(SessionKind::Admin, "a", admin(), hours(1));
        f.store.set_session(SessionKind::User, "u", player(), hours(1));

        assert!(f.store.is_admin_session_valid());
        assert!(f.store.is_user_session_valid());
    }

    // =====================================================================
    // clear_session() / discard() / time_remaining()
    // =====================================================================

    #[test]
    fn test_clear_session_twice_is_harmless() {
        let f = fixture();
        f.store.set_session(SessionKind::User, "tok", player(), hours(1));

        f.store.clear_session(SessionKind::User);
        f.store.clear_session(SessionKind::User);

        assert!(f.backend.is_empty());
    }

    #[test]
    fn test_discard_keeps_legacy_keys_for_restore() {
        let f = fixture();
        f.store.set_session(SessionKind::User, "tok", player(), hours(1));

        f.store.discard(SessionKind::User);

        assert!(f.store.peek(SessionKind::User).unwrap().is_none());
        let restored = f.store.restore(SessionKind::User).unwrap();
        assert_eq!(restored.token, "tok");
    }

    #[test]
    fn test_time_remaining_counts_down() {
        let f = fixture();
        f.store.set_session(SessionKind::User, "tok", player(), hours(1));
        f.clock.advance_ms(HOUR_MS / 2);

        let remaining = f.store.time_remaining(SessionKind::User).unwrap();

        assert_eq!(remaining, Duration::from_millis((HOUR_MS / 2) as u64));
    }

    // =====================================================================
    // establish()
    // =====================================================================

    #[test]
    fn test_establish_failed_login_is_rejected() {
        let f = fixture();
        let response = LoginResponse {
            success: false,
            token: None,
            user: None,
            message: Some("wrong password".into()),
        };

        let result = f.store.establish(SessionKind::User, &response, hours(1));

        assert!(matches!(result, Err(SessionError::LoginRejected(m)) if m == "wrong password"));
    }

    #[test]
    fn test_establish_non_admin_for_admin_session_is_rejected() {
        let f = fixture();
        let response = LoginResponse {
            success: true,
            token: Some("tok".into()),
            user: Some(player()),
            message: None,
        };

        let result = f.store.establish(SessionKind::Admin, &response, hours(1));

        assert!(matches!(result, Err(SessionError::LoginRejected(_))));
        assert!(f.backend.is_empty(), "nothing should be written");
    }

    #[test]
    fn test_establish_successful_login_stores_session() {
        let f = fixture();
        let response: LoginResponse = serde_json::from_str(
            r#"{"success":true,"token":"tok","user":{"id":3,"username":"elias","isAdmin":false,"isActive":true}}"#,
        )
        .unwrap();

        let session = f
            .store
            .establish(SessionKind::User, &response, hours(1))
            .unwrap();

        assert_eq!(session.principal.username, "elias");
        assert!(f.store.is_user_session_valid());
    }

    #[test]
    fn test_parse_timestamp_accepts_both_formats() {
        assert_eq!(parse_timestamp("1700000000000"), Some(1_700_000_000_000));
        assert_eq!(
            parse_timestamp("2023-11-14T22:13:20.000Z"),
            Some(1_700_000_000_000)
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
