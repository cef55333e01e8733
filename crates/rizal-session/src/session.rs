//! Session types: the records that say who is signed in.
//!
//! There are two independent sessions at any time, one per
//! [`SessionKind`]. Each tracks:
//! - WHO is signed in (`Principal`)
//! - HOW they prove it (an opaque bearer `token`)
//! - WHEN it was issued, when it expires, and when it was last used

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// SessionKind
// ---------------------------------------------------------------------------

/// Which of the two sessions a record belongs to.
///
/// Admin and player sessions are stored under separate keys and validated
/// by separate rules, so an admin signing in never disturbs a player
/// session in the same browser (and vice versa).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Admin,
    User,
}

impl SessionKind {
    /// Key of the composite session record.
    pub fn record_key(self) -> &'static str {
        match self {
            Self::Admin => "admin.session",
            Self::User => "user.session",
        }
    }

    /// Legacy flat keys kept in sync for older readers.
    pub(crate) fn legacy_keys(self) -> LegacyKeys {
        match self {
            Self::Admin => LegacyKeys {
                token: "adminToken",
                authenticated: "adminAuthenticated",
                login_time: "adminLoginTime",
                principal: "adminUser",
                expires_at: "adminExpiresAt",
            },
            Self::User => LegacyKeys {
                token: "userToken",
                authenticated: "userAuthenticated",
                login_time: "userLoginTime",
                principal: "userData",
                expires_at: "userExpiresAt",
            },
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

/// The flat keys an older build wrote instead of a composite record.
///
/// Older builds never wrote `expires_at`; when it is present it mirrors
/// the composite record's expiry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LegacyKeys {
    pub(crate) token: &'static str,
    pub(crate) authenticated: &'static str,
    pub(crate) login_time: &'static str,
    pub(crate) principal: &'static str,
    pub(crate) expires_at: &'static str,
}

impl LegacyKeys {
    pub(crate) fn all(&self) -> [&'static str; 5] {
        [
            self.token,
            self.authenticated,
            self.login_time,
            self.principal,
            self.expires_at,
        ]
    }
}

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

/// Identifier of a signed-in account.
///
/// The auth backend sends numeric ids, older saves hold strings. Both
/// deserialize into the same textual form so comparisons just work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PrincipalId(pub String);

impl<'de> Deserialize<'de> for PrincipalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

impl From<&str> for PrincipalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for PrincipalId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The identity record attached to a session.
///
/// `is_active` defaults to `true` when absent: an account is only
/// considered inactive when the backend explicitly says so.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: PrincipalId,
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Principal {
    /// Whether this principal may hold a session of the given kind.
    pub fn permits(&self, kind: SessionKind) -> bool {
        match kind {
            SessionKind::Admin => self.is_admin,
            SessionKind::User => self.is_active,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One stored session (the composite record).
///
/// Timestamps are epoch milliseconds. `kind` is optional because records
/// rebuilt from very old saves don't carry one; when present it must match
/// the key the record was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SessionKind>,
    pub token: String,
    #[serde(rename = "user", alias = "principal")]
    pub principal: Principal,
    pub issued_at: i64,
    pub expires_at: i64,
    #[serde(default)]
    pub last_activity: i64,
    #[serde(default)]
    pub persistent: bool,
}

impl Session {
    /// Returns `true` once `now` has reached the expiry time.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }

    /// Milliseconds left before expiry (zero when already expired).
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        self.expires_at.saturating_sub(now_ms).max(0)
    }

    /// Checks the fields serde can't: a token and a named principal.
    pub(crate) fn structural_problem(&self) -> Option<String> {
        if self.token.is_empty() {
            return Some("token is empty".into());
        }
        if self.principal.id.0.is_empty() {
            return Some("principal id is empty".into());
        }
        if self.principal.username.is_empty() {
            return Some("principal username is empty".into());
        }
        None
    }

    /// Returns the stored kind if it differs from `expected`.
    pub(crate) fn mismatched_kind(&self, expected: SessionKind) -> Option<SessionKind> {
        self.kind.filter(|stored| *stored != expected)
    }
}

// ---------------------------------------------------------------------------
// SessionConfig / SessionOptions
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
///
/// Sensible defaults are provided; override just the fields you need.
/// Missing fields in a loaded config fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Lifetime of a new admin session. Default: 8 hours.
    pub admin_expires_in_ms: i64,

    /// Lifetime of a new player session. Default: 7 days.
    pub user_expires_in_ms: i64,

    /// Lifetime assumed for a session rebuilt from legacy keys, counted
    /// from the legacy login time. Default: 24 hours.
    pub legacy_expiry_ms: i64,

    /// Where a failed admin validation sends the browser.
    pub admin_login_path: String,

    /// Where a failed player validation sends the browser.
    pub user_login_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        const HOUR_MS: i64 = 60 * 60 * 1000;
        Self {
            admin_expires_in_ms: 8 * HOUR_MS,
            user_expires_in_ms: 7 * 24 * HOUR_MS,
            legacy_expiry_ms: 24 * HOUR_MS,
            admin_login_path: "/admin/login".into(),
            user_login_path: "/login".into(),
        }
    }
}

impl SessionConfig {
    /// Login screen for the given session kind.
    pub fn login_path(&self, kind: SessionKind) -> &str {
        match kind {
            SessionKind::Admin => &self.admin_login_path,
            SessionKind::User => &self.user_login_path,
        }
    }

    /// Default lifetime for a new session of the given kind.
    pub fn expires_in_ms(&self, kind: SessionKind) -> i64 {
        match kind {
            SessionKind::Admin => self.admin_expires_in_ms,
            SessionKind::User => self.user_expires_in_ms,
        }
    }
}

/// Per-login options for [`SessionStore::set_session`](crate::SessionStore::set_session).
///
/// `expires_in_ms` may be zero or negative, which yields a session that
/// is already expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Whether the session should survive a full browser restart.
    pub persistent: bool,
    pub expires_in_ms: i64,
}

impl SessionOptions {
    /// Persistent session with the configured lifetime for `kind`.
    pub fn for_kind(kind: SessionKind, config: &SessionConfig) -> Self {
        Self {
            persistent: true,
            expires_in_ms: config.expires_in_ms(kind),
        }
    }
}

// ---------------------------------------------------------------------------
// LoginResponse
// ---------------------------------------------------------------------------

/// Body of the auth backend's `POST /auth/login` response.
///
/// ```json
/// { "success": true, "token": "...", "user": { "id": 7, "username": "crisostomo", "isAdmin": false, "isActive": true } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<Principal>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal_json(extra: &str) -> String {
        format!(r#"{{"id":7,"username":"crisostomo"{extra}}}"#)
    }

    #[test]
    fn test_principal_numeric_id_deserializes_as_text() {
        let p: Principal = serde_json::from_str(&principal_json("")).unwrap();
        assert_eq!(p.id, PrincipalId("7".into()));
    }

    #[test]
    fn test_principal_missing_flags_defaults_active_not_admin() {
        let p: Principal = serde_json::from_str(&principal_json("")).unwrap();
        assert!(p.is_active);
        assert!(!p.is_admin);
    }

    #[test]
    fn test_principal_permits_by_kind() {
        let p: Principal =
            serde_json::from_str(&principal_json(r#","isAdmin":true,"isActive":false"#))
                .unwrap();
        assert!(p.permits(SessionKind::Admin));
        assert!(!p.permits(SessionKind::User));
    }

    #[test]
    fn test_session_missing_expires_at_fails_to_decode() {
        let json = format!(
            r#"{{"token":"t","user":{},"issuedAt":1}}"#,
            principal_json("")
        );
        let result: Result<Session, _> = serde_json::from_str(&json);
        assert!(result.is_err());
    }

    #[test]
    fn test_session_accepts_principal_alias() {
        let json = format!(
            r#"{{"token":"t","principal":{},"issuedAt":1,"expiresAt":2}}"#,
            principal_json("")
        );
        let session: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(session.principal.username, "crisostomo");
        assert_eq!(session.kind, None);
    }

    #[test]
    fn test_session_is_expired_at_boundary() {
        let json = format!(
            r#"{{"token":"t","user":{},"issuedAt":0,"expiresAt":100}}"#,
            principal_json("")
        );
        let session: Session = serde_json::from_str(&json).unwrap();
        assert!(!session.is_expired(99));
        assert!(session.is_expired(100));
        assert_eq!(session.remaining_ms(40), 60);
        assert_eq!(session.remaining_ms(400), 0);
    }

    #[test]
    fn test_session_remaining_ms_extreme_expiry_is_zero() {
        let json = format!(
            r#"{{"token":"t","user":{},"issuedAt":0,"expiresAt":{}}}"#,
            principal_json(""),
            i64::MIN
        );
        let session: Session = serde_json::from_str(&json).unwrap();
        assert!(session.is_expired(1_700_000_000_000));
        assert_eq!(session.remaining_ms(1_700_000_000_000), 0);
    }

    #[test]
    fn test_mismatched_kind_detects_other_kind() {
        let json = format!(
            r#"{{"kind":"admin","token":"t","user":{},"issuedAt":0,"expiresAt":100}}"#,
            principal_json("")
        );
        let session: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(session.structural_problem(), None);
        assert_eq!(session.mismatched_kind(SessionKind::Admin), None);
        assert_eq!(session.mismatched_kind(SessionKind::User), Some(SessionKind::Admin));
    }

    #[test]
    fn test_structural_problem_empty_username() {
        let json = r#"{"token":"t","user":{"id":1,"username":""},"issuedAt":0,"expiresAt":1}"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert!(session.structural_problem().is_some());
    }

    #[test]
    fn test_session_kind_keys_are_distinct() {
        assert_eq!(SessionKind::Admin.record_key(), "admin.session");
        assert_eq!(SessionKind::User.record_key(), "user.session");
        assert_eq!(SessionKind::Admin.legacy_keys().token, "adminToken");
        assert_eq!(SessionKind::User.legacy_keys().principal, "userData");
    }

    #[test]
    fn test_config_login_paths() {
        let config = SessionConfig::default();
        assert_eq!(config.login_path(SessionKind::Admin), "/admin/login");
        assert_eq!(config.login_path(SessionKind::User), "/login");
    }

    #[test]
    fn test_config_partial_json_fills_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"user_login_path":"/play/login"}"#).unwrap();
        assert_eq!(config.user_login_path, "/play/login");
        assert_eq!(config, SessionConfig {
            user_login_path: "/play/login".into(),
            ..SessionConfig::default()
        });
    }
}
