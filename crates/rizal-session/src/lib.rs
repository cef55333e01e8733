//! Session management for Rizal Quest.
//!
//! The game keeps two independent sessions in the same browser: one for
//! the admin dashboard, one for the player. This crate handles:
//!
//! 1. **Storage** — writing, reading, and clearing session records
//!    ([`SessionStore`]), including migration from legacy flat keys
//! 2. **Validation** — deciding whether a stored session may be used right
//!    now ([`SessionValidator`]), with a typed [`ValidationError`]
//! 3. **Recovery** — resurrecting an expired session from legacy keys
//!    before falling back to a login redirect
//!
//! # How it fits in the stack
//!
//! ```text
//! Facade (above)         ← gates admin operations, tracks player progress
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Store Layer (below)    ← KeyValueStore, JsonCodec, Clock
//! ```

#![allow(async_fn_in_trait)]

mod error;
mod permission;
mod session;
mod store;
mod token;
mod validator;

pub use error::{SessionError, ValidationError};
pub use permission::{PermissionChecker, StoredPermissions};
pub use session::{
    LoginResponse, Principal, PrincipalId, Session, SessionConfig, SessionKind,
    SessionOptions,
};
pub use store::SessionStore;
pub use token::{decode_token_expiry, unsigned_token};
pub use validator::{Access, FailureAction, SessionValidator};
