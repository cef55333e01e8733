//! Per-player progress persistence.
//!
//! Each player's save lives under `progress.<normalized username>` as one
//! JSON blob. Loading always merges the stored blob over a fresh template,
//! so saves written before a field existed pick up its default instead of
//! failing to decode.
//!
//! # Lost updates
//!
//! Two tabs can load the same save, complete different levels, and save
//! in turn. Every save carries a `version`; [`ProgressStore::try_save`]
//! refuses to write over a record whose version moved since it was
//! loaded, so the second tab gets [`ProgressError::Conflict`] instead of
//! silently erasing the first tab's work.
//!
//! # Unreadable saves
//!
//! A stored record that still won't decode after the merge is copied to
//! `progress-unreadable.<normalized username>` before anything may write
//! over it. Until that copy exists, saves for the player are refused with
//! [`ProgressError::Unreadable`].

use std::sync::Arc;

use rizal_store::{Clock, Codec, JsonCodec, KeyValueStore, StoreError, deep_merge};
use serde_json::Value;

use crate::{CourseLayout, ProgressError, UserProgress};

/// Prefix shared by every progress key.
pub const KEY_PREFIX: &str = "progress.";

/// Key of the save used when no username is known.
pub const GUEST_KEY: &str = "progress.guest";

/// Prefix of the copies kept of saves that failed to decode.
pub const UNREADABLE_PREFIX: &str = "progress-unreadable.";

/// Canonical form of a username for use in a storage key: trimmed,
/// lowercased, internal whitespace collapsed to `_`.
///
/// This is lossy ("Jose Rizal" and "jose_rizal" share a key), which is
/// why the display name is stored inside the record as well.
pub fn normalize_username(username: &str) -> String {
    username
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// The storage key for `username`'s save.
pub fn storage_key(username: &str) -> String {
    let normalized = normalize_username(username);
    if normalized.is_empty() {
        GUEST_KEY.to_string()
    } else {
        format!("{KEY_PREFIX}{normalized}")
    }
}

/// Where an undecodable save at `key` is kept.
fn unreadable_key(key: &str) -> String {
    format!("{UNREADABLE_PREFIX}{}", key.strip_prefix(KEY_PREFIX).unwrap_or(key))
}

/// Brings an older or hand-edited record closer to the template's shape.
///
/// A `null` where the template has a value is dropped so the default
/// applies, and a fractional number where the template holds an integer
/// is rounded.
fn conform(stored: &mut Value, template: &Value) {
    let (Value::Object(stored), Value::Object(template)) = (stored, template) else {
        return;
    };
    stored.retain(|key, value| !(value.is_null() && template.get(key).is_some_and(|t| !t.is_null())));

    for (key, value) in stored.iter_mut() {
        let Some(expected) = template.get(key) else {
            continue;
        };
        let rounded = match &*value {
            Value::Number(n) if expected.is_u64() && !n.is_u64() => n
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.round() as u64),
            _ => None,
        };
        if let Some(rounded) = rounded {
            *value = Value::from(rounded);
        } else if value.is_object() {
            conform(value, expected);
        }
    }
}

/// Loads and saves [`UserProgress`] records in a shared key-value backend.
pub struct ProgressStore<S: KeyValueStore> {
    backend: Arc<S>,
    clock: Arc<dyn Clock>,
    layout: CourseLayout,
    codec: JsonCodec,
}

impl<S: KeyValueStore> Clone for ProgressStore<S> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            clock: Arc::clone(&self.clock),
            layout: self.layout.clone(),
            codec: self.codec,
        }
    }
}

impl<S: KeyValueStore> ProgressStore<S> {
    /// Creates a store for saves shaped by `layout`.
    pub fn new(backend: Arc<S>, clock: Arc<dyn Clock>, layout: CourseLayout) -> Self {
        Self {
            backend,
            clock,
            layout: layout.validated(),
            codec: JsonCodec,
        }
    }

    pub fn layout(&self) -> &CourseLayout {
        &self.layout
    }

    /// The clock saves are stamped with; the engine should use the same one.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// A fresh save for `username`, not yet stored.
    pub fn template(&self, username: &str) -> UserProgress {
        let mut progress = UserProgress::new(username.trim(), &self.layout);
        progress.created_at = Some(self.clock.now_ms());
        progress
    }

    // =====================================================================
    // Loading
    // =====================================================================

    /// Loads `username`'s save, or a fresh one.
    ///
    /// A record that can't be read or decoded is logged and replaced by
    /// the template. A copy of it is kept first; see the module docs.
    pub fn load(&self, username: &str) -> UserProgress {
        match self.try_load(username) {
            Ok(progress) => progress,
            Err(err) => {
                tracing::warn!(username, error = %err, "unreadable progress, starting fresh");
                self.set_aside(username);
                let mut progress = self.template(username);
                progress.last_accessed = Some(self.clock.now_ms());
                progress
            }
        }
    }

    /// Like [`load`](Self::load), but reports why a stored record was unusable.
    pub fn try_load(&self, username: &str) -> Result<UserProgress, ProgressError> {
        let key = storage_key(username);
        let template = self.template(username);

        let mut progress = match self.backend.get(&key)? {
            None => {
                tracing::debug!(username, %key, "no saved progress");
                template
            }
            Some(raw) => {
                let progress = self.decode(&raw, template)?;
                tracing::debug!(username, version = progress.version, "progress loaded");
                progress
            }
        };
        progress.last_accessed = Some(self.clock.now_ms());
        Ok(progress)
    }

    /// Merges a stored blob over `template` and decodes the result.
    fn decode(&self, raw: &str, template: UserProgress) -> Result<UserProgress, ProgressError> {
        let mut stored: Value = self.codec.decode(raw)?;
        let mut merged = serde_json::to_value(&template).map_err(StoreError::Encode)?;
        conform(&mut stored, &merged);
        deep_merge(&mut merged, stored);
        let mut progress: UserProgress =
            serde_json::from_value(merged).map_err(StoreError::Decode)?;
        if progress.username.is_empty() {
            progress.username = template.username;
        }
        Ok(progress)
    }

    /// Copies `username`'s stored record to its unreadable key.
    fn set_aside(&self, username: &str) {
        let key = storage_key(username);
        let raw = match self.backend.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(username, error = %err, "failed to read progress to set aside");
                return;
            }
        };
        let kept = unreadable_key(&key);
        if matches!(self.backend.get(&kept), Ok(Some(ref existing)) if *existing == raw) {
            return;
        }
        match self.backend.set(&kept, &raw) {
            Ok(()) => tracing::warn!(username, key = %kept, "unreadable progress set aside"),
            Err(err) => tracing::error!(username, error = %err, "failed to set aside unreadable progress"),
        }
    }

    // =====================================================================
    // Saving
    // =====================================================================

    /// Saves `progress` for `username`, returning `false` on any failure.
    ///
    /// On success `progress` carries its new version and save stamps.
    pub fn save(&self, username: &str, progress: &mut UserProgress) -> bool {
        match self.try_save(username, progress) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(username, error = %err, "failed to save progress");
                false
            }
        }
    }

    /// Saves `progress` if nobody else has saved since it was loaded.
    ///
    /// # Errors
    ///
    /// - [`ProgressError::Conflict`] if the stored version differs from
    ///   `progress.version`.
    /// - [`ProgressError::Unreadable`] if the stored record doesn't decode
    ///   and no copy of it has been set aside.
    /// - [`ProgressError::Storage`] if encoding or the write fails; the
    ///   stored record and `progress` are both left as they were.
    pub fn try_save(&self, username: &str, progress: &mut UserProgress) -> Result<(), ProgressError> {
        let key = storage_key(username);
        let found = self.stored_version(username, &key)?;
        if found != progress.version {
            return Err(ProgressError::Conflict {
                username: username.to_string(),
                expected: progress.version,
                found,
            });
        }

        let now = self.clock.now_ms();
        let mut next = progress.clone();
        next.version += 1;
        next.last_saved = Some(now);
        next.last_accessed = Some(now);
        next.created_at.get_or_insert(now);
        if next.username.is_empty() {
            next.username = username.trim().to_string();
        }

        let raw = self.codec.encode(&next)?;
        self.backend.set(&key, &raw)?;
        tracing::debug!(username, version = next.version, "progress saved");
        *progress = next;
        Ok(())
    }

    /// Version of the stored record; `0` when absent or already set aside.
    fn stored_version(&self, username: &str, key: &str) -> Result<u64, ProgressError> {
        let Some(raw) = self.backend.get(key)? else {
            return Ok(0);
        };
        match self.decode(&raw, self.template(username)) {
            Ok(stored) => Ok(stored.version),
            Err(err) => {
                let kept = self.backend.get(&unreadable_key(key))?;
                if kept.as_deref() == Some(raw.as_str()) {
                    tracing::info!(username, "writing over progress that was set aside");
                    Ok(0)
                } else {
                    Err(ProgressError::Unreadable {
                        username: username.to_string(),
                        reason: err.to_string(),
                    })
                }
            }
        }
    }

    // =====================================================================
    // Administration
    // =====================================================================

    /// Display names of every player with a save, sorted.
    ///
    /// The guest save is not a player and is skipped. Records without a
    /// stored name fall back to the key with `_` read as a space.
    pub fn enumerate_users(&self) -> Vec<String> {
        let keys = match self.backend.keys() {
            Ok(keys) => keys,
            Err(err) => {
                tracing::warn!(error = %err, "failed to list progress records");
                return Vec::new();
            }
        };

        let mut users: Vec<String> = keys
            .iter()
            .filter(|key| key.as_str() != GUEST_KEY)
            .filter_map(|key| {
                let suffix = key.strip_prefix(KEY_PREFIX)?;
                Some(self.stored_name(key).unwrap_or_else(|| suffix.replace('_', " ")))
            })
            .collect();
        users.sort();
        users
    }

    fn stored_name(&self, key: &str) -> Option<String> {
        let raw = self.backend.get(key).ok()??;
        let value: Value = serde_json::from_str(&raw).ok()?;
        value
            .get("username")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .map(str::to_string)
    }

    /// `true` if `username` has a stored save.
    pub fn exists(&self, username: &str) -> bool {
        matches!(self.backend.get(&storage_key(username)), Ok(Some(_)))
    }

    /// Deletes `username`'s save. Deleting a missing save succeeds.
    pub fn erase(&self, username: &str) -> bool {
        match self.backend.remove(&storage_key(username)) {
            Ok(()) => {
                tracing::info!(username, "progress erased");
                true
            }
            Err(err) => {
                tracing::warn!(username, error = %err, "failed to erase progress");
                false
            }
        }
    }
}
