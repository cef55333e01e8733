//! Error types for the store layer.
//!
//! Each crate in Rizal Quest defines its own error enum. A `StoreError`
//! always means the problem is in persistence (a full store, a record that
//! won't parse), never in session or progress rules.

/// Errors that can occur while reading or writing the key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The write would push the store past its size limit.
    ///
    /// Browsers cap `localStorage` at a few megabytes; [`MemoryStore`]
    /// can be given a quota to reproduce the same failure in tests.
    ///
    /// [`MemoryStore`]: crate::MemoryStore
    #[error("storage quota exceeded writing {key}: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    /// Serialization failed (turning a record into a stored string).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing required fields,
    /// or a field of the wrong type.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The backend itself is unusable (e.g. a poisoned lock).
    #[error("storage backend unavailable: {0}")]
    Backend(String),
}
