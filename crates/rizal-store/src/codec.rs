//! Codec trait and implementations for persisted records.
//!
//! A "codec" (coder/decoder) converts between Rust types and the strings
//! the key-value store holds. The session and progress layers don't care
//! HOW a record is serialized, only that something implements [`Codec`].
//!
//! Currently we provide [`JsonCodec`]: stored records stay readable in
//! browser DevTools and compatible with data written by earlier versions
//! of the game.

use serde::{Serialize, de::DeserializeOwned};

use crate::StoreError;

/// A codec that can encode Rust types to stored strings and back.
///
/// The methods are *generic*: `encode` works for any `T: Serialize`,
/// `decode` for any `T: DeserializeOwned`. `DeserializeOwned` (vs plain
/// `Deserialize`) means the decoded record owns all its data and doesn't
/// borrow from the input string.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a record into a string.
    ///
    /// # Errors
    /// Returns `StoreError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, StoreError>;

    /// Deserializes a stored string back into a record.
    ///
    /// # Errors
    /// Returns `StoreError::Decode` if the string is malformed or doesn't
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &str) -> Result<T, StoreError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use rizal_store::{Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let text = codec.encode(&vec![1, 2, 3]).unwrap();
/// assert_eq!(text, "[1,2,3]");
///
/// let back: Vec<u32> = codec.decode(&text).unwrap();
/// assert_eq!(back, vec![1, 2, 3]);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, StoreError> {
        serde_json::to_string(value).map_err(StoreError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &str) -> Result<T, StoreError> {
        serde_json::from_str(data).map_err(StoreError::Decode)
    }
}

/// Recursively merges `overlay` into `base`.
///
/// Objects are merged key by key; any other value in `overlay` (including
/// arrays and `null`) replaces the one in `base`. Keys that only exist in
/// `base` survive. This is how an old save is laid over a newer default
/// template: fields introduced after the save was written keep their
/// template values instead of going missing.
#[cfg(feature = "json")]
pub fn deep_merge(base: &mut serde_json::Value, overlay: serde_json::Value) {
    use serde_json::Value;

    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_malformed_returns_decode_error() {
        let result: Result<Vec<u32>, _> = JsonCodec.decode("{not json");
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_deep_merge_keeps_template_only_fields() {
        let mut base = json!({ "a": 1, "nested": { "x": 1, "y": 2 } });
        deep_merge(&mut base, json!({ "nested": { "x": 10 } }));
        assert_eq!(base, json!({ "a": 1, "nested": { "x": 10, "y": 2 } }));
    }

    #[test]
    fn test_deep_merge_replaces_arrays_wholesale() {
        let mut base = json!({ "list": [1, 2, 3] });
        deep_merge(&mut base, json!({ "list": [9] }));
        assert_eq!(base, json!({ "list": [9] }));
    }

    #[test]
    fn test_deep_merge_adds_unknown_keys() {
        let mut base = json!({ "a": 1 });
        deep_merge(&mut base, json!({ "b": 2 }));
        assert_eq!(base, json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn test_deep_merge_null_overrides() {
        let mut base = json!({ "date": 5 });
        deep_merge(&mut base, json!({ "date": null }));
        assert_eq!(base, json!({ "date": null }));
    }
}
