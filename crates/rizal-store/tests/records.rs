//! Integration tests: typed records through a codec into a backend.

use std::sync::Arc;

use rizal_store::{Codec, JsonCodec, KeyValueStore, MemoryStore, StoreError, deep_merge};
use serde::{Deserialize, Serialize};

// =========================================================================
// Helpers
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Profile {
    name: String,
    level: u32,
    #[serde(default)]
    title: Option<String>,
}

fn shared_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

// =========================================================================
// Tests
// =========================================================================

#[test]
fn test_record_written_through_one_handle_is_visible_through_another() {
    let store = shared_store();
    let writer = Arc::clone(&store);
    let reader = Arc::clone(&store);

    let profile = Profile {
        name: "Ibarra".into(),
        level: 3,
        title: None,
    };
    writer
        .set("profile", &JsonCodec.encode(&profile).unwrap())
        .unwrap();

    let raw = reader.get("profile").unwrap().expect("record should exist");
    let decoded: Profile = JsonCodec.decode(&raw).unwrap();
    assert_eq!(decoded, profile);
}

#[test]
fn test_record_missing_required_field_fails_to_decode() {
    let store = shared_store();
    store.set("profile", r#"{"name":"Elias"}"#).unwrap();

    let raw = store.get("profile").unwrap().unwrap();
    let result: Result<Profile, _> = JsonCodec.decode(&raw);

    assert!(matches!(result, Err(StoreError::Decode(_))));
}

#[test]
fn test_old_record_merged_over_template_gains_new_fields() {
    let template = serde_json::json!({ "name": "", "level": 1, "title": "Estudyante" });
    let old: serde_json::Value = serde_json::from_str(r#"{"name":"Sisa","level":4}"#).unwrap();

    let mut merged = template;
    deep_merge(&mut merged, old);
    let profile: Profile = serde_json::from_value(merged).unwrap();

    assert_eq!(profile.name, "Sisa");
    assert_eq!(profile.level, 4);
    assert_eq!(profile.title.as_deref(), Some("Estudyante"));
}

#[test]
fn test_quota_failure_leaves_previous_value_untouched() {
    let store = MemoryStore::with_quota(32);
    store.set("k", "small").unwrap();

    let big = "x".repeat(64);
    assert!(store.set("k", &big).is_err());

    assert_eq!(store.get("k").unwrap().as_deref(), Some("small"));
}
