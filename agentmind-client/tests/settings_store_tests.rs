//! Settings persistence over memory and file stores.

use agentmind_client::{JsonFileStore, KeyValueStore, MemoryStore, SettingsStore, SETTINGS_KEY};
use agentmind_core::{AgentSettings, ValidationError};
use agentmind_test_utils::fixtures::minimal_settings;

fn stored(store: &impl KeyValueStore) -> Option<AgentSettings> {
    store
        .get(SETTINGS_KEY)
        .unwrap()
        .map(|raw| serde_json::from_str(&raw).unwrap())
}

#[test]
fn test_open_empty_store_uses_and_persists_defaults() {
    let settings = SettingsStore::open(MemoryStore::new());
    assert_eq!(settings.current(), &AgentSettings::default());
    assert_eq!(stored(settings.store()), Some(AgentSettings::default()));
}

#[test]
fn test_open_reads_stored_settings() {
    let raw = serde_json::to_string(&minimal_settings()).unwrap();
    let settings = SettingsStore::open(MemoryStore::with_entry(SETTINGS_KEY, raw));
    assert_eq!(settings.current(), &minimal_settings());
}

#[test]
fn test_stored_value_uses_camel_case() {
    let settings = SettingsStore::open(MemoryStore::new());
    let raw = settings.store().get(SETTINGS_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(value.get("systemPrompt").is_some());
    assert!(value.get("jsonSchema").is_some());
}

#[test]
fn test_malformed_entry_is_purged() {
    for raw in ["{not json", r#"{"systemPrompt": 1, "jsonSchema": "{}"}"#, r#"{"systemPrompt": "x"}"#] {
        let settings = SettingsStore::open(MemoryStore::with_entry(SETTINGS_KEY, raw));
        assert_eq!(settings.current(), &AgentSettings::default(), "input {}", raw);
        assert_eq!(stored(settings.store()), Some(AgentSettings::default()));
    }
}

#[test]
fn test_save_persists_immediately() {
    let mut settings = SettingsStore::open(MemoryStore::new());
    settings.save(minimal_settings()).unwrap();
    assert_eq!(settings.current(), &minimal_settings());
    assert_eq!(stored(settings.store()), Some(minimal_settings()));
}

#[test]
fn test_save_invalid_schema_keeps_previous() {
    let mut settings = SettingsStore::open(MemoryStore::new());
    settings.save(minimal_settings()).unwrap();
    let before = settings.store().get(SETTINGS_KEY).unwrap();

    let result = settings.save(AgentSettings::new("prompt", "{not json"));
    assert!(matches!(result, Err(ValidationError::InvalidSchema { .. })));
    assert_eq!(settings.current(), &minimal_settings());
    assert_eq!(settings.store().get(SETTINGS_KEY).unwrap(), before);
}

#[test]
fn test_reset_restores_defaults() {
    let mut settings = SettingsStore::open(MemoryStore::new());
    settings.save(minimal_settings()).unwrap();

    assert_eq!(settings.reset(), AgentSettings::default());
    assert_eq!(settings.current(), &AgentSettings::default());
    assert_eq!(stored(settings.store()), Some(AgentSettings::default()));
}

#[test]
fn test_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config/settings.json");

    let mut settings = SettingsStore::open(JsonFileStore::new(&path));
    settings.save(minimal_settings()).unwrap();
    drop(settings);

    let reopened = SettingsStore::open(JsonFileStore::new(&path));
    assert_eq!(reopened.current(), &minimal_settings());
}

#[test]
fn test_corrupt_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "garbage").unwrap();

    let settings = SettingsStore::open(JsonFileStore::new(&path));
    assert_eq!(settings.current(), &AgentSettings::default());
    assert_eq!(stored(settings.store()), Some(AgentSettings::default()));
}

#[test]
fn test_load_rereads_store() {
    let mut settings = SettingsStore::open(MemoryStore::new());
    let raw = serde_json::to_string(&minimal_settings()).unwrap();
    settings.store().set(SETTINGS_KEY, &raw).unwrap();

    assert_eq!(settings.load(), minimal_settings());
    assert_eq!(settings.current(), &minimal_settings());
}
