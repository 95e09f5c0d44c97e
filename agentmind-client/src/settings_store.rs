//! Persisted analyst settings.

use crate::store::{KeyValueStore, StoreError};
use agentmind_core::{AgentSettings, ValidationResult};

/// Key holding the serialized settings.
pub const SETTINGS_KEY: &str = "agentmind.settings";

/// Settings in effect, written through to a [`KeyValueStore`].
///
/// Storage failures are logged and never surface to callers; only schema
/// validation can reject an update.
pub struct SettingsStore<S: KeyValueStore> {
    store: S,
    current: AgentSettings,
}

impl<S: KeyValueStore> SettingsStore<S> {
    /// Load once and write the effective settings back.
    pub fn open(store: S) -> Self {
        let current = load(&store);
        let this = Self { store, current };
        this.persist();
        this
    }

    /// Re-read the stored value, replacing what is in effect.
    pub fn load(&mut self) -> AgentSettings {
        self.current = load(&self.store);
        self.current.clone()
    }

    pub fn current(&self) -> &AgentSettings {
        &self.current
    }

    /// Replace the settings if `next.json_schema` parses as JSON.
    pub fn save(&mut self, next: AgentSettings) -> ValidationResult<()> {
        if let Err(err) = next.validate() {
            tracing::warn!(error = %err, "Rejected settings with invalid schema");
            return Err(err);
        }
        self.current = next;
        self.persist();
        Ok(())
    }

    /// Restore compiled-in defaults.
    pub fn reset(&mut self) -> AgentSettings {
        self.current = AgentSettings::default();
        self.persist();
        self.current.clone()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.current)
            .map_err(StoreError::from)
            .and_then(|raw| self.store.set(SETTINGS_KEY, &raw));
        if let Err(err) = result {
            tracing::warn!(error = %err, "Failed to persist settings");
        }
    }
}

/// Stored settings, or defaults when absent or malformed.
///
/// A malformed entry is removed. The schema text itself is not checked here.
pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> AgentSettings {
    let raw = match store.get(SETTINGS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return AgentSettings::default(),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to read persisted settings");
            return AgentSettings::default();
        }
    };

    match serde_json::from_str::<AgentSettings>(&raw) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!(error = %err, "Failed to parse persisted settings");
            if let Err(err) = store.remove(SETTINGS_KEY) {
                tracing::warn!(error = %err, "Failed to discard persisted settings");
            }
            AgentSettings::default()
        }
    }
}
