//! Persisted settings and the store they live in.
//!
//! The extension's key-value store is the source of truth. The scanner keeps
//! a cached copy that is updated from change notifications.

use serde::Serialize;
use serde_json::Value;

/// Error type for settings persistence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The extension was reloaded or removed under a live page
    #[error("Extension context invalidated")]
    ContextInvalidated,
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Storage rejected write: {0}")]
    Rejected(String),
}

// =============================================================================
// Keys
// =============================================================================

/// One persisted toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    FilterEnabled,
    HighlightEnabled,
    MenuEnabled,
}

impl SettingKey {
    pub const ALL: [SettingKey; 3] = [Self::FilterEnabled, Self::HighlightEnabled, Self::MenuEnabled];

    /// Key name in extension storage.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::FilterEnabled => "temuLocalFilterEnabled",
            Self::HighlightEnabled => "temuLocalHighlightEnabled",
            Self::MenuEnabled => "temuFloatingMenuEnabled",
        }
    }

    pub fn default_value(self) -> bool {
        !matches!(self, Self::HighlightEnabled)
    }

    /// Interpret a raw stored value. Keys that default to on stay on unless
    /// the value is exactly `false`; the others need exactly `true`.
    pub fn coerce(self, raw: Option<&Value>) -> bool {
        if self.default_value() {
            !matches!(raw, Some(Value::Bool(false)))
        } else {
            matches!(raw, Some(Value::Bool(true)))
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Full settings snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settings {
    #[serde(rename = "temuLocalFilterEnabled")]
    pub filter_enabled: bool,
    #[serde(rename = "temuLocalHighlightEnabled")]
    pub highlight_enabled: bool,
    #[serde(rename = "temuFloatingMenuEnabled")]
    pub menu_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            filter_enabled: true,
            highlight_enabled: false,
            menu_enabled: true,
        }
    }
}

impl Settings {
    /// Build from a raw `get` result, applying the per-key coercion rules.
    ///
    /// Non-object input yields the defaults.
    pub fn from_stored(raw: &Value) -> Self {
        let read = |key: SettingKey| key.coerce(raw.get(key.storage_key()));
        Self {
            filter_enabled: read(SettingKey::FilterEnabled),
            highlight_enabled: read(SettingKey::HighlightEnabled),
            menu_enabled: read(SettingKey::MenuEnabled),
        }
    }

    pub fn get(&self, key: SettingKey) -> bool {
        match key {
            SettingKey::FilterEnabled => self.filter_enabled,
            SettingKey::HighlightEnabled => self.highlight_enabled,
            SettingKey::MenuEnabled => self.menu_enabled,
        }
    }

    pub fn apply(&mut self, change: &SettingsChange) {
        if let Some(v) = change.filter_enabled {
            self.filter_enabled = v;
        }
        if let Some(v) = change.highlight_enabled {
            self.highlight_enabled = v;
        }
        if let Some(v) = change.menu_enabled {
            self.menu_enabled = v;
        }
    }
}

// =============================================================================
// Changes
// =============================================================================

/// Partial update, as written by `set` and delivered by change notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SettingsChange {
    #[serde(rename = "temuLocalFilterEnabled", skip_serializing_if = "Option::is_none")]
    pub filter_enabled: Option<bool>,
    #[serde(rename = "temuLocalHighlightEnabled", skip_serializing_if = "Option::is_none")]
    pub highlight_enabled: Option<bool>,
    #[serde(rename = "temuFloatingMenuEnabled", skip_serializing_if = "Option::is_none")]
    pub menu_enabled: Option<bool>,
}

/// Storage area the extension uses.
pub const STORAGE_AREA: &str = "local";

impl SettingsChange {
    pub fn single(key: SettingKey, value: bool) -> Self {
        let mut change = Self::default();
        *change.slot(key) = Some(value);
        change
    }

    fn slot(&mut self, key: SettingKey) -> &mut Option<bool> {
        match key {
            SettingKey::FilterEnabled => &mut self.filter_enabled,
            SettingKey::HighlightEnabled => &mut self.highlight_enabled,
            SettingKey::MenuEnabled => &mut self.menu_enabled,
        }
    }

    /// Parse an `onChanged` payload of the form `{key: {newValue}}`.
    ///
    /// Returns `None` for other storage areas or when none of our keys changed.
    /// A removed key (no `newValue`) coerces like a missing value.
    pub fn from_storage_diff(changes: &Value, area: &str) -> Option<Self> {
        if area != STORAGE_AREA {
            return None;
        }
        let mut change = Self::default();
        for key in SettingKey::ALL {
            if let Some(entry) = changes.get(key.storage_key()) {
                *change.slot(key) = Some(key.coerce(entry.get("newValue")));
            }
        }
        (!change.is_empty()).then_some(change)
    }

    pub fn is_empty(&self) -> bool {
        self.filter_enabled.is_none() && self.highlight_enabled.is_none() && self.menu_enabled.is_none()
    }
}

// =============================================================================
// Store
// =============================================================================

/// Write side of the settings store.
pub trait SettingsStore {
    fn persist(&mut self, change: &SettingsChange) -> Result<(), StoreError>;
}

/// Store that keeps settings in memory. Used offline and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub settings: Settings,
    pub writes: Vec<SettingsChange>,
    pub fail_with: Option<StoreError>,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Store whose every write fails.
    pub fn failing(err: StoreError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::default()
        }
    }
}

impl SettingsStore for MemoryStore {
    fn persist(&mut self, change: &SettingsChange) -> Result<(), StoreError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.settings.apply(change);
        self.writes.push(*change);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_from_empty_store() {
        assert_eq!(Settings::from_stored(&json!({})), Settings::default());
        assert_eq!(Settings::from_stored(&Value::Null), Settings::default());
    }

    #[test]
    fn test_coercion_rules() {
        let stored = json!({
            "temuLocalFilterEnabled": "no",
            "temuLocalHighlightEnabled": 1,
            "temuFloatingMenuEnabled": false,
        });
        let settings = Settings::from_stored(&stored);
        assert!(settings.filter_enabled);
        assert!(!settings.highlight_enabled);
        assert!(!settings.menu_enabled);

        let stored = json!({ "temuLocalHighlightEnabled": true });
        assert!(Settings::from_stored(&stored).highlight_enabled);
    }

    #[test]
    fn test_storage_diff_parsing() {
        let diff = json!({
            "temuLocalFilterEnabled": { "oldValue": true, "newValue": false },
            "temuLocalHighlightEnabled": { "oldValue": true },
            "unrelated": { "newValue": 3 },
        });
        let change = SettingsChange::from_storage_diff(&diff, "local").unwrap();
        assert_eq!(change.filter_enabled, Some(false));
        assert_eq!(change.highlight_enabled, Some(false));
        assert_eq!(change.menu_enabled, None);

        assert_eq!(SettingsChange::from_storage_diff(&diff, "sync"), None);
        assert_eq!(SettingsChange::from_storage_diff(&json!({ "other": {} }), "local"), None);
    }

    #[test]
    fn test_change_serializes_only_set_keys() {
        let change = SettingsChange::single(SettingKey::HighlightEnabled, true);
        assert_eq!(
            serde_json::to_value(change).unwrap(),
            json!({ "temuLocalHighlightEnabled": true })
        );
        assert_eq!(
            serde_json::to_value(Settings::default()).unwrap(),
            json!({
                "temuLocalFilterEnabled": true,
                "temuLocalHighlightEnabled": false,
                "temuFloatingMenuEnabled": true,
            })
        );
    }

    #[test]
    fn test_memory_store_failure() {
        let mut store = MemoryStore::failing(StoreError::ContextInvalidated);
        let change = SettingsChange::single(SettingKey::FilterEnabled, false);
        assert_eq!(store.persist(&change), Err(StoreError::ContextInvalidated));
        assert!(store.writes.is_empty());
    }
}
