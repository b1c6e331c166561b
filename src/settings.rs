//! User preference storage
//!
//! Preferences live in an external async key-value store (the host supplies
//! the backend). `SettingsStore` wraps the raw store with typed accessors
//! for the three keys the assistant uses.

use crate::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Key holding the user's preferred language code.
pub const KEY_USER_LANGUAGE: &str = "userLanguage";
/// Key holding the language selected in the popup (may differ from the
/// user's own language).
pub const KEY_SELECTED_LANGUAGE: &str = "selectedLanguage";
/// Key holding whether voice mode is enabled.
pub const KEY_VOICE_MODE: &str = "voiceMode";

/// Async key-value storage backend
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fetch the requested keys. Missing keys are simply absent from the map.
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>>;

    /// Store the given key-value pairs.
    async fn set(&self, values: HashMap<String, Value>) -> Result<()>;
}

/// In-process storage backend
///
/// Useful for tests and for hosts without a persistence layer.
#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let values = self.values.lock();
        Ok(keys
            .iter()
            .filter_map(|k| values.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, new_values: HashMap<String, Value>) -> Result<()> {
        self.values.lock().extend(new_values);
        Ok(())
    }
}

/// Typed accessor over the preference keys
#[derive(Clone)]
pub struct SettingsStore {
    storage: Arc<dyn Storage>,
}

impl SettingsStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Seed `userLanguage` from the system language tag on first run.
    ///
    /// Mirrors install-time setup: "en-US" becomes "en". Existing values
    /// are not overwritten.
    pub async fn seed_defaults(&self, system_language: &str) -> Result<()> {
        let existing = self.storage.get(&[KEY_USER_LANGUAGE]).await?;
        if existing.contains_key(KEY_USER_LANGUAGE) {
            return Ok(());
        }
        let code = crate::language::base_code(system_language).to_string();
        info!("Default language set: {}", code);
        self.storage
            .set(HashMap::from([(
                KEY_USER_LANGUAGE.to_string(),
                Value::String(code),
            )]))
            .await
    }

    /// The user's preferred language code, defaulting to "en".
    pub async fn user_language(&self) -> String {
        self.string_value(KEY_USER_LANGUAGE).await.unwrap_or_else(|| "en".to_string())
    }

    pub async fn set_user_language(&self, code: &str) -> Result<()> {
        self.storage
            .set(HashMap::from([(
                KEY_USER_LANGUAGE.to_string(),
                Value::String(code.to_string()),
            )]))
            .await
    }

    /// The popup's selected target language, falling back to the user language.
    pub async fn selected_language(&self) -> String {
        match self.string_value(KEY_SELECTED_LANGUAGE).await {
            Some(code) => code,
            None => self.user_language().await,
        }
    }

    pub async fn set_selected_language(&self, code: &str) -> Result<()> {
        self.storage
            .set(HashMap::from([(
                KEY_SELECTED_LANGUAGE.to_string(),
                Value::String(code.to_string()),
            )]))
            .await
    }

    /// Whether voice mode is currently enabled, defaulting to false.
    pub async fn voice_mode(&self) -> bool {
        self.storage
            .get(&[KEY_VOICE_MODE])
            .await
            .ok()
            .and_then(|mut m| m.remove(KEY_VOICE_MODE))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub async fn set_voice_mode(&self, enabled: bool) -> Result<()> {
        self.storage
            .set(HashMap::from([(
                KEY_VOICE_MODE.to_string(),
                Value::Bool(enabled),
            )]))
            .await
    }

    async fn string_value(&self, key: &str) -> Option<String> {
        self.storage
            .get(&[key])
            .await
            .ok()
            .and_then(|mut m| m.remove(key))
            .and_then(|v| v.as_str().map(str::to_string))
    }
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore").finish_non_exhaustive()
    }
}
