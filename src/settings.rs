//! Persistent user preferences.
//!
//! Values are kept as raw JSON so that whatever is on disk can be inspected, but
//! every read goes through [`sanitize`]: a stored value outside its valid set is
//! treated as absent and the default is returned instead.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex as AsyncMutex;

use crate::error::SettingsError;
use crate::model::{AssetClass, Language, Settings};
use crate::persist::{read_json, to_json, write_atomic};

pub const SETTINGS_FILE: &str = "settings.json";

pub const KEY_LAUNCH_AT_LOGIN: &str = "launchAtLogin";
pub const KEY_INDEX_TYPE: &str = "indexType";
pub const KEY_LANGUAGE: &str = "language";

#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    values: RwLock<Map<String, Value>>,
    writer: AsyncMutex<()>,
}

impl SettingsStore {
    /// Open the store backed by `path`. Unreadable or corrupt files yield an
    /// empty store (all defaults); the file is rewritten on the next set.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match read_json::<Map<String, Value>>(&path) {
            Ok(Some(m)) => m,
            Ok(None) => Map::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "settings unreadable, using defaults");
                Map::new()
            }
        };
        Self {
            path: Some(path),
            values: RwLock::new(values),
            writer: AsyncMutex::new(()),
        }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::open(dir.join(SETTINGS_FILE))
    }

    /// Non-persistent store, for tests and the demo binary.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: RwLock::new(Map::new()),
            writer: AsyncMutex::new(()),
        }
    }

    pub fn get_settings(&self) -> Settings {
        sanitize(&self.values.read())
    }

    pub fn index_type(&self) -> AssetClass {
        self.get_settings().index_type
    }

    pub fn language(&self) -> Language {
        self.get_settings().language
    }

    /// Generic validated setter. Unknown keys and out-of-set values are
    /// rejected without touching the stored state.
    pub async fn set_setting(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        validate(key, &value)?;
        self.write(key, value).await;
        Ok(())
    }

    pub async fn set_index_type(&self, asset: AssetClass) {
        self.write(KEY_INDEX_TYPE, Value::from(asset.as_str())).await;
    }

    pub async fn set_language(&self, lang: Language) {
        self.write(KEY_LANGUAGE, Value::from(lang.as_str())).await;
    }

    pub async fn set_launch_at_login(&self, enabled: bool) {
        self.write(KEY_LAUNCH_AT_LOGIN, Value::Bool(enabled)).await;
    }

    /// In-memory update always lands; a failed persist is only logged.
    async fn write(&self, key: &str, value: Value) {
        self.values.write().insert(key.to_string(), value);
        tracing::debug!(key, "setting updated");
        let Some(path) = &self.path else {
            return;
        };

        let _writing = self.writer.lock().await;
        let latest = self.values.read().clone();
        let res = match to_json(&latest) {
            Ok(bytes) => write_atomic(path, &bytes).await,
            Err(e) => Err(e),
        };
        if let Err(e) = res {
            tracing::warn!(path = %path.display(), key, error = %e, "persisting settings failed");
        }
    }
}

fn validate(key: &str, value: &Value) -> Result<(), SettingsError> {
    let ok = match key {
        KEY_LAUNCH_AT_LOGIN => value.is_boolean(),
        KEY_INDEX_TYPE => value.as_str().and_then(AssetClass::parse).is_some(),
        KEY_LANGUAGE => value.as_str().and_then(Language::parse).is_some(),
        other => return Err(SettingsError::UnknownKey(other.to_string())),
    };
    if ok {
        Ok(())
    } else {
        Err(SettingsError::InvalidValue(key.to_string()))
    }
}

fn sanitize(values: &Map<String, Value>) -> Settings {
    let defaults = Settings::default();
    Settings {
        launch_at_login: values
            .get(KEY_LAUNCH_AT_LOGIN)
            .and_then(Value::as_bool)
            .unwrap_or(defaults.launch_at_login),
        index_type: values
            .get(KEY_INDEX_TYPE)
            .and_then(Value::as_str)
            .and_then(AssetClass::parse)
            .unwrap_or(defaults.index_type),
        language: values
            .get(KEY_LANGUAGE)
            .and_then(Value::as_str)
            .and_then(Language::parse)
            .unwrap_or(defaults.language),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fresh_store_has_defaults() {
        let s = SettingsStore::in_memory().get_settings();
        assert!(!s.launch_at_login);
        assert_eq!(s.index_type, AssetClass::Stock);
        assert_eq!(s.language, Language::En);
    }

    #[tokio::test]
    async fn bogus_index_type_is_rejected_and_prior_value_kept() {
        let store = SettingsStore::in_memory();
        store.set_setting(KEY_INDEX_TYPE, json!("crypto")).await.unwrap();
        let err = store
            .set_setting(KEY_INDEX_TYPE, json!("bogus"))
            .await
            .unwrap_err();
        assert_eq!(err, SettingsError::InvalidValue(KEY_INDEX_TYPE.into()));
        assert_eq!(store.get_settings().index_type, AssetClass::Crypto);
    }

    #[tokio::test]
    async fn unknown_key_and_wrong_types_are_rejected() {
        let store = SettingsStore::in_memory();
        assert_eq!(
            store.set_setting("theme", json!("dark")).await,
            Err(SettingsError::UnknownKey("theme".into()))
        );
        assert!(store.set_setting(KEY_LAUNCH_AT_LOGIN, json!("yes")).await.is_err());
        assert!(store.set_setting(KEY_LANGUAGE, json!("fr")).await.is_err());
        assert!(store.set_setting(KEY_LANGUAGE, json!(1)).await.is_err());
        assert_eq!(store.get_settings(), Settings::default());
    }

    #[test]
    fn invalid_values_on_disk_fall_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(SETTINGS_FILE);
        std::fs::write(
            &path,
            r#"{"launchAtLogin": "true", "indexType": "forex", "language": "ko"}"#,
        )
        .unwrap();
        let s = SettingsStore::open(&path).get_settings();
        assert!(!s.launch_at_login);
        assert_eq!(s.index_type, AssetClass::Stock);
        assert_eq!(s.language, Language::Ko);
    }

    #[test]
    fn corrupt_file_means_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(SETTINGS_FILE);
        std::fs::write(&path, "][").unwrap();
        assert_eq!(SettingsStore::open(&path).get_settings(), Settings::default());
    }

    #[tokio::test]
    async fn settings_survive_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = SettingsStore::in_dir(tmp.path());
            store.set_launch_at_login(true).await;
            store.set_language(Language::Ko).await;
            store.set_index_type(AssetClass::Crypto).await;
        }
        let s = SettingsStore::in_dir(tmp.path()).get_settings();
        assert_eq!(
            s,
            Settings {
                launch_at_login: true,
                index_type: AssetClass::Crypto,
                language: Language::Ko,
            }
        );
    }

    #[tokio::test]
    async fn write_failure_keeps_in_memory_value() {
        let tmp = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = tmp.path().join("blocked");
        std::fs::create_dir_all(path.join("child")).unwrap();
        let store = SettingsStore::open(&path);
        store.set_language(Language::Ko).await;
        assert_eq!(store.language(), Language::Ko);
    }
}
