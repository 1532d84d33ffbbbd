use crate::settings::AppSettings;
use arc_swap::ArcSwap;
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Application configuration: a flat table of JSON values.
pub trait Config: Send + Sync + Debug {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value);

    fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|value| value.as_str().map(str::to_string))
    }
}

/// Configuration read from `<etc>/<appid>-ini.json`.
///
/// Reads never block, writes replace the whole table.
#[derive(Debug)]
pub struct JsonConfig {
    values: ArcSwap<Map<String, Value>>,
}

impl Default for JsonConfig {
    fn default() -> Self {
        Self::new(Map::new())
    }
}

impl JsonConfig {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values: ArcSwap::from_pointee(values) }
    }

    /// Loads the configuration file of the application. A missing or broken
    /// file yields an empty configuration.
    pub fn from_settings(settings: &AppSettings) -> Self {
        let Some(etc_dir) = settings.etc_dir() else {
            return Self::default();
        };
        let path = etc_dir.join(format!("{}-ini.json", settings.app_id().to_lowercase()));
        Self::from_file(&path).unwrap_or_default()
    }

    pub fn from_file(path: &Path) -> Option<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %path.display(), "no configuration file: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Map<String, Value>>(&content) {
            Ok(values) => Some(Self::new(values)),
            Err(e) => {
                warn!(path = %path.display(), "invalid configuration file: {}", e);
                None
            }
        }
    }
}

impl Config for JsonConfig {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.load().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.values.rcu(|values| {
            let mut values = Map::clone(values);
            values.insert(key.to_string(), value.clone());
            Arc::new(values)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_then_get() {
        let config = JsonConfig::default();
        assert_eq!(config.get("url"), None);

        config.set("url", json!("http://example.com/"));
        config.set("debug", json!(true));

        assert_eq!(config.get_str("url").as_deref(), Some("http://example.com/"));
        assert_eq!(config.get("debug"), Some(json!(true)));
        assert_eq!(config.get_str("debug"), None);
    }

    #[test]
    fn loads_application_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("sample-ini.json"), r#"{"url": "http://sample.test/", "dsn": "sqlite::memory:"}"#).unwrap();

        let settings = AppSettings::builder("sample").directory("etc", dir.path()).build();
        let config = JsonConfig::from_settings(&settings);

        assert_eq!(config.get_str("url").as_deref(), Some("http://sample.test/"));
        assert_eq!(config.get_str("dsn").as_deref(), Some("sqlite::memory:"));
    }

    #[test]
    fn missing_file_is_empty() {
        let settings = AppSettings::builder("sample").directory("etc", "/nonexistent/micro-mvc").build();
        assert_eq!(JsonConfig::from_settings(&settings).get("url"), None);
    }
}
