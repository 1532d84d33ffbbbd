use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Message translation for the current language.
pub trait I18n: Send + Sync + Debug {
    fn set_language(&self, locale: &str);

    fn language(&self) -> String;

    /// Returns the translation of `message`, or `message` itself when the
    /// catalog has none.
    fn translate(&self, message: &str) -> String;
}

#[derive(Debug, Default)]
struct Catalog {
    locale: String,
    messages: HashMap<String, String>,
}

/// Message catalogs stored as `<locale dir>/<locale>/<appid>.json`, a JSON
/// object mapping messages to translations.
///
/// Catalogs added with [`CatalogI18n::with_messages`] take precedence over
/// files.
#[derive(Debug)]
pub struct CatalogI18n {
    locale_dir: Option<PathBuf>,
    app_id: String,
    preloaded: HashMap<String, HashMap<String, String>>,
    catalog: ArcSwap<Catalog>,
}

impl CatalogI18n {
    pub fn new(locale_dir: Option<&Path>, app_id: &str) -> Self {
        Self {
            locale_dir: locale_dir.map(Path::to_path_buf),
            app_id: app_id.to_lowercase(),
            preloaded: HashMap::new(),
            catalog: ArcSwap::from_pointee(Catalog::default()),
        }
    }

    pub fn with_messages<I, K, V>(mut self, locale: impl Into<String>, messages: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let messages = messages.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.preloaded.insert(locale.into(), messages);
        self
    }

    fn load(&self, locale: &str) -> HashMap<String, String> {
        if let Some(messages) = self.preloaded.get(locale) {
            return messages.clone();
        }

        let Some(dir) = self.locale_dir.as_ref() else {
            return HashMap::new();
        };
        let path = dir.join(locale).join(format!("{}.json", self.app_id));
        let parsed = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str::<HashMap<String, String>>(&content).map_err(|e| e.to_string()));

        match parsed {
            Ok(messages) => messages,
            Err(e) => {
                debug!(path = %path.display(), "message catalog not loaded: {}", e);
                HashMap::new()
            }
        }
    }
}

impl I18n for CatalogI18n {
    fn set_language(&self, locale: &str) {
        if self.catalog.load().locale == locale {
            return;
        }
        let messages = self.load(locale);
        self.catalog.store(Catalog { locale: locale.to_string(), messages }.into());
    }

    fn language(&self) -> String {
        self.catalog.load().locale.clone()
    }

    fn translate(&self, message: &str) -> String {
        self.catalog.load().messages.get(message).cloned().unwrap_or_else(|| message.to_string())
    }
}
