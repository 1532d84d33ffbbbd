use crate::form::field::{FieldValue, OptionSource};
use indexmap::IndexMap;

/// Parameters that steer rendering and are never emitted as attributes.
pub const HELPER_PARAMETER_KEYS: [&str; 3] = ["default", "option", "separator"];

/// Per-call overrides of a field rendering: HTML attributes in insertion
/// order, plus the value override and the meta parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderParams {
    pub(crate) attrs: IndexMap<String, Option<String>>,
    pub(crate) value: Option<FieldValue>,
    pub(crate) default: Option<FieldValue>,
    pub(crate) option: Option<OptionSource>,
    pub(crate) separator: Option<String>,
    pub(crate) empty_option: Option<String>,
}

impl RenderParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets parameter `key`. The meta keys (`value`, `default`, `option`,
    /// `separator`, `emptyoption`) are routed to their own slot, anything
    /// else becomes an attribute.
    pub fn set(mut self, key: &str, value: &str) -> Self {
        match key {
            "value" => self.value = Some(value.into()),
            "default" => self.default = Some(value.into()),
            "option" => self.option = Some(OptionSource::Reference(value.to_string())),
            "separator" => self.separator = Some(value.to_string()),
            "emptyoption" => self.empty_option = Some(value.to_string()),
            _ => {
                self.attrs.insert(key.to_string(), Some(value.to_string()));
            }
        }
        self
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), Some(value.into()));
        self
    }

    /// An attribute without value, e.g. `multiple`.
    pub fn flag(mut self, key: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), None);
        self
    }

    pub fn value(mut self, value: impl Into<FieldValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn default_value(mut self, default: impl Into<FieldValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn option(mut self, option: impl Into<OptionSource>) -> Self {
        self.option = Some(option.into());
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    pub fn empty_option(mut self, label: impl Into<String>) -> Self {
        self.empty_option = Some(label.into());
        self
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }

    pub(crate) fn separator_or_default(&self) -> &str {
        self.separator.as_deref().unwrap_or("\n")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RenderParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |params, (k, v)| params.set(&k.into(), &v.into()))
    }
}
