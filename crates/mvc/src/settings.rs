//! Application wide settings shared by every request.

use crate::naming;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_FORM_CLASS: &str = "Micro_ActionForm";

/// Static settings of one application: identity, directories, file
/// extensions and language.
///
/// Relative directories are resolved against the base directory when the
/// settings are built.
#[derive(Debug, Clone)]
pub struct AppSettings {
    app_id: String,
    base: PathBuf,
    directories: HashMap<String, PathBuf>,
    extensions: HashMap<String, String>,
    locale: String,
    encoding: String,
    default_action: String,
    default_form_class: String,
}

impl AppSettings {
    pub fn builder(app_id: impl AsRef<str>) -> AppSettingsBuilder {
        AppSettingsBuilder::new(app_id.as_ref())
    }

    /// The normalized application id, e.g. `Sample`.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn directory(&self, key: &str) -> Option<&Path> {
        self.directories.get(key).map(PathBuf::as_path)
    }

    pub fn ext(&self, key: &str) -> Option<&str> {
        self.extensions.get(key).map(String::as_str)
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn default_action(&self) -> &str {
        &self.default_action
    }

    pub fn default_form_class(&self) -> &str {
        &self.default_form_class
    }

    /// Template directory with the locale appended, so that every language
    /// gets its own template tree.
    pub fn template_dir(&self) -> Option<PathBuf> {
        let template = self.directory("template")?;
        if self.locale.is_empty() { Some(template.to_path_buf()) } else { Some(template.join(&self.locale)) }
    }

    pub fn view_dir(&self) -> Option<&Path> {
        self.directory("view")
    }

    pub fn etc_dir(&self) -> Option<&Path> {
        self.directory("etc")
    }

    pub fn tmp_dir(&self) -> Option<&Path> {
        self.directory("tmp")
    }

    pub fn template_ext(&self) -> &str {
        self.ext("tpl").unwrap_or("tpl")
    }
}

#[derive(Debug)]
pub struct AppSettingsBuilder {
    app_id: String,
    base: PathBuf,
    directories: Vec<(String, PathBuf)>,
    extensions: HashMap<String, String>,
    locale: String,
    encoding: String,
    default_action: String,
    default_form_class: String,
}

impl AppSettingsBuilder {
    fn new(app_id: &str) -> Self {
        let extensions = HashMap::from([("tpl".to_string(), "tpl".to_string())]);
        Self {
            app_id: naming::normalize_app_id(app_id),
            base: PathBuf::new(),
            directories: vec![],
            extensions,
            locale: "ja_JP".into(),
            encoding: "UTF-8".into(),
            default_action: "index".into(),
            default_form_class: DEFAULT_FORM_CLASS.into(),
        }
    }

    pub fn base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = base.into();
        self
    }

    pub fn directory(mut self, key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.directories.push((key.into(), path.into()));
        self
    }

    pub fn ext(mut self, key: impl Into<String>, ext: impl Into<String>) -> Self {
        self.extensions.insert(key.into(), ext.into());
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn default_action(mut self, action_name: impl Into<String>) -> Self {
        self.default_action = action_name.into();
        self
    }

    pub fn default_form_class(mut self, class_name: impl Into<String>) -> Self {
        self.default_form_class = class_name.into();
        self
    }

    pub fn build(self) -> AppSettings {
        let base = self.base;
        let directories = self
            .directories
            .into_iter()
            .map(|(key, path)| {
                let path = if path.is_relative() { base.join(path) } else { path };
                (key, path)
            })
            .collect();

        AppSettings {
            app_id: self.app_id,
            base,
            directories,
            extensions: self.extensions,
            locale: self.locale,
            encoding: self.encoding,
            default_action: self.default_action,
            default_form_class: self.default_form_class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_directories_are_based() {
        let settings = AppSettings::builder("SAMPLE")
            .base("/srv/sample")
            .directory("template", "template")
            .directory("etc", "/etc/sample")
            .locale("en_US")
            .build();

        assert_eq!(settings.app_id(), "Sample");
        assert_eq!(settings.directory("template"), Some(Path::new("/srv/sample/template")));
        assert_eq!(settings.etc_dir(), Some(Path::new("/etc/sample")));
        assert_eq!(settings.template_dir(), Some(PathBuf::from("/srv/sample/template/en_US")));
        assert_eq!(settings.directory("missing"), None);
    }

    #[test]
    fn defaults() {
        let settings = AppSettings::builder("sample").build();
        assert_eq!(settings.locale(), "ja_JP");
        assert_eq!(settings.encoding(), "UTF-8");
        assert_eq!(settings.default_form_class(), DEFAULT_FORM_CLASS);
        assert_eq!(settings.template_ext(), "tpl");
    }
}
