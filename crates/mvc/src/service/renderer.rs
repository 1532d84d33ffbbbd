use crate::error::BoxError;
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tera::{Context, Tera};
use thiserror::Error;
use tracing::debug;

/// Turns a template and its data into markup.
pub trait Renderer: Send + Sync + Debug {
    fn render(&self, template: &str, data: &Value) -> Result<String, BoxError>;
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("template [{name}] not found")]
    TemplateNotFound { name: String },

    #[error(transparent)]
    Template(#[from] tera::Error),
}

/// Renders templates with [`tera`].
///
/// Every template under the template directory is loaded on the first
/// render, named by its path relative to the directory. Templates may also be
/// registered from memory; a registered template shadows the file of the
/// same name. Output is escaped whatever the template extension, `| safe`
/// marks a value as markup.
#[derive(Debug)]
pub struct TeraRenderer {
    template_dir: Option<PathBuf>,
    tera: RwLock<Tera>,
    dir_loaded: OnceCell<()>,
}

impl TeraRenderer {
    pub fn new(template_dir: Option<PathBuf>) -> Self {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![""]);
        Self { template_dir, tera: RwLock::new(tera), dir_loaded: OnceCell::new() }
    }

    pub fn register(&self, name: &str, source: &str) -> Result<(), RenderError> {
        self.write().add_raw_template(name, source)?;
        Ok(())
    }

    fn load_dir(&self) -> Result<(), RenderError> {
        let Some(dir) = self.template_dir.as_deref().filter(|dir| dir.is_dir()) else {
            debug!("no template directory to load");
            return Ok(());
        };

        let glob = format!("{}/**/*", dir.display());
        let loaded = Tera::new(&glob)?;
        debug!(dir = %dir.display(), templates = loaded.get_template_names().count(), "templates loaded");
        self.write().extend(&loaded)?;
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Tera> {
        self.tera.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tera> {
        self.tera.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Renderer for TeraRenderer {
    fn render(&self, template: &str, data: &Value) -> Result<String, BoxError> {
        self.dir_loaded.get_or_try_init(|| self.load_dir())?;

        let context = match data {
            Value::Null => Context::new(),
            data => Context::from_value(data.clone()).map_err(RenderError::from)?,
        };

        let tera = self.read();
        if !tera.get_template_names().any(|name| name == template) {
            return Err(RenderError::TemplateNotFound { name: template.to_string() }.into());
        }
        let html = tera.render(template, &context).map_err(RenderError::from)?;
        Ok(html)
    }
}
