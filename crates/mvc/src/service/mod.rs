//! Services and the object factory that builds them.
//!
//! A service is identified by a symbolic key (`config`, `logger`, ...). The
//! key is bound by a [`ServiceRegistration`] to a class identifier, a
//! [`ConstructionStrategy`] and a [`Capability`]; the class itself
//! ([`ServiceClass`]) is found through class discovery and carries the
//! constructors.
//!
//! Trait services are stored as `Arc<dyn Trait>` so that callers can fetch
//! them with `factory.get_as::<Arc<dyn Config>>(keys::CONFIG)`.

mod config;
mod factory;
mod i18n;
mod logger;
mod renderer;
mod session;
mod url_handler;

pub use config::{Config, JsonConfig};
pub use factory::ObjectFactory;
pub use i18n::{CatalogI18n, I18n};
pub use logger::{Logger, TracingLogger};
pub use renderer::{RenderError, Renderer, TeraRenderer};
pub use session::{MemorySession, Session};
pub use url_handler::UrlHandler;

use crate::error::FactoryError;
use crate::settings::AppSettings;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub type ServiceObject = Arc<dyn Any + Send + Sync>;

type AnyCtor = Arc<dyn Fn() -> ServiceObject + Send + Sync>;
type ControllerCtor = Arc<dyn Fn(&AppSettings) -> ServiceObject + Send + Sync>;
type ControllerAppIdCtor = Arc<dyn Fn(&AppSettings, &str) -> ServiceObject + Send + Sync>;
type DirectoryAppIdCtor = Arc<dyn Fn(Option<&Path>, &str) -> ServiceObject + Send + Sync>;

/// Well known service keys.
pub mod keys {
    pub const CONFIG: &str = "config";
    pub const LOGGER: &str = "logger";
    pub const I18N: &str = "i18n";
    pub const SESSION: &str = "session";
    pub const RENDERER: &str = "renderer";
    pub const URL_HANDLER: &str = "url_handler";
}

/// Class identifiers of the services shipped with the framework.
pub mod classes {
    pub const CONFIG: &str = "Micro_Config";
    pub const LOGGER: &str = "Micro_Logger";
    pub const I18N: &str = "Micro_I18n";
    pub const SESSION: &str = "Micro_Session";
    pub const RENDERER: &str = "Micro_Renderer";
    pub const URL_HANDLER: &str = "Micro_UrlHandler";
}

/// Who owns the lifecycle of a service instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capability {
    /// The factory caches the instance for the lifetime of one request.
    #[default]
    FactoryManaged,
    /// The class exposes its own accessor, which is called on every lookup.
    SelfManaged,
}

/// Which constructor of the class the factory calls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConstructionStrategy {
    #[default]
    DefaultNew,
    FactoryMethod,
    UsesController,
    UsesControllerAndAppId,
    /// The named directory of the application and the application id.
    UsesDirectoryAndAppId(String),
}

impl ConstructionStrategy {
    fn label(&self) -> &'static str {
        match self {
            ConstructionStrategy::DefaultNew => "default",
            ConstructionStrategy::FactoryMethod => "accessor",
            ConstructionStrategy::UsesController => "controller",
            ConstructionStrategy::UsesControllerAndAppId => "controller and app id",
            ConstructionStrategy::UsesDirectoryAndAppId(_) => "directory and app id",
        }
    }
}

/// Binds a service key to a class. Immutable once the kernel is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistration {
    key: String,
    class_name: String,
    strategy: ConstructionStrategy,
    capability: Capability,
}

impl ServiceRegistration {
    pub fn new(key: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            class_name: class_name.into(),
            strategy: ConstructionStrategy::default(),
            capability: Capability::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: ConstructionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn self_managed(mut self) -> Self {
        self.capability = Capability::SelfManaged;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn strategy(&self) -> &ConstructionStrategy {
        &self.strategy
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }
}

/// The registrations of the built-in services.
pub fn default_registrations() -> Vec<ServiceRegistration> {
    vec![
        ServiceRegistration::new(keys::CONFIG, classes::CONFIG).with_strategy(ConstructionStrategy::UsesController),
        ServiceRegistration::new(keys::LOGGER, classes::LOGGER).with_strategy(ConstructionStrategy::UsesController),
        ServiceRegistration::new(keys::I18N, classes::I18N)
            .with_strategy(ConstructionStrategy::UsesDirectoryAndAppId("locale".into())),
        ServiceRegistration::new(keys::SESSION, classes::SESSION)
            .with_strategy(ConstructionStrategy::UsesControllerAndAppId),
        ServiceRegistration::new(keys::RENDERER, classes::RENDERER).with_strategy(ConstructionStrategy::UsesController),
        ServiceRegistration::new(keys::URL_HANDLER, classes::URL_HANDLER)
            .with_strategy(ConstructionStrategy::FactoryMethod)
            .self_managed(),
    ]
}

/// The classes of the built-in services.
pub fn builtin_classes() -> Vec<ServiceClass> {
    vec![
        ServiceClass::new(classes::CONFIG)
            .with_controller(|settings| -> Arc<dyn Config> { Arc::new(JsonConfig::from_settings(settings)) }),
        ServiceClass::new(classes::LOGGER)
            .with_controller(|settings| -> Arc<dyn Logger> { Arc::new(TracingLogger::new(settings.app_id())) }),
        ServiceClass::new(classes::I18N)
            .with_directory_and_app_id(|dir, app_id| -> Arc<dyn I18n> { Arc::new(CatalogI18n::new(dir, app_id)) }),
        ServiceClass::new(classes::SESSION)
            .with_controller_and_app_id(|_, app_id| -> Arc<dyn Session> { Arc::new(MemorySession::new(app_id)) }),
        ServiceClass::new(classes::RENDERER).with_controller(|settings| -> Arc<dyn Renderer> {
            Arc::new(TeraRenderer::new(settings.template_dir()))
        }),
        ServiceClass::new(classes::URL_HANDLER).with_accessor(UrlHandler::get_global_instance),
    ]
}

/// A service class: its identifier and the constructors it offers.
pub struct ServiceClass {
    name: String,
    default: Option<AnyCtor>,
    accessor: Option<AnyCtor>,
    controller: Option<ControllerCtor>,
    controller_app_id: Option<ControllerAppIdCtor>,
    directory_app_id: Option<DirectoryAppIdCtor>,
}

impl ServiceClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            accessor: None,
            controller: None,
            controller_app_id: None,
            directory_app_id: None,
        }
    }

    /// No-argument constructor.
    pub fn with_default<T, F>(mut self, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(move || -> ServiceObject { Arc::new(f()) }));
        self
    }

    /// The class' own singleton accessor.
    pub fn with_accessor<T, F>(mut self, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.accessor = Some(Arc::new(move || -> ServiceObject { Arc::new(f()) }));
        self
    }

    pub fn with_controller<T, F>(mut self, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&AppSettings) -> T + Send + Sync + 'static,
    {
        self.controller = Some(Arc::new(move |settings: &AppSettings| -> ServiceObject { Arc::new(f(settings)) }));
        self
    }

    pub fn with_controller_and_app_id<T, F>(mut self, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&AppSettings, &str) -> T + Send + Sync + 'static,
    {
        self.controller_app_id =
            Some(Arc::new(move |settings: &AppSettings, app_id: &str| -> ServiceObject { Arc::new(f(settings, app_id)) }));
        self
    }

    pub fn with_directory_and_app_id<T, F>(mut self, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(Option<&Path>, &str) -> T + Send + Sync + 'static,
    {
        self.directory_app_id =
            Some(Arc::new(move |dir: Option<&Path>, app_id: &str| -> ServiceObject { Arc::new(f(dir, app_id)) }));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_accessor(&self) -> bool {
        self.accessor.is_some()
    }

    /// Calls the class' own accessor.
    pub(crate) fn access(&self) -> Result<ServiceObject, FactoryError> {
        self.accessor
            .as_ref()
            .map(|accessor| accessor())
            .ok_or_else(|| FactoryError::missing_constructor(&self.name, "accessor"))
    }

    /// Builds a new instance: the constructor matching `strategy` if the class
    /// has one, else the accessor, else the no-argument constructor.
    pub(crate) fn construct(
        &self,
        strategy: &ConstructionStrategy,
        settings: &AppSettings,
    ) -> Result<ServiceObject, FactoryError> {
        let specialized = match strategy {
            ConstructionStrategy::DefaultNew => self.default.as_ref().map(|ctor| ctor()),
            ConstructionStrategy::FactoryMethod => self.accessor.as_ref().map(|accessor| accessor()),
            ConstructionStrategy::UsesController => self.controller.as_ref().map(|ctor| ctor(settings)),
            ConstructionStrategy::UsesControllerAndAppId => {
                self.controller_app_id.as_ref().map(|ctor| ctor(settings, settings.app_id()))
            }
            ConstructionStrategy::UsesDirectoryAndAppId(dir) => {
                self.directory_app_id.as_ref().map(|ctor| ctor(settings.directory(dir), settings.app_id()))
            }
        };

        specialized
            .or_else(|| self.accessor.as_ref().map(|accessor| accessor()))
            .or_else(|| self.default.as_ref().map(|ctor| ctor()))
            .ok_or_else(|| FactoryError::missing_constructor(&self.name, strategy.label()))
    }
}

impl fmt::Debug for ServiceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClass")
            .field("name", &self.name)
            .field("default", &self.default.is_some())
            .field("accessor", &self.accessor.is_some())
            .field("controller", &self.controller.is_some())
            .field("controller_app_id", &self.controller_app_id.is_some())
            .field("directory_app_id", &self.directory_app_id.is_some())
            .finish()
    }
}

/// Registrations indexed by key.
pub(crate) fn index_registrations(
    registrations: impl IntoIterator<Item = ServiceRegistration>,
) -> HashMap<String, ServiceRegistration> {
    registrations.into_iter().map(|registration| (registration.key().to_string(), registration)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    struct Tagged(&'static str);

    fn settings() -> AppSettings {
        AppSettings::builder("sample").base("/srv").directory("locale", "locale").build()
    }

    fn tag(object: &ServiceObject) -> &'static str {
        object.downcast_ref::<Tagged>().map(|tagged| tagged.0).unwrap_or("?")
    }

    #[test]
    fn specialized_constructor_first() {
        let class = ServiceClass::new("Sample_Mailer")
            .with_default(|| Tagged("default"))
            .with_accessor(|| Tagged("accessor"))
            .with_controller(|_| Tagged("controller"));

        let object = class.construct(&ConstructionStrategy::UsesController, &settings()).unwrap();
        assert_eq!(tag(&object), "controller");
    }

    #[test]
    fn accessor_before_default() {
        let class = ServiceClass::new("Sample_Mailer").with_default(|| Tagged("default")).with_accessor(|| Tagged("accessor"));

        let object = class.construct(&ConstructionStrategy::UsesControllerAndAppId, &settings()).unwrap();
        assert_eq!(tag(&object), "accessor");
    }

    #[test]
    fn default_as_last_resort() {
        let class = ServiceClass::new("Sample_Mailer").with_default(|| Tagged("default"));

        let object = class.construct(&ConstructionStrategy::UsesController, &settings()).unwrap();
        assert_eq!(tag(&object), "default");
    }

    #[test]
    fn directory_and_app_id_are_passed() {
        let class = ServiceClass::new("Sample_I18n")
            .with_directory_and_app_id(|dir, app_id| format!("{}|{}", dir.map(|d| d.display().to_string()).unwrap_or_default(), app_id));

        let object = class
            .construct(&ConstructionStrategy::UsesDirectoryAndAppId("locale".into()), &settings())
            .unwrap();
        assert_eq!(object.downcast_ref::<String>().map(String::as_str), Some("/srv/locale|Sample"));
    }

    #[test]
    fn no_constructor_at_all() {
        let class = ServiceClass::new("Sample_Empty");
        let error = class.construct(&ConstructionStrategy::DefaultNew, &settings()).unwrap_err();
        assert!(matches!(error, FactoryError::MissingConstructor { strategy: "default", .. }));
        assert!(matches!(class.access(), Err(FactoryError::MissingConstructor { .. })));
    }

    #[test]
    fn builtin_registrations_have_classes() {
        let classes = builtin_classes();
        for registration in default_registrations() {
            assert!(classes.iter().any(|class| class.name() == registration.class_name()), "{}", registration.key());
        }
    }
}
