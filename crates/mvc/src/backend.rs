//! The per-request facade over services, managers and action resolution.

use crate::action::ActionResolver;
use crate::discovery::ClassResolver;
use crate::error::{DispatchError, FactoryError};
use crate::manager::Manager;
use crate::naming;
use crate::service::{
    Config, I18n, Logger, ObjectFactory, Renderer, ServiceRegistration, Session, UrlHandler, keys,
};
use crate::settings::AppSettings;
use arc_swap::{ArcSwap, ArcSwapOption};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error};

/// Everything one request shares: the object factory, the action resolver,
/// the managers and the current locale.
///
/// Cloning is cheap, every clone refers to the same request state.
#[derive(Clone)]
pub struct Backend {
    inner: Arc<Inner>,
}

struct Inner {
    settings: Arc<AppSettings>,
    factory: ObjectFactory,
    resolver: Arc<dyn ClassResolver>,
    action_resolver: ActionResolver,
    managers: Mutex<HashMap<String, Arc<dyn Manager>>>,
    locale: ArcSwap<String>,
    action_name: ArcSwapOption<String>,
}

impl Backend {
    pub fn new(
        settings: Arc<AppSettings>,
        registrations: Arc<HashMap<String, ServiceRegistration>>,
        resolver: Arc<dyn ClassResolver>,
    ) -> Self {
        let factory = ObjectFactory::new(Arc::clone(&settings), registrations, Arc::clone(&resolver));
        let action_resolver = ActionResolver::new(&settings, Arc::clone(&resolver));
        let locale = ArcSwap::from_pointee(settings.locale().to_string());

        Self {
            inner: Arc::new(Inner {
                settings,
                factory,
                resolver,
                action_resolver,
                managers: Mutex::default(),
                locale,
                action_name: ArcSwapOption::empty(),
            }),
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.inner.settings
    }

    pub fn app_id(&self) -> &str {
        self.inner.settings.app_id()
    }

    pub fn factory(&self) -> &ObjectFactory {
        &self.inner.factory
    }

    pub fn resolver(&self) -> &dyn ClassResolver {
        self.inner.resolver.as_ref()
    }

    pub fn action_resolver(&self) -> &ActionResolver {
        &self.inner.action_resolver
    }

    /// Any registered service, typically as an `Arc<dyn Trait>`.
    pub fn service<T>(&self, key: &str) -> Result<T, FactoryError>
    where
        T: Any + Clone + Send + Sync,
    {
        self.inner.factory.get_as(key)
    }

    pub fn config(&self) -> Result<Arc<dyn Config>, FactoryError> {
        self.service(keys::CONFIG)
    }

    pub fn logger(&self) -> Result<Arc<dyn Logger>, FactoryError> {
        self.service(keys::LOGGER)
    }

    pub fn session(&self) -> Result<Arc<dyn Session>, FactoryError> {
        self.service(keys::SESSION)
    }

    pub fn i18n(&self) -> Result<Arc<dyn I18n>, FactoryError> {
        self.service(keys::I18N)
    }

    pub fn renderer(&self) -> Result<Arc<dyn Renderer>, FactoryError> {
        self.service(keys::RENDERER)
    }

    pub fn url_handler(&self) -> Result<Arc<UrlHandler>, FactoryError> {
        self.service(keys::URL_HANDLER)
    }

    /// The manager of `manager_type`, i.e. an instance of
    /// `<AppId>_<Type>Manager`. One instance per type and request; the type
    /// is matched case-insensitively.
    pub fn manager(&self, manager_type: &str) -> Result<Arc<dyn Manager>, DispatchError> {
        let key = manager_type.to_lowercase();
        if let Some(manager) = self.lock_managers().get(&key) {
            return Ok(Arc::clone(manager));
        }

        let class_name = naming::manager_class_name(self.app_id(), manager_type);
        let Some(class) = self.inner.resolver.resolve(&class_name).and_then(|handle| handle.into_manager()) else {
            error!(class = class_name.as_str(), "manager class not found");
            return Err(DispatchError::manager_not_found(class_name));
        };

        debug!(class = class_name.as_str(), "constructing manager");
        let manager = class.instantiate(self);
        let mut managers = self.lock_managers();
        Ok(Arc::clone(managers.entry(key).or_insert(manager)))
    }

    fn lock_managers(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<dyn Manager>>> {
        self.inner.managers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The application url: config `url`, derived from the first request
    /// when not configured.
    pub fn url(&self) -> Option<String> {
        self.config().ok()?.get_str("url").filter(|url| !url.is_empty())
    }

    pub fn locale(&self) -> String {
        self.inner.locale.load().as_ref().clone()
    }

    /// Switches the language of the request and of the i18n service.
    pub fn set_locale(&self, locale: &str) {
        self.inner.locale.store(Arc::new(locale.to_string()));
        match self.i18n() {
            Ok(i18n) => i18n.set_language(locale),
            Err(e) => debug!("locale set without i18n service: {}", e),
        }
    }

    /// Translation of `message`, `message` itself when no i18n service is
    /// available.
    pub fn translate(&self, message: &str) -> String {
        self.i18n().map_or_else(|_| message.to_string(), |i18n| i18n.translate(message))
    }

    pub fn action_name(&self) -> Option<String> {
        self.inner.action_name.load_full().map(|name| name.as_ref().clone())
    }

    pub(crate) fn set_action_name(&self, action_name: &str) {
        self.inner.action_name.store(Some(Arc::new(action_name.to_string())));
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let managers = self.lock_managers().keys().cloned().collect::<Vec<_>>();
        f.debug_struct("Backend")
            .field("app_id", &self.app_id())
            .field("factory", &self.inner.factory)
            .field("managers", &managers)
            .field("locale", &self.locale())
            .field("action_name", &self.action_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::ClassRegistry;
    use crate::manager::{ManagerClass, StaticManager};
    use crate::service::{CatalogI18n, ServiceClass, builtin_classes, default_registrations, index_registrations};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn backend(registry: ClassRegistry) -> Backend {
        Backend::new(
            Arc::new(AppSettings::builder("sample").build()),
            Arc::new(index_registrations(default_registrations())),
            Arc::new(registry),
        )
    }

    fn registry() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        for class in builtin_classes() {
            registry.register(class);
        }
        registry
    }

    #[test]
    fn managers_are_cached_per_type() {
        let counter = Arc::new(AtomicUsize::new(0));
        let ctor_counter = Arc::clone(&counter);
        let registry = registry().with(ManagerClass::new("Sample_ColorManager", move |_| {
            ctor_counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(StaticManager::new().with_list("color", [("r", "Red")]))
        }));
        let backend = backend(registry);

        let first = backend.manager("color").unwrap();
        let second = backend.manager("COLOR").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_manager() {
        let error = backend(registry()).manager("size").err().unwrap();
        assert!(matches!(error, DispatchError::ManagerNotFound { ref class_name } if class_name == "Sample_SizeManager"));
    }

    #[test]
    fn set_locale_switches_catalog() {
        let registry = registry().with(ServiceClass::new("Micro_I18n").with_directory_and_app_id(|_, app_id| -> Arc<dyn I18n> {
            Arc::new(CatalogI18n::new(None, app_id).with_messages("en_US", [("Send", "Send it")]))
        }));
        let backend = backend(registry);

        assert_eq!(backend.locale(), "ja_JP");
        assert_eq!(backend.translate("Send"), "Send");

        backend.set_locale("en_US");
        assert_eq!(backend.locale(), "en_US");
        assert_eq!(backend.translate("Send"), "Send it");
    }

    #[test]
    fn url_from_config() {
        let backend = backend(registry());
        assert_eq!(backend.url(), None);

        backend.config().unwrap().set("url", serde_json::Value::from("http://example.com/"));
        assert_eq!(backend.url().as_deref(), Some("http://example.com/"));
    }

    #[test]
    fn clones_share_state() {
        let backend = backend(registry());
        let clone = backend.clone();
        clone.set_action_name("login");
        assert_eq!(backend.action_name().as_deref(), Some("login"));
    }
}
