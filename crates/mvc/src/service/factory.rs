use crate::discovery::ClassResolver;
use crate::error::FactoryError;
use crate::service::{Capability, ServiceClass, ServiceObject, ServiceRegistration};
use crate::settings::AppSettings;
use once_cell::sync::OnceCell;
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Builds and caches the services of one request.
///
/// Every registered key owns two cells: the resolved class and the
/// constructed instance. A cell is filled at most once, so concurrent
/// first lookups of the same key observe the same instance. Services with
/// [`Capability::SelfManaged`] are never cached here; their accessor is
/// called on every lookup.
#[derive(Debug)]
pub struct ObjectFactory {
    settings: Arc<AppSettings>,
    registrations: Arc<HashMap<String, ServiceRegistration>>,
    resolver: Arc<dyn ClassResolver>,
    classes: HashMap<String, OnceCell<Arc<ServiceClass>>>,
    objects: HashMap<String, OnceCell<ServiceObject>>,
}

impl ObjectFactory {
    pub fn new(
        settings: Arc<AppSettings>,
        registrations: Arc<HashMap<String, ServiceRegistration>>,
        resolver: Arc<dyn ClassResolver>,
    ) -> Self {
        let classes = registrations.keys().map(|key| (key.clone(), OnceCell::new())).collect();
        let objects = registrations.keys().map(|key| (key.clone(), OnceCell::new())).collect();
        Self { settings, registrations, resolver, classes, objects }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn registration(&self, key: &str) -> Option<&ServiceRegistration> {
        self.registrations.get(key)
    }

    /// Returns the service registered under `key`, constructing it on first use.
    pub fn get(&self, key: &str) -> Result<ServiceObject, FactoryError> {
        let Some(registration) = self.registrations.get(key) else {
            error!(key, "undefined service");
            return Err(FactoryError::unregistered_service(key));
        };

        let class = self.class(registration)?;

        if registration.capability() == Capability::SelfManaged {
            return class.access();
        }

        let cell = self.objects.get(key).ok_or_else(|| FactoryError::unregistered_service(key))?;
        cell.get_or_try_init(|| {
            debug!(key, class = class.name(), "constructing service");
            class.construct(registration.strategy(), &self.settings)
        })
        .map(Arc::clone)
    }

    /// Returns the service under `key` as a `T`, typically an `Arc<dyn Trait>`.
    pub fn get_as<T>(&self, key: &str) -> Result<T, FactoryError>
    where
        T: Any + Clone + Send + Sync,
    {
        let object = self.get(key)?;
        object.downcast_ref::<T>().cloned().ok_or_else(|| FactoryError::type_mismatch(key, type_name::<T>()))
    }

    /// Whether the instance for `key` has been constructed and cached.
    pub fn is_cached(&self, key: &str) -> bool {
        self.objects.get(key).is_some_and(|cell| cell.get().is_some())
    }

    fn class(&self, registration: &ServiceRegistration) -> Result<Arc<ServiceClass>, FactoryError> {
        let key = registration.key();
        let cell = self.classes.get(key).ok_or_else(|| FactoryError::unregistered_service(key))?;
        cell.get_or_try_init(|| {
            self.resolver
                .resolve(registration.class_name())
                .and_then(|handle| handle.into_service())
                .ok_or_else(|| {
                    error!(key, class = registration.class_name(), "service class not found");
                    FactoryError::class_not_found(key, registration.class_name())
                })
        })
        .map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::ClassRegistry;
    use crate::service::{ConstructionStrategy, UrlHandler, builtin_classes, default_registrations, index_registrations};
    use crate::service::{Config, keys};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Mailer {
        serial: usize,
    }

    fn factory(registry: ClassRegistry, registrations: Vec<ServiceRegistration>) -> ObjectFactory {
        ObjectFactory::new(
            Arc::new(AppSettings::builder("sample").build()),
            Arc::new(index_registrations(registrations)),
            Arc::new(registry),
        )
    }

    fn counting_mailer(counter: &Arc<AtomicUsize>) -> ServiceClass {
        let counter = Arc::clone(counter);
        ServiceClass::new("Sample_Mailer")
            .with_default(move || Arc::new(Mailer { serial: counter.fetch_add(1, Ordering::SeqCst) }))
    }

    #[test]
    fn factory_managed_service_is_cached() {
        let counter = Arc::new(AtomicUsize::new(0));
        let registry = ClassRegistry::new().with(counting_mailer(&counter));
        let factory = factory(registry, vec![ServiceRegistration::new("mailer", "Sample_Mailer")]);

        assert!(!factory.is_cached("mailer"));
        let first = factory.get_as::<Arc<Mailer>>("mailer").unwrap();
        let second = factory.get_as::<Arc<Mailer>>("mailer").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.serial, 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(factory.is_cached("mailer"));
    }

    #[test]
    fn self_managed_service_delegates_to_accessor() {
        let counter = Arc::new(AtomicUsize::new(0));
        let accessor_counter = Arc::clone(&counter);
        let registry = ClassRegistry::new().with(ServiceClass::new("Sample_Clock").with_accessor(move || {
            accessor_counter.fetch_add(1, Ordering::SeqCst);
        }));
        let registration = ServiceRegistration::new("clock", "Sample_Clock")
            .with_strategy(ConstructionStrategy::FactoryMethod)
            .self_managed();
        let factory = factory(registry, vec![registration]);

        factory.get("clock").unwrap();
        factory.get("clock").unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(!factory.is_cached("clock"));
    }

    #[test]
    fn unregistered_key() {
        let factory = factory(ClassRegistry::new(), vec![]);
        assert!(matches!(factory.get("mailer"), Err(FactoryError::UnregisteredService { .. })));
    }

    #[test]
    fn missing_class() {
        let factory = factory(ClassRegistry::new(), vec![ServiceRegistration::new("mailer", "Sample_Mailer")]);
        let error = factory.get("mailer").unwrap_err();
        assert!(matches!(error, FactoryError::ClassNotFound { ref class_name, .. } if class_name == "Sample_Mailer"));
    }

    #[test]
    fn type_mismatch() {
        let counter = Arc::new(AtomicUsize::new(0));
        let registry = ClassRegistry::new().with(counting_mailer(&counter));
        let factory = factory(registry, vec![ServiceRegistration::new("mailer", "Sample_Mailer")]);

        assert!(matches!(factory.get_as::<String>("mailer"), Err(FactoryError::TypeMismatch { .. })));
    }

    #[test]
    fn builtin_services() {
        let mut registry = ClassRegistry::new();
        for class in builtin_classes() {
            registry.register(class);
        }
        let factory = factory(registry, default_registrations());

        let config = factory.get_as::<Arc<dyn Config>>(keys::CONFIG).unwrap();
        config.set("url", "http://example.com/".into());
        let again = factory.get_as::<Arc<dyn Config>>(keys::CONFIG).unwrap();
        assert_eq!(again.get_str("url").as_deref(), Some("http://example.com/"));

        let first = factory.get_as::<Arc<UrlHandler>>(keys::URL_HANDLER).unwrap();
        let second = factory.get_as::<Arc<UrlHandler>>(keys::URL_HANDLER).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &UrlHandler::get_global_instance()));
    }
}
