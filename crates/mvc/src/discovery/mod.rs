//! Class discovery.
//!
//! Every class the framework instantiates (services, actions, forms, managers
//! and commands) is looked up by its identifier through a [`ClassResolver`].
//! Two strategies are provided:
//!
//! - [`ClassRegistry`]: explicit registration, exact identifier lookup
//! - [`ConventionResolver`]: classes grouped in modules, a module is found by
//!   deriving candidate module paths from the class identifier
//!
//! Both can be combined with a [`ResolverChain`].

mod convention;
mod registry;

pub use convention::ConventionResolver;
pub use registry::ClassRegistry;

use crate::action::{ActionClass, CommandClass};
use crate::form::FormClass;
use crate::manager::ManagerClass;
use crate::service::ServiceClass;
use std::fmt::Debug;
use std::sync::Arc;

/// A loadable class.
#[derive(Debug, Clone)]
pub enum TypeHandle {
    Service(Arc<ServiceClass>),
    Action(Arc<ActionClass>),
    Form(Arc<FormClass>),
    Manager(Arc<ManagerClass>),
    Command(Arc<CommandClass>),
}

impl TypeHandle {
    pub fn name(&self) -> &str {
        match self {
            TypeHandle::Service(class) => class.name(),
            TypeHandle::Action(class) => class.name(),
            TypeHandle::Form(class) => class.name(),
            TypeHandle::Manager(class) => class.name(),
            TypeHandle::Command(class) => class.name(),
        }
    }

    pub fn into_service(self) -> Option<Arc<ServiceClass>> {
        if let TypeHandle::Service(class) = self { Some(class) } else { None }
    }

    pub fn into_action(self) -> Option<Arc<ActionClass>> {
        if let TypeHandle::Action(class) = self { Some(class) } else { None }
    }

    pub fn into_form(self) -> Option<Arc<FormClass>> {
        if let TypeHandle::Form(class) = self { Some(class) } else { None }
    }

    pub fn into_manager(self) -> Option<Arc<ManagerClass>> {
        if let TypeHandle::Manager(class) = self { Some(class) } else { None }
    }

    pub fn into_command(self) -> Option<Arc<CommandClass>> {
        if let TypeHandle::Command(class) = self { Some(class) } else { None }
    }
}

macro_rules! impl_into_type_handle {
    ($class:ty, $variant:ident) => {
        impl From<$class> for TypeHandle {
            fn from(class: $class) -> Self {
                TypeHandle::$variant(Arc::new(class))
            }
        }

        impl From<Arc<$class>> for TypeHandle {
            fn from(class: Arc<$class>) -> Self {
                TypeHandle::$variant(class)
            }
        }
    };
}

impl_into_type_handle!(ServiceClass, Service);
impl_into_type_handle!(ActionClass, Action);
impl_into_type_handle!(FormClass, Form);
impl_into_type_handle!(ManagerClass, Manager);
impl_into_type_handle!(CommandClass, Command);

/// Pluggable class lookup strategy.
pub trait ClassResolver: Send + Sync + Debug {
    /// Finds the class named `type_name`.
    fn resolve(&self, type_name: &str) -> Option<TypeHandle>;

    /// Makes the classes of the module at `module_path` resolvable.
    ///
    /// Returns whether such a module exists. Loading a module twice is a no-op.
    fn load_module(&self, _module_path: &str) -> bool {
        false
    }
}

/// Asks each resolver in turn, the first hit wins.
#[derive(Debug, Default)]
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn ClassResolver>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolver: impl ClassResolver + 'static) -> Self {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    pub fn with_shared(mut self, resolver: Arc<dyn ClassResolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }
}

impl ClassResolver for ResolverChain {
    fn resolve(&self, type_name: &str) -> Option<TypeHandle> {
        self.resolvers.iter().find_map(|resolver| resolver.resolve(type_name))
    }

    fn load_module(&self, module_path: &str) -> bool {
        self.resolvers.iter().fold(false, |found, resolver| resolver.load_module(module_path) || found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::ActionForm;

    #[test]
    fn chain_asks_in_order() {
        let first = ClassRegistry::new().with(FormClass::new("App_Form_A", |_| ActionForm::new()));
        let second = ClassRegistry::new()
            .with(FormClass::new("App_Form_A", |_| ActionForm::new()))
            .with(FormClass::new("App_Form_B", |_| ActionForm::new()));
        let chain = ResolverChain::new().with(first).with(second);

        assert_eq!(chain.resolve("App_Form_A").map(|handle| handle.name().to_string()).as_deref(), Some("App_Form_A"));
        assert!(chain.resolve("App_Form_B").is_some());
        assert!(chain.resolve("App_Form_C").is_none());
    }

    #[test]
    fn chain_loads_modules_everywhere() {
        let convention =
            ConventionResolver::new().module("action/Login", [TypeHandle::from(FormClass::new("App_Form_Login", |_| ActionForm::new()))]);
        let chain = ResolverChain::new().with(ClassRegistry::new()).with(convention);

        assert!(chain.load_module("action/Login"));
        assert!(!chain.load_module("action/Logout"));
        assert!(chain.resolve("App_Form_Login").and_then(TypeHandle::into_form).is_some());
    }
}
