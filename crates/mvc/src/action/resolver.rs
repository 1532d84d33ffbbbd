use crate::action::{ActionDescriptor, Controller, DEFAULT_METHOD};
use crate::backend::Backend;
use crate::discovery::ClassResolver;
use crate::error::DispatchError;
use crate::form::FormClass;
use crate::naming::{self, ClassKind};
use crate::request::RequestParams;
use crate::settings::AppSettings;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Maps action names to handler and form classes.
///
/// Descriptors are derived from the action name (`user_profile` ->
/// `<AppId>_Action_UserProfile` and `<AppId>_Form_UserProfile`) unless one
/// was declared with [`ActionResolver::define`]. Both positive and negative
/// lookups are cached.
pub struct ActionResolver {
    app_id: String,
    default_form_class: String,
    resolver: Arc<dyn ClassResolver>,
    descriptors: Mutex<HashMap<String, Option<Arc<ActionDescriptor>>>>,
}

impl ActionResolver {
    pub fn new(settings: &AppSettings, resolver: Arc<dyn ClassResolver>) -> Self {
        Self {
            app_id: settings.app_id().to_string(),
            default_form_class: settings.default_form_class().to_string(),
            resolver,
            descriptors: Mutex::default(),
        }
    }

    /// Declares the descriptor of an action explicitly.
    pub fn define(&self, descriptor: ActionDescriptor) {
        let mut descriptors = self.descriptors.lock().unwrap_or_else(PoisonError::into_inner);
        descriptors.insert(descriptor.action_name.clone(), Some(Arc::new(descriptor)));
    }

    /// The selected action, see [`RequestParams::action_name`], or
    /// `fallback`. An action without handler class is an error; it never
    /// falls back.
    pub fn resolve_action_name(&self, params: &RequestParams, fallback: &str) -> Result<String, DispatchError> {
        let action_name = params.action_name().unwrap_or_else(|| fallback.to_string());
        debug!(action = action_name.as_str(), "action name resolved");

        if self.descriptor(&action_name).is_none() {
            return Err(DispatchError::undefined_action(action_name));
        }
        Ok(action_name)
    }

    /// Builds the handler of `action_name` and its form.
    pub fn get_controller(&self, action_name: &str, backend: &Backend) -> Result<Controller, DispatchError> {
        let descriptor = self.descriptor(action_name).ok_or_else(|| DispatchError::undefined_action(action_name))?;

        let action_class = self
            .resolver
            .resolve(&descriptor.handler_type)
            .and_then(|handle| handle.into_action())
            .ok_or_else(|| DispatchError::action_class_not_found(&descriptor.handler_type))?;

        let form_type = descriptor.form_type.as_deref().unwrap_or(self.default_form_class.as_str());
        let form_class = self
            .resolve_form(form_type)
            .ok_or_else(|| DispatchError::form_construction(form_type))?;

        let action = action_class.instantiate(backend);
        let form = form_class.instantiate(backend);
        Ok(Controller::new(action, Some(form), descriptor))
    }

    /// The form class identifier of `action_name`. Nothing is constructed.
    pub fn action_form_name(&self, action_name: &str) -> Option<String> {
        self.descriptor(action_name).and_then(|descriptor| descriptor.form_type.clone())
    }

    /// The descriptor of `action_name`, `None` when no handler class exists.
    pub fn descriptor(&self, action_name: &str) -> Option<Arc<ActionDescriptor>> {
        if let Some(cached) = self.descriptors.lock().unwrap_or_else(PoisonError::into_inner).get(action_name) {
            return cached.clone();
        }

        let descriptor = self.derive_descriptor(action_name).map(Arc::new);
        let mut descriptors = self.descriptors.lock().unwrap_or_else(PoisonError::into_inner);
        descriptors.entry(action_name.to_string()).or_insert(descriptor).clone()
    }

    fn derive_descriptor(&self, action_name: &str) -> Option<ActionDescriptor> {
        let module_path = format!("action/{}", naming::module_path(action_name));
        if self.resolver.load_module(&module_path) {
            debug!(module = module_path.as_str(), "action module is found");
        } else {
            info!(module = module_path.as_str(), "action module not found");
        }

        let action_class_name = naming::class_name(&self.app_id, ClassKind::Action, action_name);
        debug!(class = action_class_name.as_str(), "default action class");
        let Some(action_class) = self.resolver.resolve(&action_class_name).and_then(|handle| handle.into_action()) else {
            info!(class = action_class_name.as_str(), "action class is not defined");
            return None;
        };

        let mut form_class_name = naming::class_name(&self.app_id, ClassKind::Form, action_name);
        if self.resolve_form(&form_class_name).is_none() {
            debug!(
                class = form_class_name.as_str(),
                default = self.default_form_class.as_str(),
                "form class is not defined, falling back to default"
            );
            form_class_name.clone_from(&self.default_form_class);
        }

        let method = action_class.method().unwrap_or(DEFAULT_METHOD);
        Some(ActionDescriptor::new(action_name, action_class_name).with_form(form_class_name).with_method(method))
    }

    fn resolve_form(&self, class_name: &str) -> Option<Arc<FormClass>> {
        self.resolver.resolve(class_name).and_then(|handle| handle.into_form())
    }

    /// `<AppId>_Action_UserProfile` -> `user_profile`
    pub fn action_class_to_name(&self, class_name: &str) -> Option<String> {
        naming::class_to_action_name(&self.app_id, ClassKind::Action, class_name)
    }

    /// `<AppId>_Form_UserProfile` -> `user_profile`
    pub fn form_class_to_name(&self, class_name: &str) -> Option<String> {
        naming::class_to_action_name(&self.app_id, ClassKind::Form, class_name)
    }
}

impl fmt::Debug for ActionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionResolver")
            .field("app_id", &self.app_id)
            .field("default_form_class", &self.default_form_class)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
