//! The dispatcher: turns one HTTP request into one response, or runs one
//! console command.

mod error_handler;

pub use error_handler::{ErrorHandler, ErrorMessages, LoggingErrorHandler};

#[cfg(test)]
pub use error_handler::MockErrorHandler;

use crate::backend::Backend;
use crate::body::ResponseBody;
use crate::context::RequestContext;
use crate::discovery::ClassResolver;
use crate::error::{BoxError, DispatchError};
use crate::form::escape;
use crate::naming::{self, ClassKind};
use crate::request::ActionRequest;
use crate::responder::Responder;
use crate::service::{ServiceRegistration, default_registrations, index_registrations};
use crate::settings::AppSettings;
use http::{Request, Response};
use http_body::Body;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// How [`Kernel::action_request`] encodes the action selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionRequestKind {
    /// `<input type="hidden" name="action_<name>" value="true" />`
    Hidden,
    /// `action_<name>=true`
    Url,
}

pub struct KernelBuilder {
    settings: Option<AppSettings>,
    registrations: Vec<ServiceRegistration>,
    resolver: Option<Arc<dyn ClassResolver>>,
    error_handler: Arc<dyn ErrorHandler>,
    error_messages: ErrorMessages,
}

impl KernelBuilder {
    fn new() -> Self {
        Self {
            settings: None,
            registrations: default_registrations(),
            resolver: None,
            error_handler: Arc::new(LoggingErrorHandler),
            error_messages: ErrorMessages::new(),
        }
    }

    pub fn settings(mut self, settings: AppSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Registers a service, replacing the registration of the same key.
    pub fn service(mut self, registration: ServiceRegistration) -> Self {
        self.registrations.retain(|existing| existing.key() != registration.key());
        self.registrations.push(registration);
        self
    }

    pub fn resolver(mut self, resolver: impl ClassResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn shared_resolver(mut self, resolver: Arc<dyn ClassResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn error_handler(mut self, error_handler: impl ErrorHandler + 'static) -> Self {
        self.error_handler = Arc::new(error_handler);
        self
    }

    pub fn error_messages(mut self, error_messages: ErrorMessages) -> Self {
        self.error_messages = error_messages;
        self
    }

    pub fn build(self) -> Result<Kernel, KernelBuildError> {
        let settings = self.settings.ok_or(KernelBuildError::MissingSettings)?;
        let resolver = self.resolver.ok_or(KernelBuildError::MissingResolver)?;
        Ok(Kernel {
            settings: Arc::new(settings),
            registrations: Arc::new(index_registrations(self.registrations)),
            resolver,
            error_handler: self.error_handler,
            error_messages: self.error_messages,
        })
    }
}

impl fmt::Debug for KernelBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelBuilder")
            .field("settings", &self.settings)
            .field("registrations", &self.registrations)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

#[derive(Error, Debug)]
pub enum KernelBuildError {
    #[error("settings must be set")]
    MissingSettings,
    #[error("class resolver must be set")]
    MissingResolver,
}

/// The application kernel. Shareable between requests; everything mutable
/// lives in the [`Backend`] created for each request.
pub struct Kernel {
    settings: Arc<AppSettings>,
    registrations: Arc<HashMap<String, ServiceRegistration>>,
    resolver: Arc<dyn ClassResolver>,
    error_handler: Arc<dyn ErrorHandler>,
    error_messages: ErrorMessages,
}

impl Kernel {
    pub fn builder() -> KernelBuilder {
        KernelBuilder::new()
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn app_id(&self) -> &str {
        self.settings.app_id()
    }

    pub fn directory(&self, key: &str) -> Option<&Path> {
        self.settings.directory(key)
    }

    pub fn ext(&self, key: &str) -> Option<&str> {
        self.settings.ext(key)
    }

    pub fn template_dir(&self) -> Option<PathBuf> {
        self.settings.template_dir()
    }

    pub fn view_dir(&self) -> Option<&Path> {
        self.settings.view_dir()
    }

    /// `(locale, encoding)`
    pub fn language(&self) -> (&str, &str) {
        (self.settings.locale(), self.settings.encoding())
    }

    pub fn error_message(&self, code: u32) -> Option<&str> {
        self.error_messages.message(code)
    }

    /// A fresh per-request backend: new object factory, action resolver and
    /// manager cache.
    pub fn new_backend(&self) -> Backend {
        Backend::new(Arc::clone(&self.settings), Arc::clone(&self.registrations), Arc::clone(&self.resolver))
    }

    /// Handles one request. Errors are reported to the error handler and
    /// turned into an error response.
    pub async fn handle<B>(&self, request: Request<B>) -> Response<ResponseBody>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Into<BoxError>,
    {
        let backend = self.new_backend();
        match self.dispatch(request, &backend).await {
            Ok(response) => response,
            Err(e) => self.error_response(&e),
        }
    }

    async fn dispatch<B>(&self, request: Request<B>, backend: &Backend) -> Result<Response<ResponseBody>, DispatchError>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Into<BoxError>,
    {
        let request = ActionRequest::from_http(request).await?;

        let config = backend.config()?;
        if config.get_str("url").is_none_or(|url| url.is_empty())
            && let Some(url) = request.base_url()
        {
            debug!(url = url.as_str(), "url derived from request");
            config.set("url", Value::String(url));
        }

        let logger = backend.logger()?;
        logger.begin();
        let result = self.run_action(request, backend).await;
        logger.end();
        result
    }

    async fn run_action(&self, request: ActionRequest, backend: &Backend) -> Result<Response<ResponseBody>, DispatchError> {
        let resolver = backend.action_resolver();
        let action_name = resolver.resolve_action_name(request.params(), self.settings.default_action())?;
        info!(action = action_name.as_str(), "dispatching");
        backend.set_action_name(&action_name);

        backend.session()?.restore();
        backend.i18n()?.set_language(&backend.locale());

        let controller = resolver.get_controller(&action_name, backend)?;
        let mut ctx = RequestContext::new(request, backend.clone(), action_name);
        controller.invoke(&mut ctx).await.map_err(into_dispatch_error)
    }

    fn error_response(&self, e: &DispatchError) -> Response<ResponseBody> {
        self.error_handler.handle_error(e);
        let status = e.status_code();
        let body = self
            .error_messages
            .message(e.code())
            .map_or_else(|| status.canonical_reason().unwrap_or_default().to_string(), str::to_string);
        (status, body).into_response()
    }

    /// Runs the command `<AppId>_Command_<Name>` of `action_name`.
    pub async fn console(&self, action_name: &str) -> Result<(), DispatchError> {
        let backend = self.new_backend();
        backend.set_action_name(action_name);

        let logger = backend.logger()?;
        logger.begin();
        let result = self.run_command(action_name, &backend).await;
        logger.end();

        if let Err(e) = &result {
            self.error_handler.handle_error(e);
        }
        result
    }

    async fn run_command(&self, action_name: &str, backend: &Backend) -> Result<(), DispatchError> {
        backend.i18n()?.set_language(&backend.locale());

        let module_path = format!("command/{}", naming::module_path(action_name));
        if !self.resolver.load_module(&module_path) {
            debug!(module = module_path.as_str(), "command module not found");
        }

        let class_name = naming::class_name(self.app_id(), ClassKind::Command, action_name);
        let class = self
            .resolver
            .resolve(&class_name)
            .and_then(|handle| handle.into_command())
            .ok_or_else(|| DispatchError::command_not_found(&class_name))?;

        info!(command = class_name.as_str(), "running command");
        class.instantiate(backend).run_cli().await.map_err(into_dispatch_error)
    }

    /// The request fragment selecting `action`.
    pub fn action_request(&self, action: &str, kind: ActionRequestKind) -> String {
        match kind {
            ActionRequestKind::Hidden => {
                format!(r#"<input type="hidden" name="action_{}" value="true" />"#, escape(action))
            }
            ActionRequestKind::Url => {
                let key = format!("action_{action}");
                serde_urlencoded::to_string([(key.as_str(), "true")]).unwrap_or_default()
            }
        }
    }

    /// `<AppId>_Form_UserProfile` -> `user_profile`
    pub fn action_form_to_name(&self, class_name: &str) -> Option<String> {
        naming::class_to_action_name(self.app_id(), ClassKind::Form, class_name)
    }

    /// `/user/profile.tpl` -> `user_profile`
    pub fn forward_path_to_name(&self, forward_path: &str) -> String {
        naming::forward_path_to_name(forward_path, self.settings.template_ext())
    }
}

/// Dispatch errors raised inside a handler keep their kind.
fn into_dispatch_error(e: BoxError) -> DispatchError {
    match e.downcast::<DispatchError>() {
        Ok(e) => *e,
        Err(e) => DispatchError::handler(e),
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("settings", &self.settings)
            .field("registrations", &self.registrations)
            .field("resolver", &self.resolver)
            .field("error_messages", &self.error_messages)
            .finish_non_exhaustive()
    }
}
