//! Actions: the application handlers a request is dispatched to.

mod command;
mod resolver;

pub use command::{Command, CommandClass};
pub use resolver::ActionResolver;

use crate::backend::Backend;
use crate::body::ResponseBody;
use crate::context::RequestContext;
use crate::error::{BoxError, DispatchError};
use crate::form::ActionForm;
use async_trait::async_trait;
use http::Response;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_METHOD: &str = "run";

pub type ActionResult = Result<Response<ResponseBody>, BoxError>;

/// An application handler.
///
/// `run` is the entry point unless the action class names another method, in
/// which case [`Action::call`] has to be overridden to dispatch it.
#[async_trait]
pub trait Action: Send + Sync {
    async fn run(&self, ctx: &mut RequestContext) -> ActionResult;

    async fn call(&self, method: &str, ctx: &mut RequestContext) -> ActionResult {
        if method == DEFAULT_METHOD {
            self.run(ctx).await
        } else {
            Err(DispatchError::unknown_method(ctx.action_name(), method).into())
        }
    }
}

type ActionCtor = Arc<dyn Fn(&Backend) -> Box<dyn Action> + Send + Sync>;

/// An action class, `<AppId>_Action_<Name>`.
pub struct ActionClass {
    name: String,
    method: Option<String>,
    ctor: ActionCtor,
}

impl ActionClass {
    pub fn new<F>(name: impl Into<String>, ctor: F) -> Self
    where
        F: Fn(&Backend) -> Box<dyn Action> + Send + Sync + 'static,
    {
        Self { name: name.into(), method: None, ctor: Arc::new(ctor) }
    }

    /// Invokes `method` instead of `run`.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn instantiate(&self, backend: &Backend) -> Box<dyn Action> {
        (self.ctor)(backend)
    }
}

impl fmt::Debug for ActionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionClass").field("name", &self.name).field("method", &self.method).finish_non_exhaustive()
    }
}

/// What an action name resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub action_name: String,
    pub handler_type: String,
    pub form_type: Option<String>,
    pub method_name: String,
}

impl ActionDescriptor {
    pub fn new(action_name: impl Into<String>, handler_type: impl Into<String>) -> Self {
        Self {
            action_name: action_name.into(),
            handler_type: handler_type.into(),
            form_type: None,
            method_name: DEFAULT_METHOD.to_string(),
        }
    }

    pub fn with_form(mut self, form_type: impl Into<String>) -> Self {
        self.form_type = Some(form_type.into());
        self
    }

    pub fn with_method(mut self, method_name: impl Into<String>) -> Self {
        self.method_name = method_name.into();
        self
    }
}

/// A constructed handler, ready to be invoked.
pub struct Controller {
    action: Box<dyn Action>,
    form: Option<ActionForm>,
    descriptor: Arc<ActionDescriptor>,
}

impl Controller {
    pub(crate) fn new(action: Box<dyn Action>, form: Option<ActionForm>, descriptor: Arc<ActionDescriptor>) -> Self {
        Self { action, form, descriptor }
    }

    pub fn descriptor(&self) -> &ActionDescriptor {
        &self.descriptor
    }

    pub fn method(&self) -> &str {
        &self.descriptor.method_name
    }

    pub fn form(&self) -> Option<&ActionForm> {
        self.form.as_ref()
    }

    /// Hands the form, bound to the request parameters, to the context and
    /// calls the handler method.
    pub async fn invoke(self, ctx: &mut RequestContext) -> ActionResult {
        if let Some(mut form) = self.form {
            form.bind(ctx.request().params());
            ctx.set_action_form(form);
        }
        self.action.call(&self.descriptor.method_name, ctx).await
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller").field("descriptor", &self.descriptor).field("form", &self.form).finish_non_exhaustive()
    }
}
