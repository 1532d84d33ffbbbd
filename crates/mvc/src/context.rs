use crate::backend::Backend;
use crate::body::ResponseBody;
use crate::error::BoxError;
use crate::form::{ActionForm, FormHelper};
use crate::request::{ActionRequest, RequestParams};
use crate::responder::{Html, Responder};
use http::Response;
use serde_json::Value;

/// State of one request as seen by its action.
#[derive(Debug)]
pub struct RequestContext {
    request: ActionRequest,
    backend: Backend,
    action_name: String,
    action_form: Option<ActionForm>,
    form_helper: Option<FormHelper>,
}

impl RequestContext {
    pub fn new(request: ActionRequest, backend: Backend, action_name: impl Into<String>) -> Self {
        Self { request, backend, action_name: action_name.into(), action_form: None, form_helper: None }
    }

    pub fn request(&self) -> &ActionRequest {
        &self.request
    }

    pub fn params(&self) -> &RequestParams {
        self.request.params()
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    pub fn action_form(&self) -> Option<&ActionForm> {
        self.action_form.as_ref()
    }

    pub fn action_form_mut(&mut self) -> Option<&mut ActionForm> {
        self.action_form.as_mut()
    }

    pub fn set_action_form(&mut self, form: ActionForm) {
        self.action_form = Some(form);
    }

    /// The form helper of this request, created on first use with the form
    /// of the current action registered under the action name.
    pub fn form_helper(&mut self) -> &mut FormHelper {
        let Self { backend, action_name, action_form, form_helper, .. } = self;
        form_helper.get_or_insert_with(|| {
            let mut helper = FormHelper::new(backend.clone());
            if let Some(form) = action_form {
                helper.add_form(action_name.clone(), form.clone());
            }
            helper
        })
    }

    /// Renders `template` with the renderer service into an HTML response.
    pub fn render(&self, template: &str, data: &Value) -> Result<Response<ResponseBody>, BoxError> {
        let renderer = self.backend.renderer()?;
        let html = renderer.render(template, data)?;
        Ok(Html(html).into_response())
    }
}
