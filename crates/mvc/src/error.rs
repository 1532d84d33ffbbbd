//! Error types of the dispatch pipeline.
//!
//! Resolution errors ([`DispatchError`], [`FactoryError`]) are fatal for the
//! current request and travel up to the kernel. Rendering problems are
//! described by [`RenderWarning`], which is only ever logged.

use http::StatusCode;
use std::error::Error;
use thiserror::Error;

pub type BoxError = Box<dyn Error + Send + Sync>;

/// Errors raised by the [`ObjectFactory`](crate::service::ObjectFactory).
#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("service [{key}] is not registered")]
    UnregisteredService { key: String },

    #[error("class [{class_name}] for service [{key}] not found")]
    ClassNotFound { key: String, class_name: String },

    #[error("class [{class_name}] has no {strategy} constructor")]
    MissingConstructor { class_name: String, strategy: &'static str },

    #[error("service [{key}] is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

impl FactoryError {
    pub fn unregistered_service<S: ToString>(key: S) -> Self {
        Self::UnregisteredService { key: key.to_string() }
    }

    pub fn class_not_found<K: ToString, C: ToString>(key: K, class_name: C) -> Self {
        Self::ClassNotFound { key: key.to_string(), class_name: class_name.to_string() }
    }

    pub fn missing_constructor<C: ToString>(class_name: C, strategy: &'static str) -> Self {
        Self::MissingConstructor { class_name: class_name.to_string(), strategy }
    }

    pub fn type_mismatch<K: ToString>(key: K, expected: &'static str) -> Self {
        Self::TypeMismatch { key: key.to_string(), expected }
    }
}

/// Errors that abort the handling of one request (or one console command).
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("undefined action [{action}]")]
    UndefinedAction { action: String },

    #[error("action class [{class_name}] not found")]
    ActionClassNotFound { class_name: String },

    #[error("action form [{class_name}] can not be constructed")]
    FormConstruction { class_name: String },

    #[error("action form for the action [{action}] not found")]
    ActionFormNotFound { action: String },

    #[error("command class [{class_name}] not found")]
    CommandNotFound { class_name: String },

    #[error("manager class [{class_name}] not found")]
    ManagerNotFound { class_name: String },

    #[error("action [{action}] has no method [{method}]")]
    UnknownMethod { action: String, method: String },

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("service error: {source}")]
    Service {
        #[from]
        source: FactoryError,
    },

    #[error("handler error: {source}")]
    Handler { source: BoxError },
}

impl DispatchError {
    pub fn undefined_action<S: ToString>(action: S) -> Self {
        Self::UndefinedAction { action: action.to_string() }
    }

    pub fn action_class_not_found<S: ToString>(class_name: S) -> Self {
        Self::ActionClassNotFound { class_name: class_name.to_string() }
    }

    pub fn form_construction<S: ToString>(class_name: S) -> Self {
        Self::FormConstruction { class_name: class_name.to_string() }
    }

    pub fn action_form_not_found<S: ToString>(action: S) -> Self {
        Self::ActionFormNotFound { action: action.to_string() }
    }

    pub fn command_not_found<S: ToString>(class_name: S) -> Self {
        Self::CommandNotFound { class_name: class_name.to_string() }
    }

    pub fn manager_not_found<S: ToString>(class_name: S) -> Self {
        Self::ManagerNotFound { class_name: class_name.to_string() }
    }

    pub fn unknown_method<A: ToString, M: ToString>(action: A, method: M) -> Self {
        Self::UnknownMethod { action: action.to_string(), method: method.to_string() }
    }

    pub fn invalid_request<S: ToString>(reason: S) -> Self {
        Self::InvalidRequest { reason: reason.to_string() }
    }

    pub fn handler<E: Into<BoxError>>(source: E) -> Self {
        Self::Handler { source: source.into() }
    }

    /// Numeric code used to look up user facing messages, see
    /// [`ErrorMessages`](crate::kernel::ErrorMessages).
    pub fn code(&self) -> u32 {
        match self {
            Self::UndefinedAction { .. } => 1,
            Self::ActionClassNotFound { .. } => 2,
            Self::FormConstruction { .. } => 3,
            Self::ActionFormNotFound { .. } => 4,
            Self::CommandNotFound { .. } => 5,
            Self::ManagerNotFound { .. } => 6,
            Self::UnknownMethod { .. } => 7,
            Self::InvalidRequest { .. } => 8,
            Self::Service { .. } => 9,
            Self::Handler { .. } => 10,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UndefinedAction { .. } | Self::ActionClassNotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Non fatal problems met while rendering a form field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderWarning {
    #[error("helper action form for action [{action}] not found")]
    HelperFormNotFound { action: String },

    #[error("action form defining form [{field}] not found")]
    FieldNotFound { field: String },

    #[error("selector option is not valid. [actionform={form}, option={expression}]")]
    InvalidOptionSource { form: String, expression: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_errors_map_to_not_found() {
        assert_eq!(DispatchError::undefined_action("foo").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(DispatchError::action_class_not_found("App_Action_Foo").status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn service_errors_map_to_internal_error() {
        let error: DispatchError = FactoryError::unregistered_service("mailer").into();
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.to_string(), "service error: service [mailer] is not registered");
    }

    #[test]
    fn warning_messages() {
        let warning = RenderWarning::InvalidOptionSource { form: "App_Form_Foo".into(), expression: "colors".into() };
        assert_eq!(warning.to_string(), "selector option is not valid. [actionform=App_Form_Foo, option=colors]");
    }
}
