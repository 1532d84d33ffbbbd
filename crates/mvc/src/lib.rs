//! An action based MVC framework.
//!
//! A [`Kernel`] maps each request to an action (`action_<name>` request
//! parameter, or the default action), builds the action and its form through
//! class discovery, and runs it with a [`RequestContext`]. Services (config,
//! logger, session, i18n, renderer) are created lazily per request by the
//! [`ObjectFactory`](service::ObjectFactory).

mod body;
mod context;
mod naming;
mod request;
mod responder;

pub mod action;
pub mod backend;
pub mod discovery;
pub mod error;
pub mod form;
pub mod kernel;
pub mod logging;
pub mod manager;
pub mod service;
pub mod settings;

pub use action::{Action, ActionClass, ActionResult, Command, CommandClass};
pub use backend::Backend;
pub use body::ResponseBody;
pub use context::RequestContext;
pub use error::{BoxError, DispatchError, FactoryError};
pub use kernel::{ActionRequestKind, Kernel};
pub use naming::{ClassKind, class_name, class_to_action_name, forward_path_to_name, module_path, pascalize};
pub use request::{ActionRequest, RequestParams};
pub use responder::{Html, Responder};
pub use settings::AppSettings;
