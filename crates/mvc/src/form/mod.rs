//! Action forms and their rendering to HTML.

mod action_form;
mod context;
mod field;
mod helper;
mod html;
mod params;

pub use action_form::{ActionForm, FormClass};
pub use context::RenderContext;
pub use field::{FieldDefinition, FieldKind, FieldValue, OptionSource, Options, UnknownFieldKind};
pub use helper::FormHelper;
pub use html::{Content, escape, tag};
pub use params::{HELPER_PARAMETER_KEYS, RenderParams};
