use crate::backend::Backend;
use crate::error::{DispatchError, RenderWarning};
use crate::form::action_form::ActionForm;
use crate::form::context::RenderContext;
use crate::form::field::{FieldDefinition, FieldKind, FieldValue, OptionSource, Options};
use crate::form::html::{Content, escape, tag};
use crate::form::params::RenderParams;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

type Attrs = IndexMap<String, Option<String>>;

/// Renders the fields of the helper forms of a request.
///
/// Helper forms are registered per action (or per form class). Repeated
/// fields consume one value per rendering; the counters live in this helper
/// and are reset with [`FormHelper::reset_form_counter`].
#[derive(Debug)]
pub struct FormHelper {
    backend: Backend,
    helper_forms: IndexMap<String, ActionForm>,
    render: RenderContext,
}

impl FormHelper {
    pub fn new(backend: Backend) -> Self {
        Self { backend, helper_forms: IndexMap::new(), render: RenderContext::new() }
    }

    /// Registers an already constructed form under `key`.
    pub fn add_form(&mut self, key: impl Into<String>, form: ActionForm) {
        self.helper_forms.insert(key.into(), form);
    }

    /// Registers the form of `action`. With `dynamic`, the view helper hook
    /// of the form class is applied. A form already registered is kept.
    pub fn add_action_form_helper(&mut self, action: &str, dynamic: bool) -> Result<(), DispatchError> {
        if self.helper_forms.contains_key(action) {
            return Ok(());
        }

        let form_name = self
            .backend
            .action_resolver()
            .action_form_name(action)
            .ok_or_else(|| DispatchError::action_form_not_found(action))?;
        let form = self.instantiate(&form_name, dynamic)?;
        self.helper_forms.insert(action.to_string(), form);
        Ok(())
    }

    /// Registers the form class `class_name` under its own name.
    pub fn add_action_form_helper_by_class(&mut self, class_name: &str, dynamic: bool) -> Result<(), DispatchError> {
        let form = self.instantiate(class_name, dynamic)?;
        self.helper_forms.insert(class_name.to_string(), form);
        Ok(())
    }

    fn instantiate(&self, class_name: &str, dynamic: bool) -> Result<ActionForm, DispatchError> {
        let class = self
            .backend
            .resolver()
            .resolve(class_name)
            .and_then(|handle| handle.into_form())
            .ok_or_else(|| DispatchError::form_construction(class_name))?;

        let mut form = class.instantiate(&self.backend);
        if dynamic {
            class.apply_view_helper(&mut form);
        }
        Ok(form)
    }

    pub fn clear_action_form_helper(&mut self, action: &str) {
        self.helper_forms.shift_remove(action);
    }

    pub fn helper_form(&self, action: &str) -> Option<&ActionForm> {
        self.helper_forms.get(action)
    }

    pub fn helper_form_mut(&mut self, action: &str) -> Option<&mut ActionForm> {
        self.helper_forms.get_mut(action)
    }

    /// Starts a new render pass: repeated fields start over at their first value.
    pub fn reset_form_counter(&mut self) {
        self.render.reset();
    }

    /// The translated label of field `name`, or `name` itself.
    pub fn form_name(&self, name: &str, action: Option<&str>) -> String {
        find_form(&self.helper_forms, action, name)
            .and_then(|form| form.field(name))
            .and_then(FieldDefinition::display_label)
            .map_or_else(|| name.to_string(), |label| self.backend.translate(label))
    }

    /// A plain submit button, for actions that do not declare one.
    pub fn form_submit(&self, params: RenderParams) -> String {
        let mut attrs = params.attrs;
        attrs.entry("type".to_string()).or_insert_with(|| Some("submit".to_string()));
        if let Some(value) = params.value {
            attrs.insert("value".to_string(), Some(value.first().to_string()));
        }
        tag("input", &attrs, Content::Empty)
    }

    /// Wraps `content` in a `<form>` element, `method` defaulting to `post`.
    pub fn form_block(&self, content: &str, params: RenderParams) -> String {
        let mut attrs = params.attrs;
        attrs.entry("method".to_string()).or_insert_with(|| Some("post".to_string()));
        tag("form", &attrs, Content::Raw(content))
    }

    /// Renders field `name` of the helper form of `action`, or of the first
    /// helper form defining it when `action` is `None` or its form lacks the
    /// field. Unknown fields render as an empty string.
    pub fn render_field(&mut self, name: &str, action: Option<&str>, params: RenderParams) -> String {
        let Self { backend, helper_forms, render } = self;

        let Some(form) = find_form(helper_forms, action, name) else {
            return String::new();
        };
        let Some(definition) = form.field(name) else {
            warn!("{}", RenderWarning::FieldNotFound { field: name.to_string() });
            return String::new();
        };

        let counter = if definition.is_repeated() { render.next(action.unwrap_or_default(), name) } else { 0 };

        FieldRenderer { backend, form, definition, counter, params }.render()
    }
}

/// The helper form of `action` if it defines `name`, else the first helper
/// form defining it.
fn find_form<'a>(forms: &'a IndexMap<String, ActionForm>, action: Option<&str>, name: &str) -> Option<&'a ActionForm> {
    if let Some(action) = action {
        match forms.get(action) {
            Some(form) if form.field(name).is_some() => return Some(form),
            Some(_) => debug!(action, field = name, "field not in the action form, searching all helper forms"),
            None => debug!("{}", RenderWarning::HelperFormNotFound { action: action.to_string() }),
        }
    }

    let form = forms.values().find(|form| form.field(name).is_some());
    if form.is_none() {
        warn!("{}", RenderWarning::FieldNotFound { field: name.to_string() });
    }
    form
}

/// One rendering of one field.
struct FieldRenderer<'a> {
    backend: &'a Backend,
    form: &'a ActionForm,
    definition: &'a FieldDefinition,
    counter: usize,
    params: RenderParams,
}

impl FieldRenderer<'_> {
    fn render(self) -> String {
        match self.definition.kind() {
            FieldKind::Text => self.input(None),
            FieldKind::Email => self.input(Some("email")),
            FieldKind::Number => self.input(Some("number")),
            FieldKind::Hidden => self.input(Some("hidden")),
            FieldKind::Password => self.input(Some("password")),
            FieldKind::Textarea => self.textarea(),
            FieldKind::File => self.file(),
            FieldKind::Button => self.button(),
            FieldKind::Submit => self.submit(),
            FieldKind::Checkbox => self.checkbox(),
            FieldKind::Radio => self.radio(),
            FieldKind::Select => self.select(),
        }
    }

    fn attrs(&self) -> Attrs {
        self.params.attrs.clone()
    }

    fn name(&self) -> String {
        self.definition.input_name()
    }

    /// Value of an input: params value > params default > instance default >
    /// field default.
    fn input_value(&self) -> Option<&FieldValue> {
        self.params.value.as_ref().or_else(|| self.selection())
    }

    /// Current selection of a selector: params default > instance default >
    /// field default.
    fn selection(&self) -> Option<&FieldValue> {
        self.params
            .default
            .as_ref()
            .or_else(|| self.form.instance_default(self.definition.name()))
            .or_else(|| self.definition.default())
    }

    fn input(&self, forced_type: Option<&str>) -> String {
        let mut attrs = self.attrs();
        match forced_type {
            Some(input_type) => set(&mut attrs, "type", input_type),
            None => {
                attrs.entry("type".to_string()).or_insert_with(|| Some("text".to_string()));
            }
        }
        set(&mut attrs, "name", &self.name());
        let value = self.input_value().map_or("", |value| value.nth(self.counter));
        set(&mut attrs, "value", value);
        tag("input", &attrs, Content::Empty)
    }

    fn textarea(&self) -> String {
        let mut attrs = self.attrs();
        set(&mut attrs, "name", &self.name());
        let content = self.input_value().map_or("", |value| value.nth(self.counter));
        tag("textarea", &attrs, Content::Escaped(content))
    }

    fn file(&self) -> String {
        let mut attrs = self.attrs();
        set(&mut attrs, "type", "file");
        set(&mut attrs, "name", &self.name());
        set(&mut attrs, "value", "");
        tag("input", &attrs, Content::Empty)
    }

    fn button(&self) -> String {
        let label = self.definition.display_label().map(str::to_string);
        self.labelled_input("button", label)
    }

    fn submit(&self) -> String {
        let label = self.definition.display_label().map(|label| self.backend.translate(label));
        self.labelled_input("submit", label)
    }

    fn labelled_input(&self, input_type: &str, label: Option<String>) -> String {
        let mut attrs = self.attrs();
        set(&mut attrs, "type", input_type);
        set(&mut attrs, "name", &self.name());
        let value = self.params.value.as_ref().map(|value| value.first().to_string()).or(label);
        if let Some(value) = value {
            set(&mut attrs, "value", &value);
        }
        tag("input", &attrs, Content::Empty)
    }

    fn checkbox(&self) -> String {
        let current = self.selection();
        self.choices("checkbox", |key| current.is_some_and(|value| value.contains(key)), true)
    }

    fn radio(&self) -> String {
        let current = self.selection().map(|value| value.nth(self.counter));
        self.choices("radio", |key| current == Some(key), false)
    }

    /// One `<label for=id><input />label</label>` per option.
    fn choices(&self, input_type: &str, is_checked: impl Fn(&str) -> bool, translate_labels: bool) -> String {
        let options = self.options().unwrap_or_default();
        let mut attrs = self.attrs();
        set(&mut attrs, "type", input_type);
        set(&mut attrs, "name", &self.name());

        let tags = options
            .iter()
            .enumerate()
            .map(|(index, (key, label))| {
                let id = format!("{}_{}", self.definition.name(), index + 1);
                set(&mut attrs, "value", key);
                set(&mut attrs, "id", &id);
                if is_checked(key) {
                    set(&mut attrs, "checked", "checked");
                } else {
                    attrs.shift_remove("checked");
                }

                let input = tag("input", &attrs, Content::Empty);
                let text = if translate_labels { self.translate_marked(label) } else { label.clone() };
                let label_attrs = Attrs::from([("for".to_string(), Some(id))]);
                tag("label", &label_attrs, Content::Raw(&format!("{input}{}", escape(&text))))
            })
            .collect::<Vec<_>>();

        tags.join(self.params.separator_or_default())
    }

    /// `_et(message)` labels are translated, other labels kept as is.
    fn translate_marked(&self, label: &str) -> String {
        match label.strip_prefix("_et(").and_then(|rest| rest.strip_suffix(')')) {
            Some(message) => self.backend.translate(message),
            None => label.to_string(),
        }
    }

    fn select(&self) -> String {
        let options = self.options().unwrap_or_default();
        let current = self.selection().map(FieldValue::as_list).unwrap_or_default();
        let multiple = self.params.has_attr("multiple");

        let mut selected = false;
        let mut contents = Vec::with_capacity(options.len() + 1);
        for (key, label) in &options {
            let mut attrs = Attrs::from([("value".to_string(), Some(key.clone()))]);
            let is_selected = if multiple {
                current.contains(&key.as_str())
            } else {
                !selected && current.get(self.counter) == Some(&key.as_str())
            };
            if is_selected {
                set(&mut attrs, "selected", "selected");
                selected = true;
            }
            contents.push(tag("option", &attrs, Content::Escaped(label)));
        }

        if let Some(empty_label) = &self.params.empty_option {
            let mut attrs = Attrs::from([("value".to_string(), Some(String::new()))]);
            if !selected {
                set(&mut attrs, "selected", "selected");
            }
            contents.insert(0, tag("option", &attrs, Content::Escaped(empty_label)));
        }

        let mut attrs = self.attrs();
        set(&mut attrs, "name", &self.name());
        let separator = self.params.separator_or_default();
        let element = format!("{separator}{}{separator}", contents.join(separator));
        tag("select", &attrs, Content::Raw(&element))
    }

    /// Options of a selector: params option > field option source.
    fn options(&self) -> Option<Options> {
        let source = self.params.option.as_ref().or_else(|| self.definition.option_source())?;
        let expression = match source {
            OptionSource::Static(options) => return Some(options.clone()),
            OptionSource::Reference(expression) => expression,
        };

        let options = self.referenced_options(expression);
        if options.is_none() {
            warn!(
                "{}",
                RenderWarning::InvalidOptionSource { form: self.form.class_name().to_string(), expression: expression.clone() }
            );
        }
        options
    }

    /// `member` or `manager,attribute`.
    fn referenced_options(&self, expression: &str) -> Option<Options> {
        let parts = expression.split(',').map(str::trim).collect::<Vec<_>>();
        match parts.as_slice() {
            [member] => self.form.resolve_member(member),
            [manager, attr, ..] => {
                let list = self.backend.manager(manager).ok()?.attr_list(attr)?;
                let options = list
                    .into_iter()
                    .map(|(key, entry)| {
                        let label = match entry.get("name") {
                            Some(Value::String(name)) => name.clone(),
                            Some(other) => other.to_string(),
                            None => String::new(),
                        };
                        (key, label)
                    })
                    .collect();
                Some(options)
            }
            [] => None,
        }
    }
}

fn set(attrs: &mut Attrs, key: &str, value: &str) {
    attrs.insert(key.to_string(), Some(value.to_string()));
}
