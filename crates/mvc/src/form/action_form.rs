use crate::backend::Backend;
use crate::error::DispatchError;
use crate::form::field::{FieldDefinition, FieldValue, Options};
use crate::request::RequestParams;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type OptionMethod = Arc<dyn Fn(&ActionForm) -> Option<Options> + Send + Sync>;

/// The form of an action: field definitions plus the submitted values.
///
/// Members usable as option sources are either option methods (computed) or
/// properties (JSON objects or arrays).
#[derive(Clone, Default)]
pub struct ActionForm {
    class_name: String,
    definitions: IndexMap<String, FieldDefinition>,
    defaults: HashMap<String, FieldValue>,
    option_methods: HashMap<String, OptionMethod>,
    properties: Map<String, Value>,
    values: IndexMap<String, FieldValue>,
}

impl ActionForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, definition: FieldDefinition) -> Self {
        self.define(definition);
        self
    }

    pub fn define(&mut self, definition: FieldDefinition) {
        self.definitions.insert(definition.name().to_string(), definition);
    }

    pub fn with_option_method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&ActionForm) -> Option<Options> + Send + Sync + 'static,
    {
        self.option_methods.insert(name.into(), Arc::new(method));
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.definitions.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.definitions.values()
    }

    /// Overrides the default of `name` for this form instance.
    pub fn set_default(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.defaults.insert(name.into(), value.into());
    }

    /// The default of `name` for this instance: an explicit instance default,
    /// else the current value.
    pub fn instance_default(&self, name: &str) -> Option<&FieldValue> {
        self.defaults.get(name).or_else(|| self.values.get(name))
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Options provided by the member `name`: the option method of that name,
    /// else the property. A property must be an object (key -> label) or an
    /// array (index -> label).
    pub fn resolve_member(&self, name: &str) -> Option<Options> {
        if let Some(method) = self.option_methods.get(name) {
            return method(self);
        }

        match self.properties.get(name)? {
            Value::Object(entries) => Some(entries.iter().map(|(key, label)| (key.clone(), label_of(label))).collect()),
            Value::Array(entries) => {
                Some(entries.iter().enumerate().map(|(index, label)| (index.to_string(), label_of(label))).collect())
            }
            _ => None,
        }
    }

    /// Copies the submitted values of the defined fields. A repeated field
    /// named `tag` is submitted as `tag[]`.
    pub fn bind(&mut self, params: &RequestParams) {
        for definition in self.definitions.values() {
            let name = definition.name();
            if definition.is_repeated() {
                let input_name = definition.input_name();
                let submitted = params.get_all(&input_name).map(str::to_string).collect::<Vec<_>>();
                if !submitted.is_empty() {
                    self.values.insert(name.to_string(), FieldValue::List(submitted));
                }
            } else if let Some(value) = params.get(name) {
                self.values.insert(name.to_string(), FieldValue::Scalar(value.to_string()));
            }
        }
    }

    /// The values as `T`: scalars are strings, repeated fields sequences.
    pub fn deserialize_values<T: DeserializeOwned>(&self) -> Result<T, DispatchError> {
        let object = self
            .values
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    FieldValue::Scalar(value) => Value::String(value.clone()),
                    FieldValue::List(values) => Value::Array(values.iter().cloned().map(Value::String).collect()),
                };
                (name.clone(), value)
            })
            .collect::<Map<_, _>>();

        serde_json::from_value(Value::Object(object)).map_err(DispatchError::invalid_request)
    }
}

fn label_of(value: &Value) -> String {
    match value {
        Value::String(label) => label.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl fmt::Debug for ActionForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionForm")
            .field("class_name", &self.class_name)
            .field("definitions", &self.definitions)
            .field("defaults", &self.defaults)
            .field("option_methods", &self.option_methods.keys().collect::<Vec<_>>())
            .field("properties", &self.properties)
            .field("values", &self.values)
            .finish()
    }
}

type FormCtor = Arc<dyn Fn(&Backend) -> ActionForm + Send + Sync>;
type ViewHelper = Arc<dyn Fn(&mut ActionForm) + Send + Sync>;

/// A form class, `<AppId>_Form_<Name>` or the default form class.
pub struct FormClass {
    name: String,
    ctor: FormCtor,
    view_helper: Option<ViewHelper>,
}

impl FormClass {
    pub fn new<F>(name: impl Into<String>, ctor: F) -> Self
    where
        F: Fn(&Backend) -> ActionForm + Send + Sync + 'static,
    {
        Self { name: name.into(), ctor: Arc::new(ctor), view_helper: None }
    }

    /// Hook adding the fields that are only known when rendering, applied to
    /// helper forms added as dynamic.
    pub fn with_view_helper<F>(mut self, helper: F) -> Self
    where
        F: Fn(&mut ActionForm) + Send + Sync + 'static,
    {
        self.view_helper = Some(Arc::new(helper));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_view_helper(&self) -> bool {
        self.view_helper.is_some()
    }

    pub fn instantiate(&self, backend: &Backend) -> ActionForm {
        let mut form = (self.ctor)(backend);
        form.class_name.clone_from(&self.name);
        form
    }

    pub fn apply_view_helper(&self, form: &mut ActionForm) {
        if let Some(helper) = &self.view_helper {
            helper(form);
        }
    }
}

impl fmt::Debug for FormClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormClass")
            .field("name", &self.name)
            .field("view_helper", &self.view_helper.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::field::FieldKind;
    use serde::Deserialize;
    use serde_json::json;

    fn profile_form() -> ActionForm {
        ActionForm::new()
            .with_field(FieldDefinition::new("name", FieldKind::Text))
            .with_field(FieldDefinition::new("tag", FieldKind::Text).repeated())
            .with_field(FieldDefinition::new("color", FieldKind::Select))
    }

    #[test]
    fn bind_scalars_and_lists() {
        let mut form = profile_form();
        let params = RequestParams::from_query("name=alice&tag%5B%5D=a&tag%5B%5D=b&other=1").unwrap();
        form.bind(&params);

        assert_eq!(form.value("name"), Some(&FieldValue::from("alice")));
        assert_eq!(form.value("tag"), Some(&FieldValue::from(vec!["a", "b"])));
        assert_eq!(form.value("color"), None);
        assert_eq!(form.value("other"), None);
    }

    #[test]
    fn instance_default_prefers_explicit_default() {
        let mut form = profile_form();
        form.set_value("name", "bound");
        assert_eq!(form.instance_default("name"), Some(&FieldValue::from("bound")));

        form.set_default("name", "explicit");
        assert_eq!(form.instance_default("name"), Some(&FieldValue::from("explicit")));
    }

    #[test]
    fn members_as_options() {
        let form = profile_form()
            .with_property("sizes", json!({"s": "Small", "l": "Large"}))
            .with_property("levels", json!(["low", "high"]))
            .with_property("broken", json!("nope"))
            .with_option_method("colors", |_| Some([("r".to_string(), "Red".to_string())].into_iter().collect()));

        assert_eq!(form.resolve_member("sizes").unwrap().get("l").map(String::as_str), Some("Large"));
        assert_eq!(form.resolve_member("levels").unwrap().get("1").map(String::as_str), Some("high"));
        assert_eq!(form.resolve_member("colors").unwrap().len(), 1);
        assert!(form.resolve_member("broken").is_none());
        assert!(form.resolve_member("missing").is_none());
    }

    #[test]
    fn typed_values() {
        #[derive(Deserialize)]
        struct Profile {
            name: String,
            tag: Vec<String>,
        }

        let mut form = profile_form();
        form.set_value("name", "alice");
        form.set_value("tag", vec!["a"]);

        let profile: Profile = form.deserialize_values().unwrap();
        assert_eq!(profile.name, "alice");
        assert_eq!(profile.tag, vec!["a"]);
    }
}
