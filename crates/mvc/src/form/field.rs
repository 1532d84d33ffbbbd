use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;

/// Option key -> label, in display order.
pub type Options = IndexMap<String, String>;

/// The input widget a field is rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldKind {
    #[default]
    Text,
    Password,
    Hidden,
    Checkbox,
    Radio,
    Select,
    Textarea,
    Button,
    Submit,
    File,
    Email,
    Number,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Password => "password",
            FieldKind::Hidden => "hidden",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Radio => "radio",
            FieldKind::Select => "select",
            FieldKind::Textarea => "textarea",
            FieldKind::Button => "button",
            FieldKind::Submit => "submit",
            FieldKind::File => "file",
            FieldKind::Email => "email",
            FieldKind::Number => "number",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field kind [{0}]")]
pub struct UnknownFieldKind(String);

impl FromStr for FieldKind {
    type Err = UnknownFieldKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "text" => FieldKind::Text,
            "password" => FieldKind::Password,
            "hidden" => FieldKind::Hidden,
            "checkbox" => FieldKind::Checkbox,
            "radio" => FieldKind::Radio,
            "select" => FieldKind::Select,
            "textarea" => FieldKind::Textarea,
            "button" => FieldKind::Button,
            "submit" => FieldKind::Submit,
            "file" => FieldKind::File,
            "email" => FieldKind::Email,
            "number" => FieldKind::Number,
            _ => return Err(UnknownFieldKind(s.to_string())),
        };
        Ok(kind)
    }
}

/// A field value: one string, or one string per repetition of the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    /// The value as a list, a scalar being a list of one.
    pub fn as_list(&self) -> Vec<&str> {
        match self {
            FieldValue::Scalar(value) => vec![value.as_str()],
            FieldValue::List(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// The value of the `index`-th repetition: the scalar itself, or the
    /// `index`-th list element (empty when out of range).
    pub fn nth(&self, index: usize) -> &str {
        match self {
            FieldValue::Scalar(value) => value,
            FieldValue::List(values) => values.get(index).map_or("", String::as_str),
        }
    }

    pub fn first(&self) -> &str {
        self.nth(0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.as_list().contains(&key)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Scalar(value)
    }
}

impl<S: Into<String>> From<Vec<S>> for FieldValue {
    fn from(values: Vec<S>) -> Self {
        FieldValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Where the options of a checkbox, radio or select field come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionSource {
    Static(Options),
    /// `"colors"`: the option method or property `colors` of the form.
    /// `"color,list"`: the `list` attribute list of the `color` manager.
    Reference(String),
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for OptionSource {
    fn from(options: [(K, V); N]) -> Self {
        OptionSource::Static(options.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<Options> for OptionSource {
    fn from(options: Options) -> Self {
        OptionSource::Static(options)
    }
}

impl From<&str> for OptionSource {
    fn from(reference: &str) -> Self {
        OptionSource::Reference(reference.to_string())
    }
}

/// Declaration of one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    name: String,
    label: Option<String>,
    kind: FieldKind,
    default: Option<FieldValue>,
    option_source: Option<OptionSource>,
    repeated: bool,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self { name: name.into(), label: None, kind, default: None, option_source: None, repeated: false }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn default_value(mut self, default: impl Into<FieldValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn options(mut self, options: impl Into<OptionSource>) -> Self {
        self.option_source = Some(options.into());
        self
    }

    /// Options taken from a form member or a manager attribute list.
    pub fn option_ref(mut self, reference: impl Into<String>) -> Self {
        self.option_source = Some(OptionSource::Reference(reference.into()));
        self
    }

    /// The field is an array: its name gets `[]` and each rendering consumes
    /// one value.
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn default(&self) -> Option<&FieldValue> {
        self.default.as_ref()
    }

    pub fn option_source(&self) -> Option<&OptionSource> {
        self.option_source.as_ref()
    }

    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    /// The `name` attribute of the rendered element.
    pub fn input_name(&self) -> String {
        if self.repeated { format!("{}[]", self.name) } else { self.name.clone() }
    }
}
