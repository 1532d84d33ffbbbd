use crate::discovery::{ClassResolver, TypeHandle};
use std::collections::HashMap;

/// Explicitly registered classes, looked up by exact identifier.
#[derive(Debug, Default, Clone)]
pub struct ClassRegistry {
    classes: HashMap<String, TypeHandle>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, class: impl Into<TypeHandle>) -> Self {
        self.register(class);
        self
    }

    /// Registers `class` under its own name, replacing a previous class of
    /// the same name.
    pub fn register(&mut self, class: impl Into<TypeHandle>) -> &mut Self {
        let handle = class.into();
        self.classes.insert(handle.name().to_string(), handle);
        self
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.classes.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassResolver for ClassRegistry {
    fn resolve(&self, type_name: &str) -> Option<TypeHandle> {
        self.classes.get(type_name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{ActionForm, FormClass};

    #[test]
    fn lookup_is_case_sensitive() {
        let registry = ClassRegistry::new().with(FormClass::new("Sample_Form_Login", |_| ActionForm::new()));

        assert!(registry.resolve("Sample_Form_Login").is_some());
        assert!(registry.resolve("sample_form_login").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn later_registration_replaces() {
        let mut registry = ClassRegistry::new();
        registry.register(FormClass::new("Sample_Form_Login", |_| ActionForm::new()));
        registry.register(FormClass::new("Sample_Form_Login", |_| ActionForm::new()).with_view_helper(|_| {}));

        let form = registry.resolve("Sample_Form_Login").and_then(TypeHandle::into_form).unwrap();
        assert!(form.has_view_helper());
        assert_eq!(registry.len(), 1);
    }
}
