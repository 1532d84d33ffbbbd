use crate::discovery::{ClassResolver, TypeHandle};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

const FRAMEWORK_ROOT: &str = "Micro";

/// Classes grouped by module path, found by convention.
///
/// A class becomes resolvable once its module is loaded, either explicitly
/// through [`ClassResolver::load_module`] or because one of the module paths
/// derived from the class identifier (see [`ConventionResolver::candidate_paths`])
/// names an existing module.
#[derive(Debug, Default)]
pub struct ConventionResolver {
    modules: HashMap<String, Vec<TypeHandle>>,
    loaded: Mutex<Vec<String>>,
}

impl ConventionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the module at `path` and the classes it defines.
    pub fn module(mut self, path: impl Into<String>, classes: impl IntoIterator<Item = TypeHandle>) -> Self {
        self.modules.entry(path.into()).or_default().extend(classes);
        self
    }

    /// Module paths tried for `class_name`, in order. For `App_Foo_Bar`:
    ///
    /// 1. `App_Foo_Bar`
    /// 2. `Foo/App_Foo_Bar`
    /// 3. `Foo/Bar`
    /// 4. `Micro/Foo/Bar`
    /// 5. `App/Foo/Bar`
    pub fn candidate_paths(class_name: &str) -> Vec<String> {
        let mut paths = vec![class_name.to_string()];

        if let Some((_, rest)) = class_name.split_once('_').filter(|(head, rest)| !head.is_empty() && !rest.is_empty()) {
            let mut segments = rest.split('_').collect::<Vec<_>>();
            segments.pop();
            segments.push(class_name);
            paths.push(segments.join("/"));

            let rest_path = rest.replace('_', "/");
            let framework_path = format!("{FRAMEWORK_ROOT}/{rest_path}");
            paths.push(rest_path);
            paths.push(framework_path);
            paths.push(class_name.replace('_', "/"));
        }

        let mut unique = Vec::with_capacity(paths.len());
        for path in paths {
            if !unique.contains(&path) {
                unique.push(path);
            }
        }
        unique
    }

    fn loaded_class(&self, type_name: &str) -> Option<TypeHandle> {
        let loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
        loaded
            .iter()
            .filter_map(|path| self.modules.get(path))
            .flatten()
            .find(|handle| handle.name() == type_name)
            .cloned()
    }
}

impl ClassResolver for ConventionResolver {
    fn resolve(&self, type_name: &str) -> Option<TypeHandle> {
        if let Some(handle) = self.loaded_class(type_name) {
            return Some(handle);
        }

        Self::candidate_paths(type_name)
            .iter()
            .filter(|path| self.load_module(path))
            .find_map(|_| self.loaded_class(type_name))
    }

    fn load_module(&self, module_path: &str) -> bool {
        if !self.modules.contains_key(module_path) {
            return false;
        }

        let mut loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
        if !loaded.iter().any(|path| path == module_path) {
            debug!(module = module_path, "module loaded");
            loaded.push(module_path.to_string());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{ActionForm, FormClass};

    fn form(name: &str) -> TypeHandle {
        FormClass::new(name, |_| ActionForm::new()).into()
    }

    #[test]
    fn candidate_paths_of_app_class() {
        assert_eq!(
            ConventionResolver::candidate_paths("Sample_Form_UserProfile"),
            vec![
                "Sample_Form_UserProfile",
                "Form/Sample_Form_UserProfile",
                "Form/UserProfile",
                "Micro/Form/UserProfile",
                "Sample/Form/UserProfile",
            ]
        );
    }

    #[test]
    fn candidate_paths_without_namespace() {
        assert_eq!(ConventionResolver::candidate_paths("Plain"), vec!["Plain"]);
    }

    #[test]
    fn resolves_through_conventional_module() {
        let resolver = ConventionResolver::new().module("Form/UserProfile", [form("Sample_Form_UserProfile")]);

        assert!(resolver.resolve("Sample_Form_UserProfile").is_some());
        assert!(resolver.resolve("Sample_Form_Other").is_none());
    }

    #[test]
    fn module_must_define_the_class() {
        let resolver = ConventionResolver::new().module("Form/UserProfile", [form("Sample_Form_Unrelated")]);
        assert!(resolver.resolve("Sample_Form_UserProfile").is_none());
    }

    #[test]
    fn explicitly_loaded_module() {
        let resolver = ConventionResolver::new().module("action/User/Profile", [form("Sample_Form_UserProfile")]);

        assert!(resolver.resolve("Sample_Form_UserProfile").is_none());
        assert!(resolver.load_module("action/User/Profile"));
        assert!(resolver.load_module("action/User/Profile"));
        assert!(resolver.resolve("Sample_Form_UserProfile").is_some());
    }
}
