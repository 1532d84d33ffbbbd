//! Application managers: domain objects shared by the actions of a request,
//! looked up by type through [`Backend::manager`](crate::backend::Backend::manager).

use crate::backend::Backend;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Attribute list of a manager: key -> entry, each entry carrying at least a
/// `name`.
pub type AttrList = IndexMap<String, Value>;

#[cfg_attr(test, mockall::automock)]
pub trait Manager: Send + Sync {
    /// The attribute list named `attr`, e.g. the selectable colors of a
    /// `color` manager.
    fn attr_list(&self, attr: &str) -> Option<AttrList>;
}

type ManagerCtor = Arc<dyn Fn(&Backend) -> Arc<dyn Manager> + Send + Sync>;

/// A manager class, `<AppId>_<Type>Manager`.
pub struct ManagerClass {
    name: String,
    ctor: ManagerCtor,
}

impl ManagerClass {
    pub fn new<F>(name: impl Into<String>, ctor: F) -> Self
    where
        F: Fn(&Backend) -> Arc<dyn Manager> + Send + Sync + 'static,
    {
        Self { name: name.into(), ctor: Arc::new(ctor) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instantiate(&self, backend: &Backend) -> Arc<dyn Manager> {
        (self.ctor)(backend)
    }
}

impl fmt::Debug for ManagerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerClass").field("name", &self.name).finish_non_exhaustive()
    }
}

/// A manager serving fixed attribute lists.
#[derive(Debug, Clone, Default)]
pub struct StaticManager {
    lists: IndexMap<String, AttrList>,
}

impl StaticManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the list `attr` made of `(key, name)` entries.
    pub fn with_list<I, K, N>(mut self, attr: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, N)>,
        K: Into<String>,
        N: Into<String>,
    {
        let list = entries
            .into_iter()
            .map(|(key, name)| (key.into(), serde_json::json!({ "name": name.into() })))
            .collect();
        self.lists.insert(attr.into(), list);
        self
    }
}

impl Manager for StaticManager {
    fn attr_list(&self, attr: &str) -> Option<AttrList> {
        self.lists.get(attr).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn static_lists() {
        let manager = StaticManager::new().with_list("color", [("r", "Red"), ("g", "Green")]);

        let colors = manager.attr_list("color").unwrap();
        assert_eq!(colors.keys().collect::<Vec<_>>(), vec!["r", "g"]);
        assert_eq!(colors["g"], json!({"name": "Green"}));
        assert!(manager.attr_list("size").is_none());
    }

    #[test]
    fn mocked_manager() {
        let mut manager = MockManager::new();
        manager.expect_attr_list().withf(|attr| attr == "size").returning(|_| Some(AttrList::new()));

        assert_eq!(manager.attr_list("size").map(|list| list.len()), Some(0));
    }
}
