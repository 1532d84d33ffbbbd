use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Per-user state kept across requests.
pub trait Session: Send + Sync + Debug {
    /// Re-attaches to the state of an existing session, if any.
    fn restore(&self);

    fn is_started(&self) -> bool;

    fn get(&self, name: &str) -> Option<Value>;

    fn set(&self, name: &str, value: Value);

    fn remove(&self, name: &str) -> Option<Value>;

    fn destroy(&self);
}

/// A session held in memory for the lifetime of the request.
#[derive(Debug)]
pub struct MemorySession {
    name: String,
    started: AtomicBool,
    values: Mutex<HashMap<String, Value>>,
}

impl MemorySession {
    pub fn new(app_id: &str) -> Self {
        Self { name: format!("{}SESSID", app_id.to_uppercase()), started: AtomicBool::new(false), values: Mutex::default() }
    }

    /// Cookie name of the session.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Session for MemorySession {
    fn restore(&self) {
        self.started.store(true, Ordering::Release);
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).get(name).cloned()
    }

    fn set(&self, name: &str, value: Value) {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).insert(name.to_string(), value);
    }

    fn remove(&self, name: &str) -> Option<Value> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).remove(name)
    }

    fn destroy(&self) {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).clear();
        self.started.store(false, Ordering::Release);
    }
}
