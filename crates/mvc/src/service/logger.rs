use crate::logging::LogLevel;
use std::fmt::Debug;
use tracing::{debug, error, info, warn};

/// Application logger handed to actions.
pub trait Logger: Send + Sync + Debug {
    fn log(&self, level: LogLevel, message: &str);

    /// Called before the action of a request is resolved.
    fn begin(&self) {}

    /// Called once the request has been handled, whatever the outcome.
    fn end(&self) {}
}

/// Forwards application log records to `tracing`.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    app_id: String,
}

impl TracingLogger {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self { app_id: app_id.into() }
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        let app = self.app_id.as_str();
        match level {
            LogLevel::Emerg | LogLevel::Alert | LogLevel::Crit | LogLevel::Err => error!(app, "{}", message),
            LogLevel::Warning => warn!(app, "{}", message),
            LogLevel::Notice | LogLevel::Info => info!(app, "{}", message),
            LogLevel::Debug => debug!(app, "{}", message),
        }
    }

    fn begin(&self) {
        debug!(app = self.app_id.as_str(), "request begin");
    }

    fn end(&self) {
        debug!(app = self.app_id.as_str(), "request end");
    }
}
