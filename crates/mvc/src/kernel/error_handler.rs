use crate::error::DispatchError;
use std::collections::HashMap;
use tracing::error;

/// Called with every error that aborts a request or a console command,
/// before the error response is produced.
#[cfg_attr(test, mockall::automock)]
pub trait ErrorHandler: Send + Sync {
    fn handle_error(&self, error: &DispatchError);
}

/// Logs the error with its code at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingErrorHandler;

impl ErrorHandler for LoggingErrorHandler {
    fn handle_error(&self, e: &DispatchError) {
        error!(status = %e.status_code(), "{} [ERROR CODE({})]", e, e.code());
    }
}

/// User facing messages by error code.
///
/// Tables are searched from the most recently added one, so an application
/// table overrides the framework defaults.
#[derive(Debug, Clone, Default)]
pub struct ErrorMessages {
    tables: Vec<HashMap<u32, String>>,
}

impl ErrorMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table<I, S>(mut self, table: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        self.push_table(table);
        self
    }

    pub fn push_table<I, S>(&mut self, table: I)
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        self.tables.push(table.into_iter().map(|(code, message)| (code, message.into())).collect());
    }

    pub fn message(&self, code: u32) -> Option<&str> {
        self.tables.iter().rev().find_map(|table| table.get(&code)).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_table_wins() {
        let messages = ErrorMessages::new()
            .with_table([(1, "undefined action"), (2, "no such class")])
            .with_table([(1, "page not found")]);

        assert_eq!(messages.message(1), Some("page not found"));
        assert_eq!(messages.message(2), Some("no such class"));
        assert_eq!(messages.message(3), None);
    }
}
