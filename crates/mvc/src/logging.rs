//! Logging setup and the level set used by the [`Logger`](crate::service::Logger) service.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Installs a global fmt subscriber with the given max level.
///
/// Returns `false` if a global subscriber was already installed, in which case
/// the existing one is kept.
pub fn init(max_level: Level) -> bool {
    let subscriber = FmtSubscriber::builder().with_max_level(max_level).finish();
    tracing::subscriber::set_global_default(subscriber).is_ok()
}

/// Syslog style levels, from the most to the least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Emerg,
    Alert,
    Crit,
    Err,
    Warning,
    Notice,
    Info,
    Debug,
}

impl LogLevel {
    pub fn tracing_level(self) -> Level {
        match self {
            LogLevel::Emerg | LogLevel::Alert | LogLevel::Crit | LogLevel::Err => Level::ERROR,
            LogLevel::Warning => Level::WARN,
            LogLevel::Notice | LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
        }
    }
}
