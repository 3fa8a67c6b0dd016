//! Logger setup.
//!
//! Simple `[LEVEL] message` output for applications and tests that do not
//! bring their own `tracing` subscriber.
//!
//! # Usage
//!
//! ```rust
//! frameflow::logger::init();
//! tracing::info!("scheduler up");
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Initialize the logger with the default configuration (INFO level).
pub fn init() {
    init_with_level(LogLevel::Info);
}

/// Initialize the logger with a custom level.
///
/// Shows only `[LEVEL] message`: no timestamps, no module paths, no color.
/// Safe to call more than once; later calls are ignored.
pub fn init_with_level(level: LogLevel) {
    let filter = tracing_subscriber::filter::LevelFilter::from_level(level.into());

    let layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .with_level(true)
        .with_ansi(false)
        .compact()
        .with_filter(filter);

    let _ = Registry::default().with(layer).try_init();
}
