//! Per-session log sink.
//!
//! Every reader/writer owns its own `LogSink`, so that several
//! files open in the same process log independently of each other.

use std::{fmt, sync::Arc};

use log::{Level, Log, Record};

/// Log target used for all records.
pub const LOG_TARGET: &str = "movkit";

/// Where a session's log records go.
#[derive(Clone, Default)]
pub enum LogSink {
    /// Forward to the logger installed via the `log` crate.
    #[default]
    Facade,
    /// Drop all records.
    Silent,
    /// Route to this logger only.
    Custom(Arc<dyn Log>),
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSink::Facade => write!(f, "LogSink::Facade"),
            LogSink::Silent => write!(f, "LogSink::Silent"),
            LogSink::Custom(_) => write!(f, "LogSink::Custom"),
        }
    }
}

impl LogSink {
    pub fn custom<L: Log + 'static>(logger: L) -> Self {
        Self::Custom(Arc::new(logger))
    }

    pub fn log(&self, level: Level, args: fmt::Arguments) {
        match self {
            LogSink::Silent => (),
            LogSink::Facade => {
                if level <= log::max_level() {
                    log::logger().log(&Record::builder()
                        .args(args)
                        .level(level)
                        .target(LOG_TARGET)
                        .build());
                }
            },
            LogSink::Custom(logger) => {
                let record = Record::builder()
                    .args(args)
                    .level(level)
                    .target(LOG_TARGET)
                    .build();
                if logger.enabled(record.metadata()) {
                    logger.log(&record);
                }
            },
        }
    }

    pub fn warn(&self, args: fmt::Arguments) {
        self.log(Level::Warn, args)
    }

    pub fn debug(&self, args: fmt::Arguments) {
        self.log(Level::Debug, args)
    }

    pub fn trace(&self, args: fmt::Arguments) {
        self.log(Level::Trace, args)
    }
}
