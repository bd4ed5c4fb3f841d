//! # Logging
//!
//! Everything in this crate logs through the [`log`] facade. The host only offers a plain
//! line-oriented sink, so [`SinkLogger`] adapts one to the facade.
//!
//! The log is the only record of which hack or variant engaged in a process.

use std::error::Error;
use std::fmt;

use log::{error, LevelFilter, Log, Metadata, Record};

/// Line-oriented log output provided by the host
pub trait LogSink: Send + Sync {
    /// Writes one message
    fn log(&self, message: &str);
}

/// [`Log`] implementation writing to a [`LogSink`]
pub struct SinkLogger<S> {
    /// Where messages go
    sink: S,
    /// Most verbose level that's written
    level: LevelFilter,
}
impl<S: LogSink> SinkLogger<S> {
    /// Creates a logger writing messages up to `level` to `sink`
    pub fn new(sink: S, level: LevelFilter) -> Self {
        Self { sink, level }
    }
}

impl<S: LogSink> Log for SinkLogger<S> {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            self.sink
                .log(&format!("[{}] {}: {}", record.level(), record.target(), record.args()));
        }
    }

    fn flush(&self) {}
}

/// Installs `sink` as the process-wide logger.
///
/// Returns `false` if a logger was already installed, which happens when the host calls the
/// bootstrap stage more than once in a process.
pub fn init<S: LogSink + 'static>(sink: S, level: LevelFilter) -> bool {
    match log::set_boxed_logger(Box::new(SinkLogger::new(sink, level))) {
        Ok(()) => {
            log::set_max_level(level);
            true
        }
        Err(_) => false,
    }
}

/// Logs `error` along with its chain of causes
pub fn log_error(error: &(dyn Error + 'static)) {
    error!("{}", ErrorChain(error));
}

/// Displays an error followed by each of its sources
pub struct ErrorChain<'a>(pub &'a (dyn Error + 'static));
impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(cause) = source {
            write!(f, ": caused by: {cause}")?;
            source = cause.source();
        }
        Ok(())
    }
}
