use crate::log::log_level::LogLevel;

/// Destination for the leveled `sink_*!` macros.
///
/// Components receive an `Arc<dyn LogSink>` at construction time so tests can
/// run silently with [`NoopLogSink`](crate::log::NoopLogSink).
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, msg: &str, target: &'static str);
}
