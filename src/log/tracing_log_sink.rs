use crate::log::{log_level::LogLevel, log_sink::LogSink};

/// Forwards sink messages to the process-wide `tracing` subscriber.
///
/// `tracing` needs its target at compile time, so the originating module path
/// travels as the `origin` field instead.
#[derive(Debug, Clone, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&self, level: LogLevel, msg: &str, target: &'static str) {
        match level {
            LogLevel::Trace => tracing::trace!(origin = target, "{msg}"),
            LogLevel::Debug => tracing::debug!(origin = target, "{msg}"),
            LogLevel::Info => tracing::info!(origin = target, "{msg}"),
            LogLevel::Warn => tracing::warn!(origin = target, "{msg}"),
            LogLevel::Error => tracing::error!(origin = target, "{msg}"),
        }
    }
}
