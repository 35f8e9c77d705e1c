use std::io;
use std::sync::Arc;

use crate::config::ServerSettings;
use crate::log::NoopLogSink;
use crate::log::log_sink::LogSink;
use crate::signaling::signaling_server::SignalingServer;

/// Run the relay with `settings` using the given log sink. Blocks forever
/// unless binding fails.
pub fn run_signaling_server_with_log(
    settings: ServerSettings,
    log_sink: Arc<dyn LogSink>,
) -> io::Result<()> {
    SignalingServer::bind(settings, log_sink)?.run()
}

/// Convenience: run the relay with a `NoopLogSink` (no logging).
pub fn run_signaling_server(settings: ServerSettings) -> io::Result<()> {
    run_signaling_server_with_log(settings, Arc::new(NoopLogSink))
}
