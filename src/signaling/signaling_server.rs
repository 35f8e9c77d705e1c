use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, mpsc};
use std::{io, thread};

use crate::config::ServerSettings;
use crate::log::log_sink::LogSink;
use crate::signaling::rooms::{InMemoryRoomDirectory, RoomDirectory};
use crate::signaling::router::Router;
use crate::signaling::runtime::run_server_loop;
use crate::signaling::server_engine::ServerEngine;
use crate::signaling::server_event::ServerEvent;
use crate::signaling::transport::spawn_connection_threads;
use crate::signaling::types::ConnId;
use crate::{sink_info, sink_warn};

/// Top-level runtime object for the relay.
///
/// This owns:
/// - the bound listener
/// - logging sink
/// - room directory backend
///
/// and knows how to spin up the central Router+Engine loop plus per-connection threads.
pub struct SignalingServer {
    listener: TcpListener,
    settings: ServerSettings,
    log: Arc<dyn LogSink>,
    rooms: Box<dyn RoomDirectory>,
}

impl SignalingServer {
    /// Bind the listen address from `settings` with the in-memory room directory.
    pub fn bind(settings: ServerSettings, log: Arc<dyn LogSink>) -> io::Result<Self> {
        Self::bind_with_rooms(settings, log, Box::new(InMemoryRoomDirectory::new()))
    }

    /// Bind with an arbitrary room directory (good for tests).
    pub fn bind_with_rooms(
        settings: ServerSettings,
        log: Arc<dyn LogSink>,
        rooms: Box<dyn RoomDirectory>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(&settings.listen_addr)?;
        Ok(Self {
            listener,
            settings,
            log,
            rooms,
        })
    }

    /// Actual bound address; useful when listening on port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Blocking main loop: spawn central server loop, accept TCP connections.
    pub fn run(self) -> io::Result<()> {
        let Self {
            listener,
            settings,
            log,
            rooms,
        } = self;

        // Events from all connections → central server loop
        let (server_tx, server_rx) = mpsc::channel::<ServerEvent>();

        // Central Router + Engine loop in its own thread
        {
            let log_for_loop = log.clone();
            let engine = ServerEngine::with_log_and_rooms(log.clone(), rooms)
                .with_heartbeat(settings.heartbeat_grace)
                .with_max_frame_len(settings.max_frame_len);
            let sweep_every = settings.heartbeat_grace.map(|_| settings.sweep_interval);

            thread::spawn(move || {
                sink_info!(log_for_loop, "[relay] server loop started");
                run_server_loop(Router::with_engine(engine), log_for_loop, server_rx, sweep_every);
            });
        }

        let mut next_conn_id: ConnId = 1;
        sink_info!(
            log,
            "relay listening on {} (heartbeat grace {:?})",
            listener.local_addr()?,
            settings.heartbeat_grace
        );

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    sink_warn!(
                        log,
                        "incoming TCP accept failed: {:?} (continuing to accept)",
                        e
                    );
                    continue;
                }
            };

            let conn_id = next_conn_id;
            next_conn_id += 1;

            let peer = stream
                .peer_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "?".into());
            sink_info!(log, "accepted TCP connection from {} as conn_id={}", peer, conn_id);

            if let Err(e) = spawn_connection_threads(
                conn_id,
                stream,
                server_tx.clone(),
                log.clone(),
                settings.max_frame_len,
            ) {
                sink_warn!(
                    log,
                    "failed to spawn connection threads for conn {}: {:?}",
                    conn_id,
                    e
                );
            }
        }

        Ok(())
    }
}
