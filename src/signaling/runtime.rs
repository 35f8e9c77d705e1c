use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use crate::log::log_sink::LogSink;
use crate::signaling::protocol::Msg;
use crate::signaling::router::Router;
use crate::signaling::server_event::ServerEvent;
use crate::signaling::types::ConnId;
use crate::{sink_debug, sink_info, sink_warn};

/// Central server loop: owns Router + maps conn_id -> Sender<Msg>.
///
/// With `sweep_every` set, the loop wakes at least that often to reap
/// connections that stopped talking. Dropping a reaped connection's sender
/// makes its writer thread close the socket.
pub fn run_server_loop(
    mut router: Router,
    log: Arc<dyn LogSink>,
    rx: Receiver<ServerEvent>,
    sweep_every: Option<Duration>,
) {
    use ServerEvent::*;

    let mut conns: HashMap<ConnId, Sender<Msg>> = HashMap::new();
    let mut last_sweep = Instant::now();

    loop {
        let next = match sweep_every {
            Some(every) => match rx.recv_timeout(every) {
                Ok(ev) => Some(ev),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match rx.recv() {
                Ok(ev) => Some(ev),
                Err(_) => break,
            },
        };

        match next {
            Some(RegisterConn { conn_id, to_conn }) => {
                conns.insert(conn_id, to_conn);
                router.register_conn(conn_id);

                sink_info!(
                    log,
                    "registered conn {} in server loop (now {} conns)",
                    conn_id,
                    conns.len()
                );
            }

            Some(MsgFromConn { conn_id, msg }) => {
                sink_debug!(log, "MsgFromConn from {}: {}", conn_id, msg.name());
                router.handle_from_conn(conn_id, msg);
            }

            Some(Disconnected { conn_id }) => {
                // A reaped connection reports in here too once its socket
                // closes; the second release is a no-op.
                if conns.remove(&conn_id).is_some() {
                    sink_info!(log, "conn {} disconnected (transport)", conn_id);
                }
                router.unregister_conn(conn_id);
            }

            None => {}
        }

        if let Some(every) = sweep_every {
            let now = Instant::now();
            if now.duration_since(last_sweep) >= every {
                last_sweep = now;
                for conn_id in router.reap_idle(now) {
                    sink_warn!(log, "reaped idle conn {}", conn_id);
                    conns.remove(&conn_id);
                }
            }
        }

        deliver(&mut router, &conns, log.as_ref());
    }

    sink_info!(
        log,
        "ServerEvent channel closed; server loop shutting down ({} conns left)",
        conns.len()
    );
}

/// Drain all pending outgoing msgs and hand them to writer threads.
fn deliver(router: &mut Router, conns: &HashMap<ConnId, Sender<Msg>>, log: &dyn LogSink) {
    for (target, out_msg) in router.drain_all_outgoing() {
        match conns.get(&target) {
            Some(tx) => {
                if tx.send(out_msg).is_err() {
                    sink_warn!(
                        log,
                        "failed to deliver message to conn {} (channel closed)",
                        target
                    );
                }
            }
            None => {
                sink_warn!(log, "no conn {} to deliver outgoing message", target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    use crate::log::NoopLogSink;
    use crate::signaling::protocol::Role;
    use crate::signaling::server_engine::ServerEngine;

    fn spawn_loop(router: Router, sweep_every: Option<Duration>) -> Sender<ServerEvent> {
        let (ev_tx, ev_rx) = mpsc::channel::<ServerEvent>();
        let log = Arc::new(NoopLogSink);
        thread::spawn(move || run_server_loop(router, log, ev_rx, sweep_every));
        ev_tx
    }

    fn register(ev_tx: &Sender<ServerEvent>, conn_id: ConnId) -> Receiver<Msg> {
        let (to_conn, rx) = mpsc::channel::<Msg>();
        ev_tx
            .send(ServerEvent::RegisterConn { conn_id, to_conn })
            .unwrap();
        rx
    }

    #[test]
    fn server_loop_welcomes_and_acknowledges_join() {
        let ev_tx = spawn_loop(Router::new(), None);
        let rx = register(&ev_tx, 1);

        let welcome = rx.recv_timeout(Duration::from_millis(500)).unwrap();
        assert_eq!(welcome, Msg::Welcome { conn_id: 1 });

        ev_tx
            .send(ServerEvent::MsgFromConn {
                conn_id: 1,
                msg: Msg::JoinRoom {
                    room_id: "r".into(),
                    role: Role::Interviewer,
                },
            })
            .unwrap();

        let msg = rx
            .recv_timeout(Duration::from_millis(500))
            .expect("expected a message from server");
        assert_eq!(msg, Msg::RoomJoined { room_id: "r".into() });

        drop(ev_tx);
    }

    #[test]
    fn sweep_drops_silent_connection_channel() {
        let engine = ServerEngine::new().with_heartbeat(Some(Duration::from_millis(20)));
        let ev_tx = spawn_loop(Router::with_engine(engine), Some(Duration::from_millis(10)));
        let rx = register(&ev_tx, 1);

        assert_eq!(
            rx.recv_timeout(Duration::from_millis(500)).unwrap(),
            Msg::Welcome { conn_id: 1 }
        );

        // The loop reaps the conn and drops its sender, closing our channel.
        let closed = rx.recv_timeout(Duration::from_secs(2));
        assert_eq!(closed, Err(RecvTimeoutError::Disconnected));

        drop(ev_tx);
    }
}
