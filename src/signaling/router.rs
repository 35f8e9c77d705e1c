use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::log::NoopLogSink;
use crate::log::log_sink::LogSink;
use crate::signaling::protocol::Msg;
use crate::signaling::rooms::RoomDirectory;
use crate::signaling::server_engine::ServerEngine;
use crate::signaling::types::{ConnId, OutgoingMsg};

/// Router glues the ServerEngine state machine to per-connection outboxes.
pub struct Router {
    engine: ServerEngine,
    outboxes: HashMap<ConnId, Vec<Msg>>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::with_log(Arc::new(NoopLogSink))
    }

    pub fn with_log(log: Arc<dyn LogSink>) -> Self {
        Self::with_engine(ServerEngine::with_log(log))
    }

    pub fn with_log_and_rooms(log: Arc<dyn LogSink>, rooms: Box<dyn RoomDirectory>) -> Self {
        Self::with_engine(ServerEngine::with_log_and_rooms(log, rooms))
    }

    pub fn with_engine(engine: ServerEngine) -> Self {
        Self {
            engine,
            outboxes: HashMap::new(),
        }
    }

    /// Register a new connection: creates its outbox and queues the Welcome.
    pub fn register_conn(&mut self, conn: ConnId) {
        self.outboxes.entry(conn).or_default();
        let out_msgs = self.engine.handle_connect(conn);
        self.enqueue_all(out_msgs);
    }

    /// Unregister a connection:
    /// - removes its outbox
    /// - lets the engine release its seat and emit any notifications.
    pub fn unregister_conn(&mut self, conn: ConnId) {
        self.outboxes.remove(&conn);
        let out_msgs = self.engine.handle_disconnect(conn);
        self.enqueue_all(out_msgs);
    }

    /// Main entrypoint: handle a message coming *from* a connection.
    pub fn handle_from_conn(&mut self, from: ConnId, msg: Msg) {
        let out_msgs = self.engine.handle(from, msg);
        self.enqueue_all(out_msgs);
    }

    /// Run a liveness sweep. Returns the connections that were reaped; their
    /// outboxes are discarded.
    pub fn reap_idle(&mut self, now: Instant) -> Vec<ConnId> {
        let (reaped, out_msgs) = self.engine.reap_idle(now);
        for conn in &reaped {
            self.outboxes.remove(conn);
        }
        self.enqueue_all(out_msgs);
        reaped
    }

    /// Drain and return all outgoing messages for a given connection.
    pub fn take_outgoing_for(&mut self, conn: ConnId) -> Vec<Msg> {
        self.outboxes
            .get_mut(&conn)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Drain all pending outgoing messages for all connections.
    ///
    /// Each entry is (conn_id_target, msg).
    pub fn drain_all_outgoing(&mut self) -> Vec<(ConnId, Msg)> {
        let mut result = Vec::new();
        for (&conn, msgs) in self.outboxes.iter_mut() {
            result.extend(msgs.drain(..).map(|m| (conn, m)));
        }
        result
    }

    pub fn engine(&self) -> &ServerEngine {
        &self.engine
    }

    fn enqueue_all(&mut self, out_msgs: Vec<OutgoingMsg>) {
        for out_msg in out_msgs {
            self.enqueue(out_msg);
        }
    }

    fn enqueue(&mut self, out_msg: OutgoingMsg) {
        // Only live connections have an outbox; anything else is dropped.
        if let Some(queue) = self.outboxes.get_mut(&out_msg.conn_id_target) {
            queue.push(out_msg.msg);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::signaling::protocol::{Role, RoomEvent};

    #[test]
    fn join_call_and_chat_are_routed() {
        let mut router = Router::new();
        let c1: ConnId = 1;
        let c2: ConnId = 2;

        router.register_conn(c1);
        router.register_conn(c2);
        assert_eq!(router.take_outgoing_for(c1), vec![Msg::Welcome { conn_id: c1 }]);
        assert_eq!(router.take_outgoing_for(c2), vec![Msg::Welcome { conn_id: c2 }]);

        // 1) Interviewer then interviewee
        router.handle_from_conn(
            c1,
            Msg::JoinRoom {
                room_id: "r1".into(),
                role: Role::Interviewer,
            },
        );
        router.handle_from_conn(
            c2,
            Msg::JoinRoom {
                room_id: "r1".into(),
                role: Role::Interviewee,
            },
        );

        let outs1 = router.take_outgoing_for(c1);
        assert_eq!(outs1.len(), 2);
        assert!(matches!(&outs1[0], Msg::RoomJoined { room_id } if room_id == "r1"));
        assert!(matches!(&outs1[1], Msg::PeerAvailable { peer, .. } if *peer == c2));

        let outs2 = router.take_outgoing_for(c2);
        assert_eq!(outs2.len(), 1);

        // 2) Offer to the new peer
        let fake_sdp = b"v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\n".to_vec();
        router.handle_from_conn(
            c1,
            Msg::CallOffer {
                to: c2,
                sdp: fake_sdp.clone(),
            },
        );
        assert!(router.take_outgoing_for(c1).is_empty());
        let outs2 = router.take_outgoing_for(c2);
        match &outs2[..] {
            [Msg::IncomingCall { from, sdp }] => {
                assert_eq!(*from, c1);
                assert_eq!(sdp, &fake_sdp);
            }
            other => panic!("expected IncomingCall, got {:?}", other),
        }

        // 3) Chat goes to the peer only
        router.handle_from_conn(
            c2,
            Msg::Broadcast {
                room_id: "r1".into(),
                event: RoomEvent::ChatMessage {
                    sender_name: "bob".into(),
                    text: "hello".into(),
                },
            },
        );
        assert!(router.take_outgoing_for(c2).is_empty());
        assert_eq!(router.take_outgoing_for(c1).len(), 1);
    }

    #[test]
    fn drain_all_outgoing_collects_messages_for_all_conns() {
        let mut router = Router::new();
        router.register_conn(1);
        router.register_conn(2);

        let mut outgoing = router.drain_all_outgoing();
        outgoing.sort_by_key(|(cid, _)| *cid);
        assert_eq!(
            outgoing,
            vec![
                (1, Msg::Welcome { conn_id: 1 }),
                (2, Msg::Welcome { conn_id: 2 })
            ]
        );

        assert!(router.drain_all_outgoing().is_empty());
    }

    #[test]
    fn unregister_notifies_peer_and_drops_outbox() {
        let mut router = Router::new();
        router.register_conn(1);
        router.register_conn(2);
        for c in [1, 2] {
            router.handle_from_conn(c, Msg::JoinGameRoom { room_id: "g".into() });
        }
        router.drain_all_outgoing();

        router.unregister_conn(1);
        assert_eq!(
            router.drain_all_outgoing(),
            vec![(
                2,
                Msg::PeerLeft {
                    room_id: "g".into(),
                    peer: 1
                }
            )]
        );
        assert!(!router.engine().is_connected(1));
    }
}
