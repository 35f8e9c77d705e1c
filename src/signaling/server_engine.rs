use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::log::NoopLogSink;
use crate::log::log_sink::LogSink;
use crate::signaling::errors::RelayError;
use crate::signaling::protocol::{MAX_BODY_LEN, Msg, Role, RoomEvent, RoomId, encode_msg};
use crate::signaling::registry::Registry;
use crate::signaling::rooms::{
    Departure, InMemoryRoomDirectory, JoinAttempt, Placement, RoomDirectory,
};
use crate::signaling::types::{ConnId, OutgoingMsg};
use crate::{sink_debug, sink_info, sink_trace, sink_warn};

/// Pure room/relay state machine. Every entrypoint returns the messages to
/// deliver; the engine itself never touches a socket.
pub struct ServerEngine {
    registry: Registry,
    rooms: Box<dyn RoomDirectory>,
    heartbeat_grace: Option<Duration>,
    max_frame_len: usize,
    log: Arc<dyn LogSink>,
}

impl Default for ServerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerEngine {
    pub fn new() -> Self {
        Self::with_log_and_rooms(Arc::new(NoopLogSink), Box::new(InMemoryRoomDirectory::new()))
    }

    /// Engine with a custom logger and the in-memory room directory.
    pub fn with_log(log: Arc<dyn LogSink>) -> Self {
        Self::with_log_and_rooms(log, Box::new(InMemoryRoomDirectory::new()))
    }

    /// Engine with a custom room directory, but Noop logging.
    pub fn with_rooms(rooms: Box<dyn RoomDirectory>) -> Self {
        Self::with_log_and_rooms(Arc::new(NoopLogSink), rooms)
    }

    /// Fully explicit constructor: custom logger + custom room directory.
    pub fn with_log_and_rooms(log: Arc<dyn LogSink>, rooms: Box<dyn RoomDirectory>) -> Self {
        Self {
            registry: Registry::new(),
            rooms,
            heartbeat_grace: None,
            max_frame_len: MAX_BODY_LEN,
            log,
        }
    }

    /// Enable liveness reaping: connections silent for longer than `grace`
    /// lose their seat on the next [`ServerEngine::reap_idle`].
    pub fn with_heartbeat(mut self, grace: Option<Duration>) -> Self {
        self.heartbeat_grace = grace;
        self
    }

    /// Largest frame body the engine may emit; relayed events that would
    /// exceed it are refused to the sender.
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    pub fn rooms(&self) -> &dyn RoomDirectory {
        self.rooms.as_ref()
    }

    pub fn is_connected(&self, conn: ConnId) -> bool {
        self.registry.contains(conn)
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// A transport connection came up. The client is told its own id.
    pub fn handle_connect(&mut self, conn: ConnId) -> Vec<OutgoingMsg> {
        if !self.registry.register(conn, Instant::now()) {
            sink_warn!(self.log, "conn {} registered twice", conn);
        }
        vec![OutgoingMsg::to(conn, Msg::Welcome { conn_id: conn })]
    }

    /// Main entrypoint: handle a message from a connection.
    ///
    /// Returns a list of (target_conn, Msg) to send.
    pub fn handle(&mut self, from: ConnId, msg: Msg) -> Vec<OutgoingMsg> {
        // Reaped or closed connections may still have frames in flight.
        if !self.registry.contains(from) {
            sink_debug!(
                self.log,
                "dropping {} from unregistered conn {}",
                msg.name(),
                from
            );
            return Vec::new();
        }
        self.registry.touch(from, Instant::now());

        match msg {
            Msg::JoinRoom { room_id, role } => self.handle_join_room(from, room_id, role),
            Msg::LeaveRoom => self.release(from),
            Msg::JoinGameRoom { room_id } => self.handle_join_game(from, room_id),
            Msg::LeaveGameRoom { room_id } => self.handle_leave_game(from, &room_id),

            Msg::CallOffer { to, sdp } => {
                self.forward(from, to, |from| Msg::IncomingCall { from, sdp })
            }
            Msg::CallAnswer { to, sdp } => {
                self.forward(from, to, |from| Msg::CallAccepted { from, sdp })
            }
            Msg::RenegotiationOffer { to, sdp } => {
                self.forward(from, to, |from| Msg::RenegotiationNeeded { from, sdp })
            }
            Msg::RenegotiationAnswer { to, sdp } => {
                self.forward(from, to, |from| Msg::RenegotiationFinal { from, sdp })
            }
            Msg::StreamRequest { to } => self.forward(from, to, |from| Msg::SendStreams { from }),
            Msg::CallEnd { to } => self.forward(from, to, |from| Msg::CallEnded { from }),

            Msg::Broadcast { room_id, event } => self.broadcast(from, room_id, event),

            Msg::Ping { nonce } => vec![OutgoingMsg::to(from, Msg::Pong { nonce })],
            Msg::Pong { .. } => Vec::new(),

            Msg::Welcome { .. }
            | Msg::RoomJoined { .. }
            | Msg::RoomErr { .. }
            | Msg::PeerAvailable { .. }
            | Msg::PeerLeft { .. }
            | Msg::IncomingCall { .. }
            | Msg::CallAccepted { .. }
            | Msg::RenegotiationNeeded { .. }
            | Msg::RenegotiationFinal { .. }
            | Msg::SendStreams { .. }
            | Msg::CallEnded { .. }
            | Msg::RelayErr { .. }
            | Msg::RoomEvent { .. } => {
                sink_warn!(
                    self.log,
                    "ignoring server-only msg from conn {}: {}",
                    from,
                    msg.name()
                );
                Vec::new()
            }
        }
    }

    /// Called when a transport connection closes, to release its seat.
    pub fn handle_disconnect(&mut self, conn: ConnId) -> Vec<OutgoingMsg> {
        if !self.registry.unregister(conn) {
            sink_debug!(self.log, "disconnect for unknown conn {}", conn);
        }
        let out = self.release(conn);
        sink_info!(
            self.log,
            "conn {} disconnected; {} connections remain",
            conn,
            self.registry.len()
        );
        out
    }

    /// Force-release every connection silent for longer than the heartbeat
    /// grace. Returns the reaped connections and the notifications for the
    /// survivors.
    pub fn reap_idle(&mut self, now: Instant) -> (Vec<ConnId>, Vec<OutgoingMsg>) {
        let Some(grace) = self.heartbeat_grace else {
            return (Vec::new(), Vec::new());
        };

        let reaped = self.registry.idle(now, grace);
        let mut out = Vec::new();
        for &conn in &reaped {
            sink_warn!(
                self.log,
                "conn {} silent for more than {:?}; releasing",
                conn,
                grace
            );
            self.registry.unregister(conn);
            out.extend(self.release(conn));
        }
        out.retain(|m| !reaped.contains(&m.conn_id_target));
        (reaped, out)
    }

    // ---- Individual handlers ---------------------------------------------

    fn handle_join_room(&mut self, from: ConnId, room_id: RoomId, role: Role) -> Vec<OutgoingMsg> {
        let JoinAttempt { evicted, outcome } = self.rooms.join_interview(&room_id, role, from);
        let mut out = self.notify_departure(from, evicted);

        match outcome {
            Ok(joined) => {
                sink_info!(
                    self.log,
                    "conn {} took {} seat in room {}",
                    from,
                    role,
                    room_id
                );
                out.push(OutgoingMsg::to(
                    from,
                    Msg::RoomJoined {
                        room_id: joined.room_id.clone(),
                    },
                ));
                if let Some(interviewer) = joined.notify {
                    out.push(OutgoingMsg::to(
                        interviewer,
                        Msg::PeerAvailable {
                            room_id: joined.room_id,
                            peer: from,
                        },
                    ));
                }
            }
            Err(err) => {
                sink_warn!(
                    self.log,
                    "conn {} join {} as {} rejected: {}",
                    from,
                    room_id,
                    role,
                    err
                );
                out.push(OutgoingMsg::to(
                    from,
                    Msg::RoomErr {
                        code: err.code().as_u16(),
                        reason: err.to_string(),
                    },
                ));
            }
        }
        out
    }

    fn handle_join_game(&mut self, from: ConnId, room_id: RoomId) -> Vec<OutgoingMsg> {
        let JoinAttempt { evicted, outcome } = self.rooms.join_game(&room_id, from);
        let mut out = self.notify_departure(from, evicted);

        match outcome {
            Ok(joined) => {
                sink_info!(self.log, "conn {} joined game room {}", from, room_id);
                out.push(OutgoingMsg::to(
                    from,
                    Msg::RoomJoined {
                        room_id: joined.room_id,
                    },
                ));
            }
            Err(err) => {
                sink_warn!(
                    self.log,
                    "conn {} join game room {} rejected: {}",
                    from,
                    room_id,
                    err
                );
                out.push(OutgoingMsg::to(
                    from,
                    Msg::RoomErr {
                        code: err.code().as_u16(),
                        reason: err.to_string(),
                    },
                ));
            }
        }
        out
    }

    fn handle_leave_game(&mut self, from: ConnId, room_id: &str) -> Vec<OutgoingMsg> {
        match self.rooms.placement(from) {
            Some(Placement::Game { room_id: current }) if current == room_id => self.release(from),
            _ => {
                sink_debug!(
                    self.log,
                    "conn {} left game room {} it was not in",
                    from,
                    room_id
                );
                Vec::new()
            }
        }
    }

    /// Release whatever `conn` holds and tell the remaining occupants.
    fn release(&mut self, conn: ConnId) -> Vec<OutgoingMsg> {
        let departure = self.rooms.leave(conn);
        self.notify_departure(conn, departure)
    }

    fn notify_departure(&self, conn: ConnId, departure: Option<Departure>) -> Vec<OutgoingMsg> {
        let Some(Departure { room_id, remaining }) = departure else {
            return Vec::new();
        };
        sink_info!(
            self.log,
            "conn {} left room {}; {} occupants remain",
            conn,
            room_id,
            remaining.len()
        );
        remaining
            .into_iter()
            .map(|peer| {
                OutgoingMsg::to(
                    peer,
                    Msg::PeerLeft {
                        room_id: room_id.clone(),
                        peer: conn,
                    },
                )
            })
            .collect()
    }

    /// Relay one negotiation message to `to`, stamped with the sender.
    fn forward<F>(&mut self, from: ConnId, to: ConnId, builder: F) -> Vec<OutgoingMsg>
    where
        F: FnOnce(ConnId) -> Msg,
    {
        if !self.registry.contains(to) {
            let err = RelayError::UnknownDestination(to);
            sink_warn!(self.log, "conn {} relay failed: {}", from, err);
            return vec![OutgoingMsg::to(
                from,
                Msg::RelayErr {
                    code: err.code().as_u16(),
                    to,
                },
            )];
        }

        let msg = builder(from);
        sink_debug!(
            self.log,
            "forwarding {} from conn {} to conn {}",
            msg.name(),
            from,
            to
        );
        vec![OutgoingMsg::to(to, msg)]
    }

    fn broadcast(&mut self, from: ConnId, room_id: RoomId, event: RoomEvent) -> Vec<OutgoingMsg> {
        let kind = event.name();
        let targets: Vec<ConnId> = self
            .rooms
            .occupants(&room_id)
            .into_iter()
            .filter(|&conn| conn != from)
            .collect();

        let stamped = Msg::RoomEvent {
            room_id,
            from,
            event,
        };

        // Stamping adds the sender id, so an inbound frame at the limit can
        // come out over it; recipients would drop the connection on read.
        let size = match encode_msg(&stamped) {
            Ok((_, body)) => body.len(),
            Err(e) => {
                sink_warn!(self.log, "conn {} broadcast {} not encodable: {}", from, kind, e);
                return Vec::new();
            }
        };
        if size > self.max_frame_len {
            let err = RelayError::EventTooLarge {
                size,
                max: self.max_frame_len,
            };
            sink_warn!(self.log, "conn {} broadcast {} rejected: {}", from, kind, err);
            return vec![OutgoingMsg::to(
                from,
                Msg::RoomErr {
                    code: err.code().as_u16(),
                    reason: err.to_string(),
                },
            )];
        }

        sink_trace!(
            self.log,
            "conn {} broadcast {} ({} bytes) to {} peers",
            from,
            kind,
            size,
            targets.len()
        );

        targets
            .into_iter()
            .map(|conn| OutgoingMsg::to(conn, stamped.clone()))
            .collect()
    }
}
