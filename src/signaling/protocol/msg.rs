// ---- Public message enum --------------------------------------------------

use crate::signaling::protocol::{ConnId, Role, RoomEvent, RoomId, Sdp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    // Connection registry (server → client)
    Welcome {
        conn_id: ConnId,
    },

    // Rooms
    JoinRoom {
        room_id: RoomId,
        role: Role,
    },
    RoomJoined {
        room_id: RoomId,
    },
    RoomErr {
        code: u16, // maps from RoomErrorCode
        reason: String,
    },
    /// Sent to the interviewer once an interviewee takes the other seat.
    PeerAvailable {
        room_id: RoomId,
        peer: ConnId,
    },
    LeaveRoom,
    PeerLeft {
        room_id: RoomId,
        peer: ConnId,
    },
    JoinGameRoom {
        room_id: RoomId,
    },
    LeaveGameRoom {
        room_id: RoomId,
    },

    // Negotiation relay: client sends the `to` form, peer receives the `from` form.
    CallOffer {
        to: ConnId,
        sdp: Sdp,
    },
    IncomingCall {
        from: ConnId,
        sdp: Sdp,
    },
    CallAnswer {
        to: ConnId,
        sdp: Sdp,
    },
    CallAccepted {
        from: ConnId,
        sdp: Sdp,
    },
    RenegotiationOffer {
        to: ConnId,
        sdp: Sdp,
    },
    RenegotiationNeeded {
        from: ConnId,
        sdp: Sdp,
    },
    RenegotiationAnswer {
        to: ConnId,
        sdp: Sdp,
    },
    RenegotiationFinal {
        from: ConnId,
        sdp: Sdp,
    },
    StreamRequest {
        to: ConnId,
    },
    SendStreams {
        from: ConnId,
    },
    CallEnd {
        to: ConnId,
    },
    CallEnded {
        from: ConnId,
    },
    RelayErr {
        code: u16, // maps from RelayErrorCode
        to: ConnId,
    },

    // Keepalive
    /// Any inbound frame counts as activity, but an otherwise quiet client
    /// must ping more often than `[Heartbeat] grace_ms` or the server
    /// releases its seat and closes the connection.
    Ping {
        nonce: u64,
    },
    Pong {
        nonce: u64,
    },

    // Room fan-out
    Broadcast {
        room_id: RoomId,
        event: RoomEvent,
    },
    RoomEvent {
        room_id: RoomId,
        from: ConnId,
        event: RoomEvent,
    },
}

impl Msg {
    /// Short variant name for logging; never includes payloads.
    pub fn name(&self) -> &'static str {
        use Msg::*;
        match self {
            Welcome { .. } => "Welcome",
            JoinRoom { .. } => "JoinRoom",
            RoomJoined { .. } => "RoomJoined",
            RoomErr { .. } => "RoomErr",
            PeerAvailable { .. } => "PeerAvailable",
            LeaveRoom => "LeaveRoom",
            PeerLeft { .. } => "PeerLeft",
            JoinGameRoom { .. } => "JoinGameRoom",
            LeaveGameRoom { .. } => "LeaveGameRoom",
            CallOffer { .. } => "CallOffer",
            IncomingCall { .. } => "IncomingCall",
            CallAnswer { .. } => "CallAnswer",
            CallAccepted { .. } => "CallAccepted",
            RenegotiationOffer { .. } => "RenegotiationOffer",
            RenegotiationNeeded { .. } => "RenegotiationNeeded",
            RenegotiationAnswer { .. } => "RenegotiationAnswer",
            RenegotiationFinal { .. } => "RenegotiationFinal",
            StreamRequest { .. } => "StreamRequest",
            SendStreams { .. } => "SendStreams",
            CallEnd { .. } => "CallEnd",
            CallEnded { .. } => "CallEnded",
            RelayErr { .. } => "RelayErr",
            Ping { .. } => "Ping",
            Pong { .. } => "Pong",
            Broadcast { .. } => "Broadcast",
            Msg::RoomEvent { .. } => "RoomEvent",
        }
    }
}
