// ---- Message type byte ----------------------------------------------------

use crate::signaling::protocol::ProtoError;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum MsgType {
    Welcome = 0x01,

    JoinRoom = 0x10,
    RoomJoined = 0x11,
    RoomErr = 0x12,
    PeerAvailable = 0x13,
    LeaveRoom = 0x14,
    PeerLeft = 0x15,
    JoinGameRoom = 0x16,
    LeaveGameRoom = 0x17,

    CallOffer = 0x20,
    IncomingCall = 0x21,
    CallAnswer = 0x22,
    CallAccepted = 0x23,
    RenegotiationOffer = 0x24,
    RenegotiationNeeded = 0x25,
    RenegotiationAnswer = 0x26,
    RenegotiationFinal = 0x27,
    StreamRequest = 0x28,
    SendStreams = 0x29,
    CallEnd = 0x2A,
    CallEnded = 0x2B,
    RelayErr = 0x2C,

    Ping = 0x30,
    Pong = 0x31,

    Broadcast = 0x40,
    RoomEvent = 0x41,
}

impl MsgType {
    pub fn from_u8(v: u8) -> Result<MsgType, ProtoError> {
        use MsgType::*;
        match v {
            0x01 => Ok(Welcome),
            0x10 => Ok(JoinRoom),
            0x11 => Ok(RoomJoined),
            0x12 => Ok(RoomErr),
            0x13 => Ok(PeerAvailable),
            0x14 => Ok(LeaveRoom),
            0x15 => Ok(PeerLeft),
            0x16 => Ok(JoinGameRoom),
            0x17 => Ok(LeaveGameRoom),
            0x20 => Ok(CallOffer),
            0x21 => Ok(IncomingCall),
            0x22 => Ok(CallAnswer),
            0x23 => Ok(CallAccepted),
            0x24 => Ok(RenegotiationOffer),
            0x25 => Ok(RenegotiationNeeded),
            0x26 => Ok(RenegotiationAnswer),
            0x27 => Ok(RenegotiationFinal),
            0x28 => Ok(StreamRequest),
            0x29 => Ok(SendStreams),
            0x2A => Ok(CallEnd),
            0x2B => Ok(CallEnded),
            0x2C => Ok(RelayErr),
            0x30 => Ok(Ping),
            0x31 => Ok(Pong),
            0x40 => Ok(Broadcast),
            0x41 => Ok(RoomEvent),
            other => Err(ProtoError::UnknownType(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
