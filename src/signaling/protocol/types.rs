use std::fmt;

use super::ProtoError;

// ---- Basic types ----------------------------------------------------------

/// Process-unique identity of one live transport session.
pub type ConnId = u64;
pub type RoomId = String;
/// Opaque media-negotiation blob (SDP offer/answer), never inspected.
pub type Sdp = Vec<u8>;

/// Named seat inside an interview room.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Role {
    Interviewer = 1,
    Interviewee = 2,
}

impl Role {
    pub fn from_u8(v: u8) -> Result<Role, ProtoError> {
        match v {
            1 => Ok(Role::Interviewer),
            2 => Ok(Role::Interviewee),
            other => Err(ProtoError::UnknownRole(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Interviewer => f.write_str("Interviewer"),
            Role::Interviewee => f.write_str("Interviewee"),
        }
    }
}
