use thiserror::Error;

use crate::signaling::protocol::{ConnId, Role};

#[repr(u16)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RoomErrorCode {
    InterviewerSeatTaken = 10,
    IntervieweeSeatTaken = 11,
    InterviewerAbsent = 12,
    WrongRoomKind = 13,
}

impl RoomErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

#[repr(u16)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RelayErrorCode {
    UnknownDestination = 20,
    EventTooLarge = 21,
}

impl RelayErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Why a join request was rejected. A rejected join never takes a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("{0} is already in the room.")]
    SeatTaken(Role),
    #[error("Interviewer is not present, wait!")]
    InterviewerAbsent,
    #[error("Room exists with a different kind.")]
    WrongRoomKind,
}

impl JoinError {
    pub fn code(self) -> RoomErrorCode {
        match self {
            JoinError::SeatTaken(Role::Interviewer) => RoomErrorCode::InterviewerSeatTaken,
            JoinError::SeatTaken(Role::Interviewee) => RoomErrorCode::IntervieweeSeatTaken,
            JoinError::InterviewerAbsent => RoomErrorCode::InterviewerAbsent,
            JoinError::WrongRoomKind => RoomErrorCode::WrongRoomKind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("no live connection {0}")]
    UnknownDestination(ConnId),
    #[error("room event of {size} bytes exceeds frame limit of {max}")]
    EventTooLarge { size: usize, max: usize },
}

impl RelayError {
    pub fn code(self) -> RelayErrorCode {
        match self {
            RelayError::UnknownDestination(_) => RelayErrorCode::UnknownDestination,
            RelayError::EventTooLarge { .. } => RelayErrorCode::EventTooLarge,
        }
    }
}
