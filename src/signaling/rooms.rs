use std::collections::{HashMap, HashSet};

use crate::signaling::errors::JoinError;
use crate::signaling::protocol::{Role, RoomId};
use crate::signaling::types::ConnId;

/// One named role slot in an interview room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Seat {
    #[default]
    Empty,
    Occupied(ConnId),
}

impl Seat {
    pub fn occupant(self) -> Option<ConnId> {
        match self {
            Seat::Empty => None,
            Seat::Occupied(conn) => Some(conn),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Seat::Empty
    }
}

#[derive(Debug, Default)]
pub struct InterviewRoom {
    pub interviewer: Seat,
    pub interviewee: Seat,
}

impl InterviewRoom {
    fn seat_mut(&mut self, role: Role) -> &mut Seat {
        match role {
            Role::Interviewer => &mut self.interviewer,
            Role::Interviewee => &mut self.interviewee,
        }
    }

    pub fn seat(&self, role: Role) -> Seat {
        match role {
            Role::Interviewer => self.interviewer,
            Role::Interviewee => self.interviewee,
        }
    }

    /// Check-and-assign in one step.
    ///
    /// On success returns the interviewer to notify when the interviewee seat
    /// was just filled.
    fn assign(&mut self, role: Role, conn: ConnId) -> Result<Option<ConnId>, JoinError> {
        match role {
            Role::Interviewer => {
                if !self.interviewer.is_empty() {
                    return Err(JoinError::SeatTaken(Role::Interviewer));
                }
                self.interviewer = Seat::Occupied(conn);
                Ok(None)
            }
            Role::Interviewee => {
                let Some(interviewer) = self.interviewer.occupant() else {
                    return Err(JoinError::InterviewerAbsent);
                };
                if !self.interviewee.is_empty() {
                    return Err(JoinError::SeatTaken(Role::Interviewee));
                }
                self.interviewee = Seat::Occupied(conn);
                Ok(Some(interviewer))
            }
        }
    }

    fn occupants(&self) -> Vec<ConnId> {
        [self.interviewer, self.interviewee]
            .into_iter()
            .filter_map(Seat::occupant)
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct GameRoom {
    pub occupants: HashSet<ConnId>,
}

impl GameRoom {
    fn sorted_occupants(&self) -> Vec<ConnId> {
        let mut all: Vec<ConnId> = self.occupants.iter().copied().collect();
        all.sort_unstable();
        all
    }
}

#[derive(Debug)]
pub enum Room {
    Interview(InterviewRoom),
    Game(GameRoom),
}

/// Where a connection currently sits. Kept as a reverse index so leaving
/// never scans the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Interview { room_id: RoomId, role: Role },
    Game { room_id: RoomId },
}

impl Placement {
    pub fn room_id(&self) -> &str {
        match self {
            Placement::Interview { room_id, .. } | Placement::Game { room_id } => room_id,
        }
    }
}

/// A connection left `room_id`; `remaining` are the occupants still there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: RoomId,
    pub remaining: Vec<ConnId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined {
    pub room_id: RoomId,
    /// Interviewer to tell that a peer is now available.
    pub notify: Option<ConnId>,
}

/// Result of a join: the eviction from the previous room happens first and
/// stands even when the new join is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinAttempt {
    pub evicted: Option<Departure>,
    pub outcome: Result<Joined, JoinError>,
}

/// Storage for room state.
///
/// Implementations are driven from a single owner (the server loop), so every
/// call is one atomic step against the directory.
pub trait RoomDirectory: Send {
    fn join_interview(&mut self, room_id: &str, role: Role, conn: ConnId) -> JoinAttempt;
    fn join_game(&mut self, room_id: &str, conn: ConnId) -> JoinAttempt;
    /// Release whatever `conn` holds, anywhere.
    fn leave(&mut self, conn: ConnId) -> Option<Departure>;
    fn occupants(&self, room_id: &str) -> Vec<ConnId>;
    fn placement(&self, conn: ConnId) -> Option<Placement>;
    /// `None` if the room is unknown or is not an interview room.
    fn seat(&self, room_id: &str, role: Role) -> Option<Seat>;
    fn room_count(&self) -> usize;
}

#[derive(Debug, Default)]
pub struct InMemoryRoomDirectory {
    rooms: HashMap<RoomId, Room>,
    placements: HashMap<ConnId, Placement>,
}

impl InMemoryRoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomDirectory for InMemoryRoomDirectory {
    fn join_interview(&mut self, room_id: &str, role: Role, conn: ConnId) -> JoinAttempt {
        let evicted = self.leave(conn);

        let room = self
            .rooms
            .entry(room_id.to_owned())
            .or_insert_with(|| Room::Interview(InterviewRoom::default()));

        let Room::Interview(seats) = room else {
            return JoinAttempt {
                evicted,
                outcome: Err(JoinError::WrongRoomKind),
            };
        };

        let outcome = seats.assign(role, conn).map(|notify| {
            self.placements.insert(
                conn,
                Placement::Interview {
                    room_id: room_id.to_owned(),
                    role,
                },
            );
            Joined {
                room_id: room_id.to_owned(),
                notify,
            }
        });

        JoinAttempt { evicted, outcome }
    }

    fn join_game(&mut self, room_id: &str, conn: ConnId) -> JoinAttempt {
        let already_here = matches!(
            self.placements.get(&conn),
            Some(Placement::Game { room_id: current }) if current == room_id
        );
        let evicted = if already_here { None } else { self.leave(conn) };

        let room = self
            .rooms
            .entry(room_id.to_owned())
            .or_insert_with(|| Room::Game(GameRoom::default()));

        let Room::Game(game) = room else {
            return JoinAttempt {
                evicted,
                outcome: Err(JoinError::WrongRoomKind),
            };
        };

        game.occupants.insert(conn);
        self.placements.insert(
            conn,
            Placement::Game {
                room_id: room_id.to_owned(),
            },
        );

        JoinAttempt {
            evicted,
            outcome: Ok(Joined {
                room_id: room_id.to_owned(),
                notify: None,
            }),
        }
    }

    fn leave(&mut self, conn: ConnId) -> Option<Departure> {
        let placement = self.placements.remove(&conn)?;
        let room_id = placement.room_id().to_owned();

        let remaining = match (self.rooms.get_mut(&room_id), &placement) {
            (Some(Room::Interview(seats)), Placement::Interview { role, .. }) => {
                let seat = seats.seat_mut(*role);
                if *seat == Seat::Occupied(conn) {
                    *seat = Seat::Empty;
                }
                seats.occupants()
            }
            (Some(Room::Game(game)), Placement::Game { .. }) => {
                game.occupants.remove(&conn);
                game.sorted_occupants()
            }
            // Index and rooms disagree; nothing left to release.
            _ => Vec::new(),
        };

        Some(Departure { room_id, remaining })
    }

    fn occupants(&self, room_id: &str) -> Vec<ConnId> {
        match self.rooms.get(room_id) {
            Some(Room::Interview(seats)) => seats.occupants(),
            Some(Room::Game(game)) => game.sorted_occupants(),
            None => Vec::new(),
        }
    }

    fn placement(&self, conn: ConnId) -> Option<Placement> {
        self.placements.get(&conn).cloned()
    }

    fn seat(&self, room_id: &str, role: Role) -> Option<Seat> {
        match self.rooms.get(room_id) {
            Some(Room::Interview(seats)) => Some(seats.seat(role)),
            _ => None,
        }
    }

    fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn joined(attempt: &JoinAttempt) -> &Joined {
        attempt.outcome.as_ref().expect("join should succeed")
    }

    #[test]
    fn interviewer_then_interviewee_notifies_interviewer() {
        let mut dir = InMemoryRoomDirectory::new();

        let a = dir.join_interview("A", Role::Interviewer, 1);
        assert_eq!(joined(&a).notify, None);

        let b = dir.join_interview("A", Role::Interviewee, 2);
        assert_eq!(joined(&b).notify, Some(1));

        assert_eq!(dir.seat("A", Role::Interviewer), Some(Seat::Occupied(1)));
        assert_eq!(dir.seat("A", Role::Interviewee), Some(Seat::Occupied(2)));
        assert_eq!(dir.occupants("A"), vec![1, 2]);
    }

    #[test]
    fn taken_seats_are_rejected_without_mutation() {
        let mut dir = InMemoryRoomDirectory::new();
        dir.join_interview("A", Role::Interviewer, 1);
        dir.join_interview("A", Role::Interviewee, 2);

        let again = dir.join_interview("A", Role::Interviewer, 3);
        assert_eq!(again.outcome, Err(JoinError::SeatTaken(Role::Interviewer)));
        let again = dir.join_interview("A", Role::Interviewee, 3);
        assert_eq!(again.outcome, Err(JoinError::SeatTaken(Role::Interviewee)));

        assert_eq!(dir.occupants("A"), vec![1, 2]);
        assert_eq!(dir.placement(3), None);
    }

    #[test]
    fn interviewee_needs_an_interviewer() {
        let mut dir = InMemoryRoomDirectory::new();
        let attempt = dir.join_interview("empty", Role::Interviewee, 3);
        assert_eq!(attempt.outcome, Err(JoinError::InterviewerAbsent));
        assert_eq!(dir.seat("empty", Role::Interviewee), Some(Seat::Empty));
    }

    #[test]
    fn joining_elsewhere_evicts_previous_seat() {
        let mut dir = InMemoryRoomDirectory::new();
        dir.join_interview("A", Role::Interviewer, 1);
        dir.join_interview("A", Role::Interviewee, 2);

        let moved = dir.join_interview("B", Role::Interviewer, 1);
        assert_eq!(
            moved.evicted,
            Some(Departure {
                room_id: "A".into(),
                remaining: vec![2],
            })
        );
        assert_eq!(dir.seat("A", Role::Interviewer), Some(Seat::Empty));
        assert_eq!(dir.seat("B", Role::Interviewer), Some(Seat::Occupied(1)));
        assert_eq!(
            dir.placement(1),
            Some(Placement::Interview {
                room_id: "B".into(),
                role: Role::Interviewer,
            })
        );
    }

    #[test]
    fn eviction_stands_when_new_join_fails() {
        let mut dir = InMemoryRoomDirectory::new();
        dir.join_interview("A", Role::Interviewer, 1);
        dir.join_interview("B", Role::Interviewer, 2);

        let attempt = dir.join_interview("B", Role::Interviewer, 1);
        assert_eq!(attempt.outcome, Err(JoinError::SeatTaken(Role::Interviewer)));
        assert!(attempt.evicted.is_some());
        assert_eq!(dir.seat("A", Role::Interviewer), Some(Seat::Empty));
        assert_eq!(dir.placement(1), None);
    }

    #[test]
    fn rejoining_own_seat_succeeds() {
        let mut dir = InMemoryRoomDirectory::new();
        dir.join_interview("A", Role::Interviewer, 1);
        let again = dir.join_interview("A", Role::Interviewer, 1);
        assert!(again.outcome.is_ok());
        assert_eq!(dir.seat("A", Role::Interviewer), Some(Seat::Occupied(1)));
    }

    #[test]
    fn leave_releases_exactly_one_seat() {
        let mut dir = InMemoryRoomDirectory::new();
        dir.join_interview("A", Role::Interviewer, 1);
        dir.join_interview("A", Role::Interviewee, 2);
        dir.join_interview("B", Role::Interviewer, 3);

        let gone = dir.leave(2).unwrap();
        assert_eq!(gone.room_id, "A");
        assert_eq!(gone.remaining, vec![1]);
        assert_eq!(dir.seat("A", Role::Interviewer), Some(Seat::Occupied(1)));
        assert_eq!(dir.seat("B", Role::Interviewer), Some(Seat::Occupied(3)));

        assert_eq!(dir.leave(2), None);
    }

    #[test]
    fn rooms_outlive_their_occupants() {
        let mut dir = InMemoryRoomDirectory::new();
        dir.join_interview("A", Role::Interviewer, 1);
        dir.leave(1);
        assert_eq!(dir.room_count(), 1);
        assert!(dir.occupants("A").is_empty());
    }

    #[test]
    fn game_rooms_accept_anyone() {
        let mut dir = InMemoryRoomDirectory::new();
        for conn in 1..=4 {
            assert!(dir.join_game("G", conn).outcome.is_ok());
        }
        assert_eq!(dir.occupants("G"), vec![1, 2, 3, 4]);

        let gone = dir.leave(3).unwrap();
        assert_eq!(gone.remaining, vec![1, 2, 4]);
    }

    #[test]
    fn rejoining_same_game_room_is_idempotent() {
        let mut dir = InMemoryRoomDirectory::new();
        dir.join_game("G", 1);
        dir.join_game("G", 2);
        let again = dir.join_game("G", 1);
        assert_eq!(again.evicted, None);
        assert_eq!(dir.occupants("G"), vec![1, 2]);
    }

    #[test]
    fn game_join_evicts_interview_seat_and_vice_versa() {
        let mut dir = InMemoryRoomDirectory::new();
        dir.join_interview("A", Role::Interviewer, 1);
        let attempt = dir.join_game("G", 1);
        assert_eq!(attempt.evicted.map(|d| d.room_id), Some("A".to_string()));
        assert_eq!(dir.seat("A", Role::Interviewer), Some(Seat::Empty));

        let back = dir.join_interview("A", Role::Interviewer, 1);
        assert_eq!(back.evicted.map(|d| d.room_id), Some("G".to_string()));
        assert!(dir.occupants("G").is_empty());
    }

    #[test]
    fn room_kinds_do_not_mix() {
        let mut dir = InMemoryRoomDirectory::new();
        dir.join_game("X", 1);
        let attempt = dir.join_interview("X", Role::Interviewer, 2);
        assert_eq!(attempt.outcome, Err(JoinError::WrongRoomKind));

        dir.join_interview("Y", Role::Interviewer, 3);
        let attempt = dir.join_game("Y", 4);
        assert_eq!(attempt.outcome, Err(JoinError::WrongRoomKind));
        assert_eq!(dir.placement(4), None);
        assert_eq!(dir.seat("X", Role::Interviewer), None);
    }
}
