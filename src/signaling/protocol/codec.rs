use super::{Msg, MsgType, ProtoError, Role, RoomEvent};
use std::str;

// ---- Encode to body bytes -------------------------------------------------

pub fn encode_msg(msg: &Msg) -> Result<(MsgType, Vec<u8>), ProtoError> {
    let mut body = Vec::new();

    let msg_type = match msg {
        Msg::Welcome { conn_id } => {
            put_u64(&mut body, *conn_id);
            MsgType::Welcome
        }

        Msg::JoinRoom { room_id, role } => {
            put_str16(&mut body, room_id)?;
            put_u8(&mut body, role.as_u8());
            MsgType::JoinRoom
        }
        Msg::RoomJoined { room_id } => {
            put_str16(&mut body, room_id)?;
            MsgType::RoomJoined
        }
        Msg::RoomErr { code, reason } => {
            put_u16(&mut body, *code);
            put_str16(&mut body, reason)?;
            MsgType::RoomErr
        }
        Msg::PeerAvailable { room_id, peer } => {
            put_str16(&mut body, room_id)?;
            put_u64(&mut body, *peer);
            MsgType::PeerAvailable
        }
        Msg::LeaveRoom => MsgType::LeaveRoom,
        Msg::PeerLeft { room_id, peer } => {
            put_str16(&mut body, room_id)?;
            put_u64(&mut body, *peer);
            MsgType::PeerLeft
        }
        Msg::JoinGameRoom { room_id } => {
            put_str16(&mut body, room_id)?;
            MsgType::JoinGameRoom
        }
        Msg::LeaveGameRoom { room_id } => {
            put_str16(&mut body, room_id)?;
            MsgType::LeaveGameRoom
        }

        Msg::CallOffer { to, sdp } => put_addressed(&mut body, *to, sdp, MsgType::CallOffer)?,
        Msg::IncomingCall { from, sdp } => {
            put_addressed(&mut body, *from, sdp, MsgType::IncomingCall)?
        }
        Msg::CallAnswer { to, sdp } => put_addressed(&mut body, *to, sdp, MsgType::CallAnswer)?,
        Msg::CallAccepted { from, sdp } => {
            put_addressed(&mut body, *from, sdp, MsgType::CallAccepted)?
        }
        Msg::RenegotiationOffer { to, sdp } => {
            put_addressed(&mut body, *to, sdp, MsgType::RenegotiationOffer)?
        }
        Msg::RenegotiationNeeded { from, sdp } => {
            put_addressed(&mut body, *from, sdp, MsgType::RenegotiationNeeded)?
        }
        Msg::RenegotiationAnswer { to, sdp } => {
            put_addressed(&mut body, *to, sdp, MsgType::RenegotiationAnswer)?
        }
        Msg::RenegotiationFinal { from, sdp } => {
            put_addressed(&mut body, *from, sdp, MsgType::RenegotiationFinal)?
        }
        Msg::StreamRequest { to } => {
            put_u64(&mut body, *to);
            MsgType::StreamRequest
        }
        Msg::SendStreams { from } => {
            put_u64(&mut body, *from);
            MsgType::SendStreams
        }
        Msg::CallEnd { to } => {
            put_u64(&mut body, *to);
            MsgType::CallEnd
        }
        Msg::CallEnded { from } => {
            put_u64(&mut body, *from);
            MsgType::CallEnded
        }
        Msg::RelayErr { code, to } => {
            put_u16(&mut body, *code);
            put_u64(&mut body, *to);
            MsgType::RelayErr
        }

        Msg::Ping { nonce } => {
            put_u64(&mut body, *nonce);
            MsgType::Ping
        }
        Msg::Pong { nonce } => {
            put_u64(&mut body, *nonce);
            MsgType::Pong
        }

        Msg::Broadcast { room_id, event } => {
            put_str16(&mut body, room_id)?;
            put_event(&mut body, event)?;
            MsgType::Broadcast
        }
        Msg::RoomEvent {
            room_id,
            from,
            event,
        } => {
            put_str16(&mut body, room_id)?;
            put_u64(&mut body, *from);
            put_event(&mut body, event)?;
            MsgType::RoomEvent
        }
    };

    Ok((msg_type, body))
}

/// `[peer u64][sdp bytes32]`, shared by every negotiation message carrying a blob.
fn put_addressed(
    body: &mut Vec<u8>,
    peer: u64,
    sdp: &[u8],
    msg_type: MsgType,
) -> Result<MsgType, ProtoError> {
    put_u64(body, peer);
    put_bytes32(body, sdp)?;
    Ok(msg_type)
}

fn put_event(body: &mut Vec<u8>, event: &RoomEvent) -> Result<(), ProtoError> {
    use RoomEvent::*;
    put_u8(body, event.tag());
    match event {
        CodeUpdate { code } | PlayerCode { code } => put_str32(body, code)?,
        LanguageUpdate { language } => put_str16(body, language)?,
        ChatMessage { sender_name, text } => {
            put_str16(body, sender_name)?;
            put_str32(body, text)?;
        }
        QuestionSend {
            question,
            test_cases,
        } => {
            put_str32(body, question)?;
            put_bytes32(body, test_cases)?;
        }
        TestResultUpdate { test_cases } => put_bytes32(body, test_cases)?,
        TimerStart { time_left_secs } => put_u32(body, *time_left_secs),
        PlayerIo { input, output } => {
            put_str32(body, input)?;
            put_str32(body, output)?;
        }
        ProctorAlert { kind, message } => {
            put_str16(body, kind)?;
            put_str16(body, message)?;
        }
        QuestionClear | TimerStop | TimerReset => {}
    }
    Ok(())
}

// ---- Decode from body bytes ----------------------------------------------

pub fn decode_msg(msg_type: MsgType, body: &[u8]) -> Result<Msg, ProtoError> {
    let mut cursor = Cursor::new(body);

    let msg = match msg_type {
        MsgType::Welcome => Msg::Welcome {
            conn_id: cursor.get_u64()?,
        },

        MsgType::JoinRoom => {
            let room_id = cursor.get_str16()?.to_owned();
            let role = Role::from_u8(cursor.get_u8()?)?;
            Msg::JoinRoom { room_id, role }
        }
        MsgType::RoomJoined => Msg::RoomJoined {
            room_id: cursor.get_str16()?.to_owned(),
        },
        MsgType::RoomErr => {
            let code = cursor.get_u16()?;
            let reason = cursor.get_str16()?.to_owned();
            Msg::RoomErr { code, reason }
        }
        MsgType::PeerAvailable => {
            let room_id = cursor.get_str16()?.to_owned();
            let peer = cursor.get_u64()?;
            Msg::PeerAvailable { room_id, peer }
        }
        MsgType::LeaveRoom => Msg::LeaveRoom,
        MsgType::PeerLeft => {
            let room_id = cursor.get_str16()?.to_owned();
            let peer = cursor.get_u64()?;
            Msg::PeerLeft { room_id, peer }
        }
        MsgType::JoinGameRoom => Msg::JoinGameRoom {
            room_id: cursor.get_str16()?.to_owned(),
        },
        MsgType::LeaveGameRoom => Msg::LeaveGameRoom {
            room_id: cursor.get_str16()?.to_owned(),
        },

        MsgType::CallOffer => {
            let (to, sdp) = cursor.get_addressed()?;
            Msg::CallOffer { to, sdp }
        }
        MsgType::IncomingCall => {
            let (from, sdp) = cursor.get_addressed()?;
            Msg::IncomingCall { from, sdp }
        }
        MsgType::CallAnswer => {
            let (to, sdp) = cursor.get_addressed()?;
            Msg::CallAnswer { to, sdp }
        }
        MsgType::CallAccepted => {
            let (from, sdp) = cursor.get_addressed()?;
            Msg::CallAccepted { from, sdp }
        }
        MsgType::RenegotiationOffer => {
            let (to, sdp) = cursor.get_addressed()?;
            Msg::RenegotiationOffer { to, sdp }
        }
        MsgType::RenegotiationNeeded => {
            let (from, sdp) = cursor.get_addressed()?;
            Msg::RenegotiationNeeded { from, sdp }
        }
        MsgType::RenegotiationAnswer => {
            let (to, sdp) = cursor.get_addressed()?;
            Msg::RenegotiationAnswer { to, sdp }
        }
        MsgType::RenegotiationFinal => {
            let (from, sdp) = cursor.get_addressed()?;
            Msg::RenegotiationFinal { from, sdp }
        }
        MsgType::StreamRequest => Msg::StreamRequest {
            to: cursor.get_u64()?,
        },
        MsgType::SendStreams => Msg::SendStreams {
            from: cursor.get_u64()?,
        },
        MsgType::CallEnd => Msg::CallEnd {
            to: cursor.get_u64()?,
        },
        MsgType::CallEnded => Msg::CallEnded {
            from: cursor.get_u64()?,
        },
        MsgType::RelayErr => {
            let code = cursor.get_u16()?;
            let to = cursor.get_u64()?;
            Msg::RelayErr { code, to }
        }

        MsgType::Ping => Msg::Ping {
            nonce: cursor.get_u64()?,
        },
        MsgType::Pong => Msg::Pong {
            nonce: cursor.get_u64()?,
        },

        MsgType::Broadcast => {
            let room_id = cursor.get_str16()?.to_owned();
            let event = cursor.get_event()?;
            Msg::Broadcast { room_id, event }
        }
        MsgType::RoomEvent => {
            let room_id = cursor.get_str16()?.to_owned();
            let from = cursor.get_u64()?;
            let event = cursor.get_event()?;
            Msg::RoomEvent {
                room_id,
                from,
                event,
            }
        }
    };

    cursor.finish()?;
    Ok(msg)
}

// ---- Primitive write helpers ---------------------------------------------

fn put_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_be_bytes());
}

/// str16 = u16 length + UTF-8 bytes
fn put_str16(buf: &mut Vec<u8>, s: &str) -> Result<(), ProtoError> {
    let len = u16::try_from(s.len()).map_err(|_| ProtoError::StringTooLong {
        max: u16::MAX as usize,
        actual: s.len(),
    })?;
    put_u16(buf, len);
    buf.extend_from_slice(s.as_bytes());
    Ok(())
}

/// bytes32 = u32 length + raw bytes
fn put_bytes32(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<(), ProtoError> {
    let len = u32::try_from(bytes.len()).map_err(|_| ProtoError::StringTooLong {
        max: u32::MAX as usize,
        actual: bytes.len(),
    })?;
    put_u32(buf, len);
    buf.extend_from_slice(bytes);
    Ok(())
}

/// str32 = bytes32 holding UTF-8
fn put_str32(buf: &mut Vec<u8>, s: &str) -> Result<(), ProtoError> {
    put_bytes32(buf, s.as_bytes())
}

// ---- Cursor for decoding --------------------------------------------------

#[derive(Debug)]
struct Cursor<'a> {
    buf: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn get_bytes(&mut self, len: usize) -> Result<&'a [u8], ProtoError> {
        if self.buf.len() < len {
            return Err(ProtoError::Truncated);
        }
        let (head, rest) = self.buf.split_at(len);
        self.buf = rest;
        Ok(head)
    }

    fn get_array<const N: usize>(&mut self) -> Result<[u8; N], ProtoError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.get_bytes(N)?);
        Ok(out)
    }

    fn get_u8(&mut self) -> Result<u8, ProtoError> {
        Ok(self.get_array::<1>()?[0])
    }

    fn get_u16(&mut self) -> Result<u16, ProtoError> {
        Ok(u16::from_be_bytes(self.get_array()?))
    }

    fn get_u32(&mut self) -> Result<u32, ProtoError> {
        Ok(u32::from_be_bytes(self.get_array()?))
    }

    fn get_u64(&mut self) -> Result<u64, ProtoError> {
        Ok(u64::from_be_bytes(self.get_array()?))
    }

    /// Read str16 = u16 length + UTF-8 bytes
    fn get_str16(&mut self) -> Result<&'a str, ProtoError> {
        let len = self.get_u16()? as usize;
        let bytes = self.get_bytes(len)?;
        str::from_utf8(bytes).map_err(|_| ProtoError::InvalidUtf8)
    }

    fn get_bytes32(&mut self) -> Result<&'a [u8], ProtoError> {
        let len = self.get_u32()? as usize;
        self.get_bytes(len)
    }

    fn get_str32(&mut self) -> Result<String, ProtoError> {
        let bytes = self.get_bytes32()?;
        str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| ProtoError::InvalidUtf8)
    }

    fn get_addressed(&mut self) -> Result<(u64, Vec<u8>), ProtoError> {
        let peer = self.get_u64()?;
        let sdp = self.get_bytes32()?.to_vec();
        Ok((peer, sdp))
    }

    fn get_event(&mut self) -> Result<RoomEvent, ProtoError> {
        use RoomEvent::*;
        let tag = self.get_u8()?;
        let event = match tag {
            0x01 => CodeUpdate {
                code: self.get_str32()?,
            },
            0x02 => LanguageUpdate {
                language: self.get_str16()?.to_owned(),
            },
            0x03 => {
                let sender_name = self.get_str16()?.to_owned();
                let text = self.get_str32()?;
                ChatMessage { sender_name, text }
            }
            0x04 => {
                let question = self.get_str32()?;
                let test_cases = self.get_bytes32()?.to_vec();
                QuestionSend {
                    question,
                    test_cases,
                }
            }
            0x05 => QuestionClear,
            0x06 => TestResultUpdate {
                test_cases: self.get_bytes32()?.to_vec(),
            },
            0x07 => TimerStart {
                time_left_secs: self.get_u32()?,
            },
            0x08 => TimerStop,
            0x09 => TimerReset,
            0x0A => PlayerCode {
                code: self.get_str32()?,
            },
            0x0B => {
                let input = self.get_str32()?;
                let output = self.get_str32()?;
                PlayerIo { input, output }
            }
            0x0C => {
                let kind = self.get_str16()?.to_owned();
                let message = self.get_str16()?.to_owned();
                ProctorAlert { kind, message }
            }
            other => return Err(ProtoError::UnknownEvent(other)),
        };
        Ok(event)
    }

    /// Enforce that we've consumed the whole body.
    fn finish(self) -> Result<(), ProtoError> {
        if !self.buf.is_empty() {
            Err(ProtoError::InvalidFormat("trailing bytes in message body"))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    fn roundtrip(msg: Msg) -> Msg {
        let (msg_type, body) = encode_msg(&msg).unwrap();
        decode_msg(msg_type, &body).unwrap()
    }

    #[test]
    fn join_room_carries_role_byte() {
        let msg = Msg::JoinRoom {
            room_id: "abc".into(),
            role: Role::Interviewee,
        };
        let (msg_type, body) = encode_msg(&msg).unwrap();
        assert_eq!(msg_type, MsgType::JoinRoom);
        assert_eq!(body, vec![0, 3, b'a', b'b', b'c', 2]);
        assert_eq!(decode_msg(msg_type, &body).unwrap(), msg);
    }

    #[test]
    fn sdp_blob_is_preserved_byte_for_byte() {
        let sdp = b"v=0\r\no=- 46117317 2 IN IP4 127.0.0.1\r\n\xff\x00".to_vec();
        let msg = Msg::IncomingCall { from: 7, sdp };
        assert_eq!(roundtrip(msg.clone()), msg);
    }

    #[test]
    fn room_event_with_large_code_text() {
        let code = "x".repeat(u16::MAX as usize + 10);
        let msg = Msg::RoomEvent {
            room_id: "r".into(),
            from: 3,
            event: RoomEvent::CodeUpdate { code },
        };
        assert_eq!(roundtrip(msg.clone()), msg);
    }

    #[test]
    fn unit_events_have_no_payload() {
        let msg = Msg::Broadcast {
            room_id: "r".into(),
            event: RoomEvent::TimerReset,
        };
        let (_, body) = encode_msg(&msg).unwrap();
        // room_id str16 + tag
        assert_eq!(body.len(), 2 + 1 + 1);
    }

    #[test]
    fn room_id_longer_than_str16_is_rejected() {
        let msg = Msg::RoomJoined {
            room_id: "r".repeat(u16::MAX as usize + 1),
        };
        assert!(matches!(
            encode_msg(&msg),
            Err(ProtoError::StringTooLong { .. })
        ));
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let (msg_type, mut body) = encode_msg(&Msg::Ping { nonce: 1 }).unwrap();
        body.push(0);
        assert_eq!(
            decode_msg(msg_type, &body),
            Err(ProtoError::InvalidFormat("trailing bytes in message body"))
        );
    }

    #[test]
    fn decode_rejects_truncated_body() {
        let (msg_type, body) = encode_msg(&Msg::CallOffer {
            to: 1,
            sdp: vec![1, 2, 3, 4],
        })
        .unwrap();
        assert_eq!(
            decode_msg(msg_type, &body[..body.len() - 1]),
            Err(ProtoError::Truncated)
        );
    }

    #[test]
    fn decode_rejects_unknown_role_and_event() {
        assert_eq!(
            decode_msg(MsgType::JoinRoom, &[0, 1, b'r', 9]),
            Err(ProtoError::UnknownRole(9))
        );
        assert_eq!(
            decode_msg(MsgType::Broadcast, &[0, 1, b'r', 0x7F]),
            Err(ProtoError::UnknownEvent(0x7F))
        );
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        assert_eq!(
            decode_msg(MsgType::RoomJoined, &[0, 2, 0xC3, 0x28]),
            Err(ProtoError::InvalidUtf8)
        );
    }
}
