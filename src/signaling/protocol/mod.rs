pub mod codec;
pub mod constants;
pub mod errors;
pub mod framing;
pub mod msg;
pub mod msg_type;
pub mod room_event;
pub mod types;

pub use codec::{decode_msg, encode_msg};
pub use constants::{MAX_BODY_LEN, PROTO_VERSION};
pub use errors::{FrameError, ProtoError};
pub use framing::{read_frame, write_frame};
pub use msg::Msg;
pub use msg_type::MsgType;
pub use room_event::RoomEvent;
pub use types::{ConnId, Role, RoomId, Sdp};

use std::io::{Read, Write};

/// Read one frame and decode it into a [`Msg`].
pub fn read_msg<R: Read>(r: &mut R, max_body: usize) -> Result<Msg, FrameError> {
    let (msg_type, body) = read_frame(r, max_body)?;
    Ok(decode_msg(msg_type, &body)?)
}

/// Encode a [`Msg`] and write it as one frame.
pub fn write_msg<W: Write>(w: &mut W, msg: &Msg) -> Result<(), FrameError> {
    let (msg_type, body) = encode_msg(msg)?;
    write_frame(w, msg_type, &body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::io::Cursor;

    #[test]
    fn messages_survive_a_byte_stream() {
        let mut wire = Vec::new();
        let sent = vec![
            Msg::JoinRoom {
                room_id: "room-7".into(),
                role: Role::Interviewer,
            },
            Msg::CallOffer {
                to: 2,
                sdp: b"v=0\r\n".to_vec(),
            },
            Msg::Broadcast {
                room_id: "room-7".into(),
                event: RoomEvent::ChatMessage {
                    sender_name: "ada".into(),
                    text: "hi".into(),
                },
            },
        ];
        for m in &sent {
            write_msg(&mut wire, m).unwrap();
        }

        let mut cursor = Cursor::new(wire);
        for expected in sent {
            let got = read_msg(&mut cursor, MAX_BODY_LEN).unwrap();
            assert_eq!(got, expected);
        }
        assert!(matches!(
            read_msg(&mut cursor, MAX_BODY_LEN),
            Err(FrameError::Io(_))
        ));
    }
}
