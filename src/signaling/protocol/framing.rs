use super::constants::HEADER_LEN;
use super::{FrameError, MsgType, PROTO_VERSION, ProtoError};
use std::io::{self, Read, Write};

/// Write a single frame: [ver][type][reserved u16=0][len u32][body...]
pub fn write_frame<W: Write>(w: &mut W, msg_type: MsgType, body: &[u8]) -> io::Result<()> {
    let len = u32::try_from(body.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "body too large"))?;
    let mut header = [0u8; HEADER_LEN];
    header[0] = PROTO_VERSION;
    header[1] = msg_type.as_u8();
    header[4..8].copy_from_slice(&len.to_be_bytes());
    w.write_all(&header)?;
    w.write_all(body)?;
    w.flush()?;
    Ok(())
}

/// Read a single frame, enforcing a max body length.
pub fn read_frame<R: Read>(r: &mut R, max_body: usize) -> Result<(MsgType, Vec<u8>), FrameError> {
    let mut header = [0u8; HEADER_LEN];

    r.read_exact(&mut header)?; // io::Error -> FrameError::Io

    if header[0] != PROTO_VERSION {
        return Err(ProtoError::InvalidFormat("bad proto version").into());
    }

    let msg_type = MsgType::from_u8(header[1])?;

    // flags ignored for now
    let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
    if len > max_body {
        return Err(ProtoError::TooLarge.into());
    }

    let mut body = vec![0u8; len];
    r.read_exact(&mut body)?;

    Ok((msg_type, body))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_layout_is_stable() {
        let mut wire = Vec::new();
        write_frame(&mut wire, MsgType::Ping, &[1, 2, 3]).unwrap();
        assert_eq!(wire, vec![PROTO_VERSION, 0x30, 0, 0, 0, 0, 0, 3, 1, 2, 3]);
    }

    #[test]
    fn oversized_body_is_rejected_before_allocation() {
        let mut wire = Vec::new();
        write_frame(&mut wire, MsgType::Ping, &[0u8; 64]).unwrap();
        match read_frame(&mut Cursor::new(wire), 16) {
            Err(FrameError::Proto(ProtoError::TooLarge)) => {}
            other => panic!("expected TooLarge, got {other:?}"),
        }
    }

    #[test]
    fn wrong_version_is_rejected() {
        let wire = vec![9, 0x30, 0, 0, 0, 0, 0, 0];
        match read_frame(&mut Cursor::new(wire), 16) {
            Err(FrameError::Proto(ProtoError::InvalidFormat(_))) => {}
            other => panic!("expected InvalidFormat, got {other:?}"),
        }
    }

    #[test]
    fn unknown_type_byte_is_rejected() {
        let wire = vec![PROTO_VERSION, 0xEE, 0, 0, 0, 0, 0, 0];
        match read_frame(&mut Cursor::new(wire), 16) {
            Err(FrameError::Proto(ProtoError::UnknownType(0xEE))) => {}
            other => panic!("expected UnknownType, got {other:?}"),
        }
    }

    #[test]
    fn short_body_is_an_io_error() {
        let wire = vec![PROTO_VERSION, 0x30, 0, 0, 0, 0, 0, 8, 1, 2];
        assert!(matches!(
            read_frame(&mut Cursor::new(wire), 16),
            Err(FrameError::Io(_))
        ));
    }
}
