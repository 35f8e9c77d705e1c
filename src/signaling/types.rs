use crate::signaling::protocol::Msg;

pub use crate::signaling::protocol::ConnId;

/// A message the server wants to send to a connection.
#[derive(Debug)]
pub struct OutgoingMsg {
    pub conn_id_target: ConnId,
    pub msg: Msg,
}

impl OutgoingMsg {
    pub fn to(conn_id_target: ConnId, msg: Msg) -> Self {
        Self {
            conn_id_target,
            msg,
        }
    }
}
