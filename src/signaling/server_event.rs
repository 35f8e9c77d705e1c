use std::sync::mpsc::Sender;

use crate::signaling::{protocol::Msg, types::ConnId};

/// Events sent *to* the central server thread.
pub enum ServerEvent {
    /// A connection sent a message.
    MsgFromConn { conn_id: ConnId, msg: Msg },

    /// A connection went away (TCP closed or errored).
    Disconnected { conn_id: ConnId },

    /// A new connection is registered with its outgoing channel.
    RegisterConn {
        conn_id: ConnId,
        to_conn: Sender<Msg>,
    },
}
