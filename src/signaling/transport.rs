use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;

use crate::log::log_sink::LogSink;
use crate::signaling::protocol::{FrameError, Msg};
use crate::signaling::protocol::{read_msg as proto_read_msg, write_msg as proto_write_msg};
use crate::signaling::server_event::ServerEvent;
use crate::signaling::types::ConnId;
use crate::{sink_debug, sink_warn};

/// Thin wrapper over a blocking stream that speaks in `Msg`.
pub struct Connection<S> {
    pub conn_id: ConnId,
    stream: S,
    max_body: usize,
}

impl<S> Connection<S>
where
    S: Read + Write,
{
    pub fn new(conn_id: ConnId, stream: S, max_body: usize) -> Self {
        Self {
            conn_id,
            stream,
            max_body,
        }
    }

    pub fn recv(&mut self) -> Result<Msg, FrameError> {
        proto_read_msg(&mut self.stream, self.max_body)
    }

    pub fn send(&mut self, msg: &Msg) -> Result<(), FrameError> {
        proto_write_msg(&mut self.stream, msg)
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

/// Spawn reader + writer threads for a single TcpStream connection.
///
/// `server_tx` is the Sender<ServerEvent> that talks to the central server loop.
pub fn spawn_connection_threads(
    conn_id: ConnId,
    stream: TcpStream,
    server_tx: Sender<ServerEvent>,
    log: Arc<dyn LogSink>,
    max_body: usize,
) -> io::Result<()> {
    let (to_conn_tx, to_conn_rx) = mpsc::channel::<Msg>();

    let read_stream = stream.try_clone()?;
    let write_stream = stream;

    // Register conn with server
    server_tx
        .send(ServerEvent::RegisterConn {
            conn_id,
            to_conn: to_conn_tx,
        })
        .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "server loop is gone"))?;

    // READER THREAD: socket -> ServerEvent::MsgFromConn
    {
        let server_tx = server_tx.clone();
        let log = log.clone();
        thread::spawn(move || {
            let mut conn = Connection::new(conn_id, read_stream, max_body);

            loop {
                match conn.recv() {
                    Ok(msg) => {
                        if server_tx
                            .send(ServerEvent::MsgFromConn { conn_id, msg })
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = server_tx.send(ServerEvent::Disconnected { conn_id });
                        match e {
                            FrameError::Io(io_e) if io_e.kind() == io::ErrorKind::UnexpectedEof => {
                                sink_debug!(log, "[conn {}] peer closed the stream", conn_id);
                            }
                            FrameError::Io(io_e) => {
                                sink_warn!(
                                    log,
                                    "[conn {}] IO error in reader: {} (kind={:?})",
                                    conn_id,
                                    io_e,
                                    io_e.kind()
                                );
                            }
                            FrameError::Proto(p) => {
                                sink_warn!(log, "[conn {}] frame error in reader: {}", conn_id, p);
                            }
                        }
                        break;
                    }
                }
            }
        });
    }

    // WRITER THREAD: to_conn_rx -> socket
    thread::spawn(move || {
        let mut conn = Connection::new(conn_id, write_stream, max_body);

        while let Ok(msg) = to_conn_rx.recv() {
            if let Err(e) = conn.send(&msg) {
                sink_warn!(log, "[conn {}] error sending {}: {}", conn_id, msg.name(), e);
                let _ = server_tx.send(ServerEvent::Disconnected { conn_id });
                break;
            }
        }

        // Channel closed (disconnect or reaped): close both directions so the
        // reader unblocks too.
        let _ = conn.into_inner().shutdown(Shutdown::Both);
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::signaling::protocol::MAX_BODY_LEN;
    use std::io::Cursor;

    #[test]
    fn connection_round_trips_over_in_memory_stream() {
        let mut conn = Connection::new(1, Cursor::new(Vec::new()), MAX_BODY_LEN);
        conn.send(&Msg::Ping { nonce: 5 }).unwrap();

        let wire = conn.into_inner().into_inner();
        let mut back = Connection::new(1, Cursor::new(wire), MAX_BODY_LEN);
        assert_eq!(back.recv().unwrap(), Msg::Ping { nonce: 5 });
    }
}
