pub mod errors;
pub mod protocol;
pub mod registry;
pub mod rooms;
pub mod router;
pub mod run;
pub mod runtime;
pub mod server_engine;
pub mod server_event;
pub mod signaling_server;
pub mod transport;
pub mod types;

pub use errors::{JoinError, RelayError};
pub use rooms::{InMemoryRoomDirectory, RoomDirectory};
pub use server_engine::ServerEngine;
pub use signaling_server::SignalingServer;
