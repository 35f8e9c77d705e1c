//! coderoom is a relay for small live pair-coding rooms.
//!
//! It seats participants in interview or game rooms, forwards peer-to-peer
//! media negotiation between two addressed connections, and fans collaboration
//! events out to everyone else in a room.
//!
//! The binary `coderoom_server` wires these pieces to a TCP listener.

/// Handles configuration loading and management.
pub mod config;
/// Logging utilities for the relay.
pub mod log;
/// Room state machine, relay engine and its TCP runtime.
pub mod signaling;
