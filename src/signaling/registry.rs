use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::signaling::types::ConnId;

/// Tracks which transport connections are alive and when each was last heard from.
#[derive(Debug, Default)]
pub struct Registry {
    last_seen: HashMap<ConnId, Instant>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. Returns false if it was already known.
    pub fn register(&mut self, conn: ConnId, now: Instant) -> bool {
        self.last_seen.insert(conn, now).is_none()
    }

    /// Remove a connection; returns true if it was registered.
    pub fn unregister(&mut self, conn: ConnId) -> bool {
        self.last_seen.remove(&conn).is_some()
    }

    pub fn contains(&self, conn: ConnId) -> bool {
        self.last_seen.contains_key(&conn)
    }

    /// Record activity. Unknown connections are ignored.
    pub fn touch(&mut self, conn: ConnId, now: Instant) {
        if let Some(seen) = self.last_seen.get_mut(&conn) {
            *seen = now;
        }
    }

    /// Connections silent for strictly longer than `grace`.
    pub fn idle(&self, now: Instant, grace: Duration) -> Vec<ConnId> {
        let mut idle: Vec<ConnId> = self
            .last_seen
            .iter()
            .filter(|(_, seen)| now.saturating_duration_since(**seen) > grace)
            .map(|(conn, _)| *conn)
            .collect();
        idle.sort_unstable();
        idle
    }

    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_unregister() {
        let mut reg = Registry::new();
        let now = Instant::now();
        assert!(reg.register(1, now));
        assert!(!reg.register(1, now));
        assert!(reg.contains(1));
        assert_eq!(reg.len(), 1);

        assert!(reg.unregister(1));
        assert!(!reg.unregister(1));
        assert!(reg.is_empty());
    }

    #[test]
    fn idle_respects_grace_and_touch() {
        let mut reg = Registry::new();
        let t0 = Instant::now();
        reg.register(1, t0);
        reg.register(2, t0);

        let later = t0 + Duration::from_secs(10);
        reg.touch(2, later);

        let grace = Duration::from_secs(5);
        assert_eq!(reg.idle(later, grace), vec![1]);
        assert!(reg.idle(t0 + Duration::from_secs(5), grace).is_empty());
    }

    #[test]
    fn touching_unknown_connection_does_not_register_it() {
        let mut reg = Registry::new();
        reg.touch(9, Instant::now());
        assert!(!reg.contains(9));
    }
}
