//! Session registry
//!
//! Tracks every connected client: identity, metadata, the outbound message
//! channel its writer task drains, and the cancellation token that backs
//! forced disconnection. Session ids are monotonically increasing and unique
//! for the process lifetime, starting at 1.

use crate::protocol::RespValue;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// One connected client
#[derive(Debug)]
pub struct SessionHandle {
    pub id: u64,
    pub addr: String,
    pub connected_at: DateTime<Utc>,
    pub commands: u64,
    pub subscribed: HashSet<String>,
    sender: UnboundedSender<RespValue>,
    cancel: CancellationToken,
}

/// Read-only projection of a session for the admin commands
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: u64,
    pub addr: String,
    pub connected_at: DateTime<Utc>,
    pub commands: u64,
    pub subscribed: Vec<String>,
}

/// Registry of connected sessions plus the process-wide counters
pub struct SessionRegistry {
    sessions: Mutex<HashMap<u64, SessionHandle>>,
    next_id: AtomicU64,
    total_commands: AtomicU64,
    started_at: Instant,
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            total_commands: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Register a new connection, returning its session id
    pub fn register(
        &self,
        addr: String,
        sender: UnboundedSender<RespValue>,
        cancel: CancellationToken,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let handle = SessionHandle {
            id,
            addr,
            connected_at: Utc::now(),
            commands: 0,
            subscribed: HashSet::new(),
            sender,
            cancel,
        };
        self.sessions().insert(id, handle);
        id
    }

    /// Remove a session, returning the channels it was subscribed to so the
    /// caller can clean up the broker side
    pub fn unregister(&self, id: u64) -> Option<HashSet<String>> {
        self.sessions().remove(&id).map(|handle| handle.subscribed)
    }

    /// Take a session out of the registry and force its connection closed
    ///
    /// A final notice is pushed down its channel before cancellation; the
    /// subscribed channel set is returned for broker cleanup. None when no
    /// such session exists.
    pub fn kill(&self, id: u64, killed_by: u64) -> Option<HashSet<String>> {
        let handle = self.sessions().remove(&id)?;
        let _ = handle
            .sender
            .send(RespValue::simple_string(format!("KILLED by {}", killed_by)));
        handle.cancel.cancel();
        Some(handle.subscribed)
    }

    /// Count one decoded command against the session and the process totals
    pub fn record_command(&self, id: u64) {
        self.total_commands.fetch_add(1, Ordering::Relaxed);
        if let Some(handle) = self.sessions().get_mut(&id) {
            handle.commands += 1;
        }
    }

    /// Deliver a reply or pub/sub message to a session
    ///
    /// Returns false when the session is gone or its writer has shut down,
    /// which is how the broker validates liveness at delivery time.
    pub fn send_to(&self, id: u64, message: RespValue) -> bool {
        match self.sessions().get(&id) {
            Some(handle) => handle.sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Record a subscription on the session side
    pub fn mark_subscribed(&self, id: u64, channel: &str) {
        if let Some(handle) = self.sessions().get_mut(&id) {
            handle.subscribed.insert(channel.to_string());
        }
    }

    /// Remove a subscription on the session side
    pub fn mark_unsubscribed(&self, id: u64, channel: &str) {
        if let Some(handle) = self.sessions().get_mut(&id) {
            handle.subscribed.remove(channel);
        }
    }

    /// All connected sessions, ordered by id
    pub fn list(&self) -> Vec<SessionInfo> {
        let sessions = self.sessions();
        let mut infos: Vec<SessionInfo> = sessions.values().map(Self::info_of).collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    /// Describe one session by id
    pub fn describe(&self, id: u64) -> Option<SessionInfo> {
        self.sessions().get(&id).map(Self::info_of)
    }

    pub fn connected_count(&self) -> usize {
        self.sessions().len()
    }

    pub fn total_commands(&self) -> u64 {
        self.total_commands.load(Ordering::Relaxed)
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    fn info_of(handle: &SessionHandle) -> SessionInfo {
        let mut subscribed: Vec<String> = handle.subscribed.iter().cloned().collect();
        subscribed.sort();
        SessionInfo {
            id: handle.id,
            addr: handle.addr.clone(),
            connected_at: handle.connected_at,
            commands: handle.commands,
            subscribed,
        }
    }

    fn sessions(&self) -> std::sync::MutexGuard<'_, HashMap<u64, SessionHandle>> {
        self.sessions.lock().unwrap()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn connect(registry: &SessionRegistry) -> (u64, mpsc::UnboundedReceiver<RespValue>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = registry.register("127.0.0.1:50000".to_string(), tx, CancellationToken::new());
        (id, rx)
    }

    #[test]
    fn test_ids_are_monotonic_from_one() {
        let registry = SessionRegistry::new();
        let (first, _rx1) = connect(&registry);
        let (second, _rx2) = connect(&registry);
        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[test]
    fn test_command_counters() {
        let registry = SessionRegistry::new();
        let (id, _rx) = connect(&registry);
        registry.record_command(id);
        registry.record_command(id);
        assert_eq!(registry.total_commands(), 2);
        assert_eq!(registry.describe(id).unwrap().commands, 2);
    }

    #[test]
    fn test_send_to_dead_session_fails() {
        let registry = SessionRegistry::new();
        let (id, rx) = connect(&registry);
        assert!(registry.send_to(id, RespValue::simple_string("hello")));
        drop(rx);
        assert!(!registry.send_to(id, RespValue::simple_string("hello")));
        registry.unregister(id);
        assert!(!registry.send_to(id, RespValue::simple_string("hello")));
    }

    #[test]
    fn test_kill_notifies_and_cancels() {
        let registry = SessionRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let id = registry.register("127.0.0.1:50000".to_string(), tx, cancel.clone());
        registry.mark_subscribed(id, "news");

        let subscribed = registry.kill(id, 99).unwrap();
        assert!(subscribed.contains("news"));
        assert!(cancel.is_cancelled());
        assert_eq!(
            rx.try_recv().unwrap(),
            RespValue::simple_string("KILLED by 99")
        );
        assert!(registry.describe(id).is_none());
    }

    #[test]
    fn test_kill_unknown_session() {
        let registry = SessionRegistry::new();
        assert!(registry.kill(42, 1).is_none());
    }
}
