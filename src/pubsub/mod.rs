//! Publish/subscribe broker
//!
//! Maps channel names to subscriber session ids. The broker never owns a
//! session's lifetime: delivery goes through the registry, which is also the
//! liveness check, so a subscriber that disconnected without unsubscribing is
//! neither counted nor messaged.

use crate::protocol::RespValue;
use crate::session::SessionRegistry;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Channel -> subscriber-id sets
///
/// Channels that lose their last subscriber are kept around; membership sets
/// are small and the next subscribe reuses them.
pub struct PubSubBroker {
    channels: Mutex<HashMap<String, HashSet<u64>>>,
}

impl PubSubBroker {
    pub fn new() -> Self {
        PubSubBroker {
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Add a session to a channel (idempotent)
    pub fn subscribe(&self, session_id: u64, channel: &str) {
        self.channels
            .lock()
            .unwrap()
            .entry(channel.to_string())
            .or_default()
            .insert(session_id);
    }

    /// Remove a session from a channel (idempotent)
    pub fn unsubscribe(&self, session_id: u64, channel: &str) {
        if let Some(members) = self.channels.lock().unwrap().get_mut(channel) {
            members.remove(&session_id);
        }
    }

    /// Remove a departing session from every channel it was subscribed to
    pub fn drop_session(&self, session_id: u64, subscribed: &HashSet<String>) {
        let mut channels = self.channels.lock().unwrap();
        for channel in subscribed {
            if let Some(members) = channels.get_mut(channel) {
                members.remove(&session_id);
            }
        }
    }

    /// Deliver a message to every live subscriber of a channel
    ///
    /// Returns the number of sessions the message was actually sent to.
    /// Subscribers whose session is gone are pruned from the membership set.
    pub fn publish(&self, channel: &str, message: &str, registry: &SessionRegistry) -> usize {
        let members: Vec<u64> = match self.channels.lock().unwrap().get(channel) {
            Some(members) => members.iter().copied().collect(),
            None => return 0,
        };

        let frame = RespValue::simple_string(format!("MESSAGE {} {}", channel, message));
        let mut delivered = 0;
        for id in members {
            if registry.send_to(id, frame.clone()) {
                delivered += 1;
            } else {
                self.unsubscribe(id, channel);
            }
        }
        delivered
    }
}

impl Default for PubSubBroker {
    fn default() -> Self {
        Self::new()
    }
}
