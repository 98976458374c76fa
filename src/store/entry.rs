//! Entry structure for key-value pairs

use super::now_ms;
use super::value::Value;

/// Represents a single entry in the store
///
/// Expiry deadlines are absolute epoch milliseconds rather than process-local
/// instants so they survive a snapshot/restore cycle.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The value
    pub value: Value,

    /// Optional expiration time (epoch milliseconds)
    pub expires_at: Option<u64>,
}

impl Entry {
    /// Create a new entry without expiration
    pub fn new(value: Value) -> Self {
        Entry {
            value,
            expires_at: None,
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(deadline) => now_ms() > deadline,
            None => false,
        }
    }

    /// Set the expiration deadline (TTL in seconds from now)
    pub fn expire_in(&mut self, ttl_seconds: u64) {
        self.expires_at = Some(now_ms().saturating_add(ttl_seconds.saturating_mul(1000)));
    }

    /// Remove expiration
    pub fn clear_expiry(&mut self) {
        self.expires_at = None;
    }

    /// Get remaining TTL in seconds
    ///
    /// Returns:
    /// - Some(n) where n >= 0: remaining TTL in seconds
    /// - Some(-2): the deadline has already passed
    /// - None: no expiration is set
    pub fn ttl_seconds(&self) -> Option<i64> {
        self.expires_at.map(|deadline| {
            let now = now_ms();
            if deadline > now {
                ((deadline - now) / 1000) as i64
            } else {
                -2
            }
        })
    }
}
