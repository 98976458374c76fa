//! Transaction queuing
//!
//! Per-session MULTI/EXEC/DISCARD state. A session is either idle (commands
//! execute immediately) or queuing (commands are buffered verbatim until EXEC
//! replays them through the live dispatch path, or DISCARD drops them).

use crate::protocol::RespValue;
use std::collections::HashMap;
use std::fmt;

/// Transaction state errors
#[derive(Debug, Clone, PartialEq)]
pub enum TxnError {
    /// MULTI while already queuing
    Nested,

    /// EXEC without a preceding MULTI
    ExecWithoutMulti,

    /// DISCARD without a preceding MULTI
    DiscardWithoutMulti,
}

impl fmt::Display for TxnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxnError::Nested => write!(f, "MULTI calls can not be nested"),
            TxnError::ExecWithoutMulti => write!(f, "EXEC without MULTI"),
            TxnError::DiscardWithoutMulti => write!(f, "DISCARD without MULTI"),
        }
    }
}

/// Pending transaction queues, keyed by session id
pub struct TxnManager {
    queues: HashMap<u64, Vec<RespValue>>,
}

impl TxnManager {
    pub fn new() -> Self {
        TxnManager {
            queues: HashMap::new(),
        }
    }

    /// Enter queuing mode for a session
    pub fn begin(&mut self, session_id: u64) -> Result<(), TxnError> {
        if self.queues.contains_key(&session_id) {
            return Err(TxnError::Nested);
        }
        self.queues.insert(session_id, Vec::new());
        Ok(())
    }

    /// Whether the session is currently queuing
    pub fn is_queuing(&self, session_id: u64) -> bool {
        self.queues.contains_key(&session_id)
    }

    /// Buffer one decoded command verbatim
    pub fn enqueue(&mut self, session_id: u64, command: RespValue) {
        if let Some(queue) = self.queues.get_mut(&session_id) {
            queue.push(command);
        }
    }

    /// Leave queuing mode, handing back the buffered commands in order
    pub fn take(&mut self, session_id: u64) -> Result<Vec<RespValue>, TxnError> {
        self.queues
            .remove(&session_id)
            .ok_or(TxnError::ExecWithoutMulti)
    }

    /// Leave queuing mode, dropping the buffered commands
    pub fn discard(&mut self, session_id: u64) -> Result<(), TxnError> {
        self.queues
            .remove(&session_id)
            .map(|_| ())
            .ok_or(TxnError::DiscardWithoutMulti)
    }

    /// Forget any pending queue for a departing session
    pub fn drop_session(&mut self, session_id: u64) {
        self.queues.remove(&session_id);
    }
}

impl Default for TxnManager {
    fn default() -> Self {
        Self::new()
    }
}
