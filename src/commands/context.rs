//! Command execution context

use crate::persist::{JournalWriter, Snapshot, SnapshotFile};
use crate::pubsub::PubSubBroker;
use crate::session::SessionRegistry;
use crate::store::MemoryStore;
use crate::txn::TxnManager;
use std::sync::Arc;
use tracing::warn;

/// Context provided to commands during execution
///
/// This context gives commands access to the store and the other engine
/// components they touch. It is owned by the dispatcher, whose lock makes it
/// the single logical owner of all mutable engine state.
pub struct CommandContext {
    /// The memory store (keys plus the fetch cache)
    pub store: MemoryStore,

    /// Connected sessions and process-wide counters
    pub registry: Arc<SessionRegistry>,

    /// Channel membership for pub/sub
    pub broker: PubSubBroker,

    /// Pending transaction queues
    pub txn: TxnManager,

    /// Optional journal for the mutation audit trail
    pub journal: Option<Arc<JournalWriter>>,

    /// Optional snapshot target; None disables persistence (tests)
    pub snapshot: Option<SnapshotFile>,

    /// Configured replica target, metadata only
    pub replica_of: Option<(String, u16)>,

    /// Session on whose behalf the current command runs
    pub session_id: u64,
}

impl CommandContext {
    /// Create a bare context with no persistence attached
    pub fn new() -> Self {
        CommandContext {
            store: MemoryStore::new(),
            registry: Arc::new(SessionRegistry::new()),
            broker: PubSubBroker::new(),
            txn: TxnManager::new(),
            journal: None,
            snapshot: None,
            replica_of: None,
            session_id: 0,
        }
    }

    /// Create a context around an already-restored store
    pub fn with_store(store: MemoryStore, registry: Arc<SessionRegistry>) -> Self {
        CommandContext {
            store,
            registry,
            broker: PubSubBroker::new(),
            txn: TxnManager::new(),
            journal: None,
            snapshot: None,
            replica_of: None,
            session_id: 0,
        }
    }

    /// Attach the snapshot file rewritten after each mutation
    pub fn set_snapshot(&mut self, snapshot: SnapshotFile) {
        self.snapshot = Some(snapshot);
    }

    /// Attach the journal writer
    pub fn set_journal(&mut self, journal: Arc<JournalWriter>) {
        self.journal = Some(journal);
    }

    /// Rewrite the snapshot with the current state, best effort
    ///
    /// Persistence failures are logged and never propagated: the command that
    /// triggered the write already applied in memory.
    pub fn persist(&self) {
        if let Some(ref file) = self.snapshot {
            if let Err(e) = file.save(&Snapshot::capture(&self.store)) {
                warn!("Snapshot write failed: {}", e);
            }
        }
    }
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new()
    }
}
