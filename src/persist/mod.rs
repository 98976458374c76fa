//! Snapshot and journal persistence
//!
//! Durability is a full-state JSON snapshot rewritten after every mutating
//! command, plus an append-only journal of one human-readable line per
//! mutation. The snapshot is the recovery source; the journal is an audit
//! trail and is never replayed.

use crate::store::{CacheEntry, MemoryStore, Value};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// Serializable projection of the durable state
///
/// Three top-level fields: the key-value map, the key -> expiry-deadline map
/// (epoch milliseconds) and the url -> cached-fetch map.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub store: HashMap<String, Value>,

    #[serde(default)]
    pub expiry_times: HashMap<String, u64>,

    #[serde(default)]
    pub fetch_cache: HashMap<String, CacheEntry>,
}

impl Snapshot {
    /// Project the live (non-expired) state of a store
    pub fn capture(store: &MemoryStore) -> Self {
        let mut snapshot = Snapshot::default();
        for (key, entry) in store.iter_entries() {
            snapshot.store.insert(key.clone(), entry.value.clone());
            if let Some(deadline) = entry.expires_at {
                snapshot.expiry_times.insert(key.clone(), deadline);
            }
        }
        for (url, cached) in store.iter_cache() {
            snapshot.fetch_cache.insert(url.clone(), cached.clone());
        }
        snapshot
    }

    /// Rebuild a store from this snapshot
    pub fn restore(self) -> MemoryStore {
        let mut store = MemoryStore::with_capacity(self.store.len().max(1024));
        for (key, value) in self.store {
            store.set(key, value);
        }
        for (key, deadline) in self.expiry_times {
            store.set_expiry_at(&key, deadline);
        }
        for (url, cached) in self.fetch_cache {
            store.cache_restore(url, cached);
        }
        store
    }
}

/// Reads and rewrites the snapshot file
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot if one exists
    ///
    /// A missing, unreadable or corrupt file is never fatal: it is logged and
    /// treated as empty state.
    pub fn load_or_default(&self) -> Snapshot {
        if !self.path.exists() {
            return Snapshot::default();
        }
        match std::fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Snapshot>(&bytes) {
                Ok(snapshot) => {
                    info!(
                        "Loaded snapshot from {:?} ({} keys)",
                        self.path,
                        snapshot.store.len()
                    );
                    snapshot
                }
                Err(e) => {
                    warn!("Corrupt snapshot {:?}, starting empty: {}", self.path, e);
                    Snapshot::default()
                }
            },
            Err(e) => {
                warn!("Cannot read snapshot {:?}, starting empty: {}", self.path, e);
                Snapshot::default()
            }
        }
    }

    /// Overwrite the snapshot durably
    ///
    /// Writes to a temporary file first and renames it into place, so a crash
    /// mid-write leaves the previous snapshot intact.
    pub fn save(&self, snapshot: &Snapshot) -> io::Result<()> {
        let payload = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.path.with_extension("tmp");
        let mut file = File::create(&tmp)?;
        file.write_all(&payload)?;
        file.sync_all()?;
        std::fs::rename(&tmp, &self.path)
    }
}

/// Append-only journal of mutating commands
///
/// One line per mutation: ISO-8601 timestamp followed by the command text.
/// Never compacted, never replayed.
pub struct JournalWriter {
    file: Mutex<File>,
}

impl JournalWriter {
    /// Open (or create) the journal for appending
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(JournalWriter {
            file: Mutex::new(file),
        })
    }

    /// Append one record
    pub fn append(&self, line: &str) -> io::Result<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "journal lock poisoned"))?;
        writeln!(file, "{} {}", Utc::now().to_rfc3339(), line)
    }
}
