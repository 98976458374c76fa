//! EmberDB - An embeddable, network-addressable in-memory data engine
//!
//! EmberDB is designed with strong cohesion and loose coupling principles:
//! - Each module has a single, well-defined responsibility
//! - Modules communicate through clear, minimal interfaces
//! - All mutable engine state has one logical owner, the dispatcher

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod fetch;
pub mod persist;
pub mod protocol;
pub mod pubsub;
pub mod server;
pub mod session;
pub mod store;
pub mod txn;

/// Re-export commonly used types
pub use commands::{Command, CommandContext};
pub use config::Config;
pub use dispatch::{Dispatched, Dispatcher};
pub use persist::{JournalWriter, Snapshot, SnapshotFile};
pub use protocol::{RespError, RespValue};
pub use session::SessionRegistry;
pub use store::{Entry, MemoryStore, Value};
