//! Command execution module
//!
//! Provides a unified interface for all commands through the Command trait.
//! Each command family is implemented in a separate file for high cohesion.

mod context;
mod registry;

// Command implementations
mod admin;
mod counter;
mod hash;
mod json;
mod key;
mod list;
mod pubsub;
mod string;
mod ttl;

pub use context::CommandContext;
pub use registry::CommandRegistry;

use crate::protocol::RespValue;

/// Command execution trait
///
/// All commands implement this trait with a single execute method.
/// This provides loose coupling between command implementations and the
/// dispatcher.
pub trait Command: Send + Sync {
    /// Execute the command with the given context and arguments
    ///
    /// Arguments:
    /// - ctx: mutable reference to the command context (store, registry,
    ///   broker, persistence handles, and the id of the calling session)
    /// - args: command arguments (excluding the command name itself)
    ///
    /// Returns:
    /// - RespValue representing the response to send to the client
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue;

    /// Get the command name (for registration and logging)
    fn name(&self) -> &'static str;

    /// Alternate names this command is also registered under
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Get the minimum number of arguments required
    fn min_args(&self) -> usize {
        0
    }

    /// Get the maximum number of arguments (None = unlimited)
    fn max_args(&self) -> Option<usize> {
        None
    }

    /// Whether a successful execution mutates durable state
    ///
    /// The dispatcher rewrites the snapshot after every such command.
    fn is_write(&self) -> bool {
        false
    }
}

/// Helper function to extract a text token from a RespValue
pub(crate) fn extract_text(value: &RespValue) -> Result<&str, &'static str> {
    let bytes = value.as_bulk_string().ok_or("Expected bulk string")?;
    std::str::from_utf8(bytes).map_err(|_| "Invalid UTF-8")
}

/// Helper function to extract an integer from a RespValue
pub(crate) fn extract_integer(value: &RespValue) -> Result<i64, &'static str> {
    match value {
        RespValue::Integer(i) => Ok(*i),
        RespValue::BulkString(bytes) => {
            let s = std::str::from_utf8(bytes).map_err(|_| "Invalid UTF-8")?;
            s.parse::<i64>().map_err(|_| "Invalid integer")
        }
        _ => Err("Expected integer or bulk string"),
    }
}

/// Helper function to append one record to the journal
pub(crate) fn log_to_journal(ctx: &CommandContext, line: String) {
    use tracing::warn;

    if let Some(ref journal) = ctx.journal {
        if let Err(e) = journal.append(&line) {
            warn!("Failed to write to journal: {}", e);
        }
    }
}
