//! Command registry
//!
//! Centralized registry for all available commands.
//! This allows loose coupling between command implementations and the
//! dispatcher. MULTI/EXEC/DISCARD and the fetch commands are not listed here:
//! the dispatcher handles them directly because they act on the dispatch flow
//! itself rather than on the store.

use super::{admin, counter, hash, json, key, list, pubsub, string, ttl, Command};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of all available commands
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a new command registry and register all commands
    pub fn new() -> Self {
        let mut registry = CommandRegistry {
            commands: HashMap::new(),
        };

        // Register string commands
        registry.register(Arc::new(string::SetCommand));
        registry.register(Arc::new(string::GetCommand));
        registry.register(Arc::new(string::MGetCommand));
        registry.register(Arc::new(string::MSetCommand));

        // Register key commands
        registry.register(Arc::new(key::DelCommand));
        registry.register(Arc::new(key::ExistsCommand));
        registry.register(Arc::new(key::KeysCommand));
        registry.register(Arc::new(key::FlushAllCommand));

        // Register counter commands
        registry.register(Arc::new(counter::IncrCommand));
        registry.register(Arc::new(counter::DecrCommand));

        // Register TTL commands
        registry.register(Arc::new(ttl::ExpireCommand));
        registry.register(Arc::new(ttl::TtlCommand));

        // Register list commands
        registry.register(Arc::new(list::LPushCommand));
        registry.register(Arc::new(list::RPushCommand));
        registry.register(Arc::new(list::LPushXCommand));
        registry.register(Arc::new(list::RPushXCommand));
        registry.register(Arc::new(list::LRangeCommand));

        // Register hash commands
        registry.register(Arc::new(hash::HSetCommand));
        registry.register(Arc::new(hash::HGetCommand));
        registry.register(Arc::new(hash::HGetAllCommand));
        registry.register(Arc::new(hash::HDelCommand));

        // Register JSON commands
        registry.register(Arc::new(json::JsonSetCommand));
        registry.register(Arc::new(json::JsonGetCommand));
        registry.register(Arc::new(json::JsonUpdateCommand));

        // Register pub/sub commands
        registry.register(Arc::new(pubsub::SubscribeCommand));
        registry.register(Arc::new(pubsub::UnsubscribeCommand));
        registry.register(Arc::new(pubsub::PublishCommand));

        // Register admin commands
        registry.register(Arc::new(admin::InfoCommand));
        registry.register(Arc::new(admin::MetricsCommand));
        registry.register(Arc::new(admin::ClientCommand));
        registry.register(Arc::new(admin::ReplicaOfCommand));
        registry.register(Arc::new(admin::SaveCommand));

        registry
    }

    /// Register a command under its name and every alias
    fn register(&mut self, command: Arc<dyn Command>) {
        self.commands
            .insert(command.name().to_uppercase(), command.clone());
        for alias in command.aliases() {
            self.commands.insert(alias.to_uppercase(), command.clone());
        }
    }

    /// Get a command by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(&name.to_uppercase()).cloned()
    }

    /// Check if a command exists
    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(&name.to_uppercase())
    }

    /// Get all command names
    pub fn command_names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = CommandRegistry::new();
        assert!(registry.has_command("set"));
        assert!(registry.has_command("SET"));
        assert!(!registry.has_command("NOPE"));
    }

    #[test]
    fn test_aliases_resolve() {
        let registry = CommandRegistry::new();
        assert!(registry.has_command("JSONUPDATE"));
        assert!(registry.has_command("JSON.UPDATE"));
        assert_eq!(
            registry.get("json.update").unwrap().name(),
            registry.get("JSONUPDATE").unwrap().name()
        );
    }
}
