//! Command dispatcher
//!
//! Routes decoded commands to the right component and produces the replies
//! forwarded to the codec. Transaction state is checked before anything else,
//! so a queuing session buffers commands instead of executing them. The
//! dispatcher is the single logical owner of all mutable engine state; the
//! server wraps it in one async mutex, which makes EXEC batches and the
//! expiry sweep mutually exclusive critical sections.

use crate::commands::{CommandContext, CommandRegistry};
use crate::fetch::{FetchRequest, DEFAULT_CACHE_TTL_SECONDS};
use crate::protocol::RespValue;
use tracing::{debug, info, warn};

/// Outcome of dispatching one command
#[derive(Debug)]
pub enum Dispatched {
    /// One reply to send back
    Reply(RespValue),

    /// Several replies, in order (EXEC: one per queued command plus the
    /// completion marker)
    Batch(Vec<RespValue>),

    /// The command needs an outbound fetch; the connection task performs it
    /// without holding the engine lock, then calls complete_fetch
    Fetch(FetchRequest),
}

impl Dispatched {
    fn reply(value: RespValue) -> Self {
        Dispatched::Reply(value)
    }
}

/// Command dispatcher
pub struct Dispatcher {
    /// Command registry
    registry: CommandRegistry,

    /// Command execution context
    context: CommandContext,
}

impl Dispatcher {
    /// Create a dispatcher around a context
    pub fn new(context: CommandContext) -> Self {
        Dispatcher {
            registry: CommandRegistry::new(),
            context,
        }
    }

    /// Dispatch one decoded command on behalf of a session
    ///
    /// The session's command counter and the process-wide counter are
    /// incremented before any routing happens.
    pub fn dispatch(&mut self, session_id: u64, command: RespValue) -> Dispatched {
        self.context.registry.record_command(session_id);

        let args = match command.as_array() {
            Some(arr) if !arr.is_empty() => arr,
            Some(_) => return Dispatched::reply(RespValue::error("ERR empty command array")),
            None => return Dispatched::reply(RespValue::error("ERR expected array")),
        };

        let name = match command_name(&args[0]) {
            Ok(name) => name,
            Err(reply) => return Dispatched::reply(reply),
        };

        debug!("Dispatching command: {} (session {})", name, session_id);

        // Queuing sessions buffer everything except the transaction verbs
        if self.context.txn.is_queuing(session_id)
            && !matches!(name.as_str(), "MULTI" | "EXEC" | "DISCARD")
        {
            self.context.txn.enqueue(session_id, command.clone());
            return Dispatched::reply(RespValue::simple_string("QUEUED"));
        }

        match name.as_str() {
            "MULTI" => Dispatched::reply(match self.context.txn.begin(session_id) {
                Ok(()) => RespValue::simple_string("OK"),
                Err(e) => RespValue::error(format!("ERR {}", e)),
            }),
            "EXEC" => match self.context.txn.take(session_id) {
                Ok(queue) => Dispatched::Batch(self.execute_batch(session_id, queue)),
                Err(e) => Dispatched::reply(RespValue::error(format!("ERR {}", e))),
            },
            "DISCARD" => Dispatched::reply(match self.context.txn.discard(session_id) {
                Ok(()) => RespValue::simple_string("DISCARDED"),
                Err(e) => RespValue::error(format!("ERR {}", e)),
            }),
            "FETCH" | "FETCHCACHE" => self.dispatch_fetch(&name, &args[1..]),
            _ => Dispatched::reply(self.execute_command(session_id, &name, &args[1..])),
        }
    }

    /// Execute every queued command in original order, through the same path
    /// as live commands, and append the completion marker
    ///
    /// The whole batch runs inside one dispatch call, so it can never
    /// interleave with another session's commands or with the expiry sweep.
    fn execute_batch(&mut self, session_id: u64, queue: Vec<RespValue>) -> Vec<RespValue> {
        let mut replies = Vec::with_capacity(queue.len() + 1);
        for queued in queue {
            replies.push(self.execute_queued(session_id, queued));
        }
        replies.push(RespValue::simple_string("EXEC COMPLETE"));
        replies
    }

    /// Execute one command replayed from a transaction queue
    ///
    /// Fetch commands cannot leave the critical section, so inside a
    /// transaction they are served from the cache only.
    fn execute_queued(&mut self, session_id: u64, command: RespValue) -> RespValue {
        let args = match command.as_array() {
            Some(arr) if !arr.is_empty() => arr,
            _ => return RespValue::error("ERR empty command array"),
        };
        let name = match command_name(&args[0]) {
            Ok(name) => name,
            Err(reply) => return reply,
        };

        if matches!(name.as_str(), "FETCH" | "FETCHCACHE") {
            return match self.dispatch_fetch(&name, &args[1..]) {
                Dispatched::Reply(reply) => reply,
                _ => RespValue::error("ERR FETCH inside MULTI requires a cached entry"),
            };
        }

        self.execute_command(session_id, &name, &args[1..])
    }

    /// Look up, validate and run a registered command
    fn execute_command(&mut self, session_id: u64, name: &str, args: &[RespValue]) -> RespValue {
        let command = match self.registry.get(name) {
            Some(cmd) => cmd,
            None => {
                warn!("Unknown command: {}", name);
                return RespValue::error(format!("ERR unknown command '{}'", name));
            }
        };

        if args.len() < command.min_args() {
            return RespValue::error(format!(
                "ERR wrong number of arguments for '{}' command",
                name
            ));
        }
        if let Some(max) = command.max_args() {
            if args.len() > max {
                return RespValue::error(format!(
                    "ERR wrong number of arguments for '{}' command",
                    name
                ));
            }
        }

        self.context.session_id = session_id;
        let reply = command.execute(&mut self.context, args);

        // every mutation rewrites the snapshot; failed commands changed
        // nothing, so they skip the write
        if command.is_write() && !reply.is_error() {
            self.context.persist();
        }
        reply
    }

    /// Serve a fetch command from the cache, or defer it to the caller
    fn dispatch_fetch(&mut self, name: &str, args: &[RespValue]) -> Dispatched {
        if args.is_empty() {
            return Dispatched::reply(RespValue::error(format!(
                "ERR wrong number of arguments for '{}' command",
                name
            )));
        }
        let url = match args[0].as_bulk_string().map(|b| std::str::from_utf8(b)) {
            Some(Ok(url)) => url.to_string(),
            _ => return Dispatched::reply(RespValue::error("ERR invalid url")),
        };

        let ttl_seconds = if name == "FETCHCACHE" {
            let parsed = args
                .get(1)
                .and_then(|a| a.as_bulk_string())
                .and_then(|b| std::str::from_utf8(b).ok())
                .and_then(|s| s.parse::<u64>().ok());
            Some(parsed.unwrap_or(DEFAULT_CACHE_TTL_SECONDS))
        } else {
            None
        };

        if let Some(cached) = self.context.store.cache_get(&url) {
            return Dispatched::reply(RespValue::bulk_string(cached.payload.clone()));
        }
        Dispatched::Fetch(FetchRequest { url, ttl_seconds })
    }

    /// Install a completed fetch in the cache and build the reply
    pub fn complete_fetch(&mut self, request: &FetchRequest, payload: String) -> RespValue {
        self.context
            .store
            .cache_put(request.url.clone(), payload.clone(), request.ttl_seconds);
        self.context.persist();
        RespValue::bulk_string(payload)
    }

    /// Tear down a departed session: subscriptions, pending transaction,
    /// registry entry
    pub fn disconnect(&mut self, session_id: u64) {
        if let Some(subscribed) = self.context.registry.unregister(session_id) {
            self.context.broker.drop_session(session_id, &subscribed);
        }
        self.context.txn.drop_session(session_id);
    }

    /// Run one eager expiry pass, persisting once when anything was removed
    pub fn sweep(&mut self) {
        let removed = self.context.store.cleanup_expired();
        if removed > 0 {
            info!("Expiry sweep removed {} entries", removed);
            self.context.persist();
        }
    }

    /// Get reference to the context (for testing/inspection)
    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    /// Get mutable reference to the context (for testing/inspection)
    pub fn context_mut(&mut self) -> &mut CommandContext {
        &mut self.context
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(CommandContext::new())
    }
}

/// Decode the first token of a command array into an uppercase name
fn command_name(token: &RespValue) -> Result<String, RespValue> {
    match token.as_bulk_string() {
        Some(bytes) => match std::str::from_utf8(bytes) {
            Ok(name) => Ok(name.to_uppercase()),
            Err(_) => Err(RespValue::error("ERR invalid command name encoding")),
        },
        None => Err(RespValue::error("ERR command name must be a bulk string")),
    }
}
