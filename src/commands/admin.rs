//! Admin commands (INFO, METRICS, CLIENT, REPLICAOF, SAVE)

use super::{extract_text, Command, CommandContext};
use crate::protocol::RespValue;

/// INFO command - Server information and statistics
///
/// Syntax: INFO
pub struct InfoCommand;

impl Command for InfoCommand {
    fn execute(&self, ctx: &mut CommandContext, _args: &[RespValue]) -> RespValue {
        let replica = match &ctx.replica_of {
            Some((host, port)) => format!("{}:{}", host, port),
            None => "none".to_string(),
        };
        let info = format!(
            "# Server\n\
            EmberDB in-memory data engine\n\
            # Clients\n\
            Connected Clients: {}\n\
            # Keys\n\
            Keys: {}\n\
            # Replica\n\
            ReplicaOf: {}\n\
            # Uptime\n\
            {} seconds\n",
            ctx.registry.connected_count(),
            ctx.store.len(),
            replica,
            ctx.registry.uptime_seconds(),
        );
        RespValue::bulk_string(info)
    }

    fn name(&self) -> &'static str {
        "INFO"
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// METRICS command - Aggregate counters
///
/// Syntax: METRICS
pub struct MetricsCommand;

impl Command for MetricsCommand {
    fn execute(&self, ctx: &mut CommandContext, _args: &[RespValue]) -> RespValue {
        let metrics = format!(
            "totalCommands:{}\nconnectedClients:{}\nkeys:{}\n",
            ctx.registry.total_commands(),
            ctx.registry.connected_count(),
            ctx.store.len(),
        );
        RespValue::bulk_string(metrics)
    }

    fn name(&self) -> &'static str {
        "METRICS"
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
}

/// CLIENT command - Session administration
///
/// Syntax: CLIENT LIST | CLIENT INFO <id> | CLIENT KILL <id>
pub struct ClientCommand;

impl ClientCommand {
    fn parse_id(arg: Option<&RespValue>) -> Option<u64> {
        extract_text(arg?).ok()?.parse::<u64>().ok()
    }
}

impl Command for ClientCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let subcommand = match extract_text(&args[0]) {
            Ok(s) => s.to_uppercase(),
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };

        match subcommand.as_str() {
            "LIST" => {
                let lines: Vec<RespValue> = ctx
                    .registry
                    .list()
                    .into_iter()
                    .map(|info| {
                        RespValue::bulk_string(format!(
                            "id={} addr={} connectedAt={} cmds={}",
                            info.id,
                            info.addr,
                            info.connected_at.to_rfc3339(),
                            info.commands,
                        ))
                    })
                    .collect();
                RespValue::array(lines)
            }
            "INFO" => {
                let id = match Self::parse_id(args.get(1)) {
                    Some(id) => id,
                    None => return RespValue::error("ERR invalid client id"),
                };
                match ctx.registry.describe(id) {
                    Some(info) => RespValue::bulk_string(format!(
                        "id:{}\naddr:{}\nconnectedAt:{}\ncommandsExecuted:{}\nsubscribed:{}",
                        info.id,
                        info.addr,
                        info.connected_at.to_rfc3339(),
                        info.commands,
                        info.subscribed.join(","),
                    )),
                    None => RespValue::error("ERR no such client"),
                }
            }
            "KILL" => {
                let id = match Self::parse_id(args.get(1)) {
                    Some(id) => id,
                    None => return RespValue::error("ERR invalid client id"),
                };
                match ctx.registry.kill(id, ctx.session_id) {
                    Some(subscribed) => {
                        ctx.broker.drop_session(id, &subscribed);
                        ctx.txn.drop_session(id);
                        RespValue::simple_string("OK")
                    }
                    None => RespValue::error("ERR no such client"),
                }
            }
            _ => RespValue::error("ERR Unknown CLIENT subcommand"),
        }
    }

    fn name(&self) -> &'static str {
        "CLIENT"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// REPLICAOF command - Record a replica target
///
/// Syntax: REPLICAOF host port
///
/// Metadata only: nothing is transmitted to the target. Calling with fewer
/// than two arguments clears the setting.
pub struct ReplicaOfCommand;

impl Command for ReplicaOfCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        if args.len() < 2 {
            ctx.replica_of = None;
            return RespValue::simple_string("REPLICA OFF");
        }

        let host = match extract_text(&args[0]) {
            Ok(h) => h.to_string(),
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };
        let port = match extract_text(&args[1]).ok().and_then(|p| p.parse::<u16>().ok()) {
            Some(port) => port,
            None => return RespValue::error("ERR invalid port"),
        };

        let reply = RespValue::simple_string(format!("REPLICA {}:{}", host, port));
        ctx.replica_of = Some((host, port));
        reply
    }

    fn name(&self) -> &'static str {
        "REPLICAOF"
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// SAVE command - Rewrite the snapshot immediately
///
/// Syntax: SAVE
pub struct SaveCommand;

impl Command for SaveCommand {
    fn execute(&self, ctx: &mut CommandContext, _args: &[RespValue]) -> RespValue {
        ctx.persist();
        RespValue::simple_string("OK")
    }

    fn name(&self) -> &'static str {
        "SAVE"
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Value;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    fn bulk(s: &str) -> RespValue {
        RespValue::bulk_string(s.to_string())
    }

    fn connect(ctx: &CommandContext) -> (u64, mpsc::UnboundedReceiver<RespValue>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ctx
            .registry
            .register("127.0.0.1:50000".to_string(), tx, CancellationToken::new());
        (id, rx)
    }

    fn bulk_text(value: &RespValue) -> String {
        String::from_utf8(value.as_bulk_string().unwrap().to_vec()).unwrap()
    }

    #[test]
    fn test_info_sections() {
        let mut ctx = CommandContext::new();
        ctx.store.set("k", Value::text("v"));
        let (_id, _rx) = connect(&ctx);

        let info = bulk_text(&InfoCommand.execute(&mut ctx, &[]));
        assert!(info.contains("Connected Clients: 1"));
        assert!(info.contains("Keys: 1"));
        assert!(info.contains("ReplicaOf: none"));
    }

    #[test]
    fn test_metrics_counters() {
        let mut ctx = CommandContext::new();
        let (id, _rx) = connect(&ctx);
        ctx.registry.record_command(id);

        let metrics = bulk_text(&MetricsCommand.execute(&mut ctx, &[]));
        assert!(metrics.contains("totalCommands:1"));
        assert!(metrics.contains("connectedClients:1"));
    }

    #[test]
    fn test_client_list_and_info() {
        let mut ctx = CommandContext::new();
        let (id, _rx) = connect(&ctx);

        let result = ClientCommand.execute(&mut ctx, &[bulk("LIST")]);
        let lines = result.as_array().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(bulk_text(&lines[0]).starts_with(&format!("id={} addr=", id)));

        let result = ClientCommand.execute(&mut ctx, &[bulk("INFO"), bulk(&id.to_string())]);
        assert!(bulk_text(&result).contains(&format!("id:{}", id)));

        let result = ClientCommand.execute(&mut ctx, &[bulk("INFO"), bulk("999")]);
        assert_eq!(result, RespValue::error("ERR no such client"));
    }

    #[test]
    fn test_client_kill_cleans_up() {
        let mut ctx = CommandContext::new();
        let (victim, mut rx) = connect(&ctx);
        let (admin, _rx2) = connect(&ctx);

        ctx.session_id = victim;
        ctx.broker.subscribe(victim, "c");
        ctx.registry.mark_subscribed(victim, "c");
        ctx.txn.begin(victim).unwrap();

        ctx.session_id = admin;
        let result = ClientCommand.execute(&mut ctx, &[bulk("KILL"), bulk(&victim.to_string())]);
        assert_eq!(result, RespValue::simple_string("OK"));

        assert_eq!(
            rx.try_recv().unwrap(),
            RespValue::simple_string(format!("KILLED by {}", admin))
        );
        assert!(ctx.registry.describe(victim).is_none());
        assert!(!ctx.txn.is_queuing(victim));
        assert_eq!(ctx.broker.publish("c", "hi", &ctx.registry), 0);
    }

    #[test]
    fn test_unknown_subcommand() {
        let mut ctx = CommandContext::new();
        let result = ClientCommand.execute(&mut ctx, &[bulk("PAUSE")]);
        assert_eq!(result, RespValue::error("ERR Unknown CLIENT subcommand"));
    }

    #[test]
    fn test_replicaof_set_and_clear() {
        let mut ctx = CommandContext::new();
        let result = ReplicaOfCommand.execute(&mut ctx, &[bulk("10.0.0.1"), bulk("6380")]);
        assert_eq!(result, RespValue::simple_string("REPLICA 10.0.0.1:6380"));
        assert_eq!(ctx.replica_of, Some(("10.0.0.1".to_string(), 6380)));

        let result = ReplicaOfCommand.execute(&mut ctx, &[]);
        assert_eq!(result, RespValue::simple_string("REPLICA OFF"));
        assert_eq!(ctx.replica_of, None);
    }
}
