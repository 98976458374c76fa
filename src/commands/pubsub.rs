//! Pub/sub commands (SUBSCRIBE, UNSUBSCRIBE, PUBLISH)

use super::{extract_text, log_to_journal, Command, CommandContext};
use crate::protocol::RespValue;

/// SUBSCRIBE command - Join a channel
///
/// Syntax: SUBSCRIBE channel
///
/// Idempotent: subscribing twice leaves a single membership. The channel is
/// recorded on both the broker and the session, so disconnect cleanup can
/// walk the session's own list.
pub struct SubscribeCommand;

impl Command for SubscribeCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let channel = match extract_text(&args[0]) {
            Ok(c) => c,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };

        ctx.broker.subscribe(ctx.session_id, channel);
        ctx.registry.mark_subscribed(ctx.session_id, channel);
        RespValue::simple_string(format!("Subscribed to {}", channel))
    }

    fn name(&self) -> &'static str {
        "SUBSCRIBE"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// UNSUBSCRIBE command - Leave a channel
///
/// Syntax: UNSUBSCRIBE channel
pub struct UnsubscribeCommand;

impl Command for UnsubscribeCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let channel = match extract_text(&args[0]) {
            Ok(c) => c,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };

        ctx.broker.unsubscribe(ctx.session_id, channel);
        ctx.registry.mark_unsubscribed(ctx.session_id, channel);
        RespValue::simple_string(format!("Unsubscribed from {}", channel))
    }

    fn name(&self) -> &'static str {
        "UNSUBSCRIBE"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// PUBLISH command - Deliver a message to a channel's live subscribers
///
/// Syntax: PUBLISH channel message
///
/// Returns the number of sessions the message was actually sent to.
pub struct PublishCommand;

impl Command for PublishCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let channel = match extract_text(&args[0]) {
            Ok(c) => c,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };
        let message = match extract_text(&args[1]) {
            Ok(m) => m,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };

        let delivered = ctx.broker.publish(channel, message, &ctx.registry);
        log_to_journal(ctx, format!("PUBLISH {}", channel));
        RespValue::integer(delivered as i64)
    }

    fn name(&self) -> &'static str {
        "PUBLISH"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}
