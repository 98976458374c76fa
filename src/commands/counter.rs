//! Counter commands (INCR, DECR)

use super::{extract_text, log_to_journal, Command, CommandContext};
use crate::protocol::RespValue;
use crate::store::Value;

/// Apply a delta to the integer stored at `key`
///
/// The current Text value is parsed as an integer, defaulting to 0 when the
/// key is missing or holds something unparsable; the new value is stored back
/// as Text. Mutating in place keeps any expiry on the key.
fn apply_delta(ctx: &mut CommandContext, key: &str, delta: i64) -> i64 {
    let current = ctx
        .store
        .get(key)
        .and_then(|value| value.as_text())
        .and_then(|text| text.trim().parse::<i64>().ok())
        .unwrap_or(0);
    let updated = current.saturating_add(delta);

    match ctx.store.get_mut(key) {
        Some(value) => *value = Value::text(updated.to_string()),
        None => ctx.store.set(key, Value::text(updated.to_string())),
    }
    updated
}

/// INCR command - Increment the integer value of a key by one
///
/// Syntax: INCR key
pub struct IncrCommand;

impl Command for IncrCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let key = match extract_text(&args[0]) {
            Ok(k) => k.to_string(),
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };
        let updated = apply_delta(ctx, &key, 1);
        log_to_journal(ctx, format!("INCR {}", key));
        RespValue::integer(updated)
    }

    fn name(&self) -> &'static str {
        "INCR"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }

    fn is_write(&self) -> bool {
        true
    }
}

/// DECR command - Decrement the integer value of a key by one
///
/// Syntax: DECR key
pub struct DecrCommand;

impl Command for DecrCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let key = match extract_text(&args[0]) {
            Ok(k) => k.to_string(),
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };
        let updated = apply_delta(ctx, &key, -1);
        log_to_journal(ctx, format!("DECR {}", key));
        RespValue::integer(updated)
    }

    fn name(&self) -> &'static str {
        "DECR"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }

    fn is_write(&self) -> bool {
        true
    }
}
