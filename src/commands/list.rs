//! List commands (LPUSH, RPUSH, LPUSHX, RPUSHX, LRANGE)

use super::{extract_integer, extract_text, log_to_journal, Command, CommandContext};
use crate::protocol::RespValue;
use crate::store::Value;

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

/// Which end of the list a push targets
#[derive(Clone, Copy)]
enum End {
    Left,
    Right,
}

/// Push one value, creating the list when the key is absent
fn push(ctx: &mut CommandContext, args: &[RespValue], end: End, name: &str) -> RespValue {
    let key = match extract_text(&args[0]) {
        Ok(k) => k.to_string(),
        Err(e) => return RespValue::error(format!("ERR {}", e)),
    };
    let item = match extract_text(&args[1]) {
        Ok(v) => v.to_string(),
        Err(e) => return RespValue::error(format!("ERR {}", e)),
    };

    if ctx.store.get(&key).is_none() {
        ctx.store.set(key.clone(), Value::empty_list());
    }
    let list = match ctx.store.get_mut(&key).and_then(|value| value.as_list_mut()) {
        Some(list) => list,
        None => return RespValue::error(WRONGTYPE),
    };

    match end {
        End::Left => list.push_front(item),
        End::Right => list.push_back(item),
    }
    let len = list.len() as i64;
    log_to_journal(ctx, format!("{} {}", name, key));
    RespValue::integer(len)
}

/// Push one value only when the key already holds a list
fn push_if_exists(ctx: &mut CommandContext, args: &[RespValue], end: End, name: &str) -> RespValue {
    let key = match extract_text(&args[0]) {
        Ok(k) => k.to_string(),
        Err(e) => return RespValue::error(format!("ERR {}", e)),
    };
    let item = match extract_text(&args[1]) {
        Ok(v) => v.to_string(),
        Err(e) => return RespValue::error(format!("ERR {}", e)),
    };

    let list = match ctx.store.get_mut(&key).and_then(|value| value.as_list_mut()) {
        Some(list) => list,
        None => return RespValue::integer(0),
    };

    match end {
        End::Left => list.push_front(item),
        End::Right => list.push_back(item),
    }
    let len = list.len() as i64;
    log_to_journal(ctx, format!("{} {}", name, key));
    RespValue::integer(len)
}

/// LPUSH command - Prepend a value to a list
///
/// Syntax: LPUSH key value
pub struct LPushCommand;

impl Command for LPushCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        push(ctx, args, End::Left, "LPUSH")
    }

    fn name(&self) -> &'static str {
        "LPUSH"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn is_write(&self) -> bool {
        true
    }
}

/// RPUSH command - Append a value to a list
///
/// Syntax: RPUSH key value
pub struct RPushCommand;

impl Command for RPushCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        push(ctx, args, End::Right, "RPUSH")
    }

    fn name(&self) -> &'static str {
        "RPUSH"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn is_write(&self) -> bool {
        true
    }
}

/// LPUSHX command - Prepend only when the key already holds a list
///
/// Syntax: LPUSHX key value
pub struct LPushXCommand;

impl Command for LPushXCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        push_if_exists(ctx, args, End::Left, "LPUSHX")
    }

    fn name(&self) -> &'static str {
        "LPUSHX"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn is_write(&self) -> bool {
        true
    }
}

/// RPUSHX command - Append only when the key already holds a list
///
/// Syntax: RPUSHX key value
pub struct RPushXCommand;

impl Command for RPushXCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        push_if_exists(ctx, args, End::Right, "RPUSHX")
    }

    fn name(&self) -> &'static str {
        "RPUSHX"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn is_write(&self) -> bool {
        true
    }
}

/// LRANGE command - Get a range of elements from a list
///
/// Syntax: LRANGE key start stop
///
/// Both bounds are inclusive; negative indices count from the end (-1 is the
/// last element). An absent key yields an empty array.
pub struct LRangeCommand;

impl Command for LRangeCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let key = match extract_text(&args[0]) {
            Ok(k) => k,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };
        let start = match extract_integer(&args[1]) {
            Ok(i) => i,
            Err(_) => return RespValue::error("ERR invalid start or stop"),
        };
        let stop = match extract_integer(&args[2]) {
            Ok(i) => i,
            Err(_) => return RespValue::error("ERR invalid start or stop"),
        };

        let list = match ctx.store.get(key) {
            Some(value) => match value.as_list() {
                Some(list) => list,
                None => return RespValue::error(WRONGTYPE),
            },
            None => return RespValue::array(vec![]),
        };

        let len = list.len() as i64;
        let from = if start < 0 { (len + start).max(0) } else { start };
        let to = if stop < 0 { len + stop } else { stop.min(len - 1) };

        let mut result = Vec::new();
        if from < len && to >= from {
            for i in from..=to {
                if let Some(item) = list.get(i as usize) {
                    result.push(RespValue::bulk_string(item.clone()));
                }
            }
        }
        RespValue::array(result)
    }

    fn name(&self) -> &'static str {
        "LRANGE"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}
