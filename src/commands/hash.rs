//! Hash commands (HSET, HGET, HGETALL, HDEL)

use super::{extract_text, log_to_journal, Command, CommandContext};
use crate::protocol::RespValue;
use crate::store::Value;
use serde_json::Value as Json;

/// Render one hash field value as plain text
fn field_text(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// HSET command - Set a field inside a hash
///
/// Syntax: HSET key field value
///
/// When the key holds anything that is not a mapping, the whole key is
/// replaced with an empty mapping first.
pub struct HSetCommand;

impl Command for HSetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let key = match extract_text(&args[0]) {
            Ok(k) => k.to_string(),
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };
        let field = match extract_text(&args[1]) {
            Ok(f) => f.to_string(),
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };
        let value = match extract_text(&args[2]) {
            Ok(v) => v.to_string(),
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };

        let is_hash = ctx.store.get(&key).map(Value::is_hash).unwrap_or(false);
        if !is_hash {
            ctx.store.set(key.clone(), Value::empty_hash());
        }
        if let Some(hash) = ctx.store.get_mut(&key).and_then(Value::as_hash_mut) {
            hash.insert(field.clone(), Json::String(value));
        }

        log_to_journal(ctx, format!("HSET {} {}", key, field));
        RespValue::integer(1)
    }

    fn name(&self) -> &'static str {
        "HSET"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }

    fn is_write(&self) -> bool {
        true
    }
}

/// HGET command - Get one field of a hash
///
/// Syntax: HGET key field
///
/// Null when the key is absent, holds no mapping, or lacks the field.
pub struct HGetCommand;

impl Command for HGetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let key = match extract_text(&args[0]) {
            Ok(k) => k,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };
        let field = match extract_text(&args[1]) {
            Ok(f) => f,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };

        match ctx
            .store
            .get(key)
            .and_then(Value::as_hash)
            .and_then(|hash| hash.get(field))
        {
            Some(value) => RespValue::bulk_string(field_text(value)),
            None => RespValue::null(),
        }
    }

    fn name(&self) -> &'static str {
        "HGET"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// HGETALL command - Get every field and value of a hash
///
/// Syntax: HGETALL key
///
/// Replies with a flat field/value sequence in insertion order; an absent key
/// or a non-mapping value yields an empty array.
pub struct HGetAllCommand;

impl Command for HGetAllCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let key = match extract_text(&args[0]) {
            Ok(k) => k,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };

        let hash = match ctx.store.get(key).and_then(Value::as_hash) {
            Some(hash) => hash,
            None => return RespValue::array(vec![]),
        };

        let mut pairs = Vec::with_capacity(hash.len() * 2);
        for (field, value) in hash {
            pairs.push(RespValue::bulk_string(field.clone()));
            pairs.push(RespValue::bulk_string(field_text(value)));
        }
        RespValue::array(pairs)
    }

    fn name(&self) -> &'static str {
        "HGETALL"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// HDEL command - Remove one field from a hash
///
/// Syntax: HDEL key field
pub struct HDelCommand;

impl Command for HDelCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let key = match extract_text(&args[0]) {
            Ok(k) => k.to_string(),
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };
        let field = match extract_text(&args[1]) {
            Ok(f) => f.to_string(),
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };

        let removed = ctx
            .store
            .get_mut(&key)
            .and_then(Value::as_hash_mut)
            .map(|hash| hash.remove(&field).is_some())
            .unwrap_or(false);

        if removed {
            log_to_journal(ctx, format!("HDEL {} {}", key, field));
            RespValue::integer(1)
        } else {
            RespValue::integer(0)
        }
    }

    fn name(&self) -> &'static str {
        "HDEL"
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

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn bulk(s: &str) -> RespValue {
        RespValue::bulk_string(s.to_string())
    }

    #[test]
    fn test_hset_hget() {
        let mut ctx = CommandContext::new();
        let result = HSetCommand.execute(&mut ctx, &[bulk("user:1"), bulk("name"), bulk("Alice")]);
        assert_eq!(result, RespValue::integer(1));

        let result = HGetCommand.execute(&mut ctx, &[bulk("user:1"), bulk("name")]);
        assert_eq!(result, RespValue::bulk_string(Bytes::from("Alice")));
    }

    #[test]
    fn test_hget_missing_paths() {
        let mut ctx = CommandContext::new();
        assert_eq!(
            HGetCommand.execute(&mut ctx, &[bulk("ghost"), bulk("f")]),
            RespValue::null()
        );

        HSetCommand.execute(&mut ctx, &[bulk("user:1"), bulk("name"), bulk("Alice")]);
        assert_eq!(
            HGetCommand.execute(&mut ctx, &[bulk("user:1"), bulk("email")]),
            RespValue::null()
        );

        // non-mapping key reads as absent
        ctx.store.set("t", Value::text("plain"));
        assert_eq!(
            HGetCommand.execute(&mut ctx, &[bulk("t"), bulk("f")]),
            RespValue::null()
        );
    }

    #[test]
    fn test_hset_replaces_non_mapping() {
        let mut ctx = CommandContext::new();
        ctx.store.set("k", Value::text("plain"));
        HSetCommand.execute(&mut ctx, &[bulk("k"), bulk("f"), bulk("v")]);
        assert!(ctx.store.get("k").unwrap().is_hash());
        assert_eq!(
            HGetCommand.execute(&mut ctx, &[bulk("k"), bulk("f")]),
            RespValue::bulk_string(Bytes::from("v"))
        );
    }

    #[test]
    fn test_hgetall_insertion_order() {
        let mut ctx = CommandContext::new();
        HSetCommand.execute(&mut ctx, &[bulk("h"), bulk("zeta"), bulk("1")]);
        HSetCommand.execute(&mut ctx, &[bulk("h"), bulk("alpha"), bulk("2")]);

        let result = HGetAllCommand.execute(&mut ctx, &[bulk("h")]);
        assert_eq!(
            result,
            RespValue::array(vec![
                RespValue::bulk_string(Bytes::from("zeta")),
                RespValue::bulk_string(Bytes::from("1")),
                RespValue::bulk_string(Bytes::from("alpha")),
                RespValue::bulk_string(Bytes::from("2")),
            ])
        );
    }

    #[test]
    fn test_hgetall_absent_or_wrong_type() {
        let mut ctx = CommandContext::new();
        assert_eq!(
            HGetAllCommand.execute(&mut ctx, &[bulk("ghost")]),
            RespValue::array(vec![])
        );
        ctx.store.set("t", Value::text("plain"));
        assert_eq!(
            HGetAllCommand.execute(&mut ctx, &[bulk("t")]),
            RespValue::array(vec![])
        );
    }

    #[test]
    fn test_hdel() {
        let mut ctx = CommandContext::new();
        HSetCommand.execute(&mut ctx, &[bulk("h"), bulk("f"), bulk("v")]);

        assert_eq!(
            HDelCommand.execute(&mut ctx, &[bulk("h"), bulk("f")]),
            RespValue::integer(1)
        );
        assert_eq!(
            HDelCommand.execute(&mut ctx, &[bulk("h"), bulk("f")]),
            RespValue::integer(0)
        );
        assert_eq!(
            HDelCommand.execute(&mut ctx, &[bulk("ghost"), bulk("f")]),
            RespValue::integer(0)
        );
    }
}
