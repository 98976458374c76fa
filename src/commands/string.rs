//! String commands (SET, GET, MGET, MSET)

use super::{extract_text, log_to_journal, Command, CommandContext};
use crate::protocol::RespValue;
use crate::store::Value;
use serde_json::Value as Json;

/// Interpret raw SET input
///
/// Text that looks like a structured document (leading '{' or '[') is parsed
/// and stored as a Json value; anything else, including text that fails to
/// parse, is stored unchanged. This heuristic belongs to the untyped SET
/// family only, the typed commands never coerce.
fn coerce_value(raw: &str) -> Value {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(parsed) = serde_json::from_str::<Json>(raw) {
            return Value::Json(parsed);
        }
    }
    Value::text(raw)
}

/// SET command - Set a key to a value
///
/// Syntax: SET key value
pub struct SetCommand;

impl Command for SetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let key = match extract_text(&args[0]) {
            Ok(k) => k.to_string(),
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };
        let raw = match extract_text(&args[1]) {
            Ok(v) => v,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };

        log_to_journal(ctx, format!("SET {}", key));
        ctx.store.set(key, coerce_value(raw));

        RespValue::simple_string("OK")
    }

    fn name(&self) -> &'static str {
        "SET"
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

/// GET command - Get the value of a key
///
/// Syntax: GET key
///
/// Text values are returned as-is; list, hash and JSON values render as their
/// compact JSON form.
pub struct GetCommand;

impl Command for GetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let key = match extract_text(&args[0]) {
            Ok(k) => k,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };

        match ctx.store.get(key) {
            Some(value) => RespValue::bulk_string(value.to_text()),
            None => RespValue::null(),
        }
    }

    fn name(&self) -> &'static str {
        "GET"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// MGET command - Get the values of several keys at once
///
/// Syntax: MGET key [key ...]
///
/// The reply array carries a null for every missing or expired key.
pub struct MGetCommand;

impl Command for MGetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let mut replies = Vec::with_capacity(args.len());
        for arg in args {
            let key = match extract_text(arg) {
                Ok(k) => k,
                Err(e) => return RespValue::error(format!("ERR {}", e)),
            };
            replies.push(match ctx.store.get(key) {
                Some(value) => RespValue::bulk_string(value.to_text()),
                None => RespValue::null(),
            });
        }
        RespValue::array(replies)
    }

    fn name(&self) -> &'static str {
        "MGET"
    }

    fn min_args(&self) -> usize {
        1
    }
}

/// MSET command - Set several keys in one call
///
/// Syntax: MSET key value [key value ...]
///
/// The argument count is validated before any mutation; each pair then
/// follows SET semantics, including the JSON auto-detection heuristic.
pub struct MSetCommand;

impl Command for MSetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        if args.len() % 2 != 0 {
            return RespValue::error("ERR MSET requires even number of args after command");
        }

        for pair in args.chunks(2) {
            let key = match extract_text(&pair[0]) {
                Ok(k) => k.to_string(),
                Err(e) => return RespValue::error(format!("ERR {}", e)),
            };
            let raw = match extract_text(&pair[1]) {
                Ok(v) => v,
                Err(e) => return RespValue::error(format!("ERR {}", e)),
            };
            log_to_journal(ctx, format!("MSET {}", key));
            ctx.store.set(key, coerce_value(raw));
        }

        RespValue::simple_string("OK")
    }

    fn name(&self) -> &'static str {
        "MSET"
    }

    fn min_args(&self) -> usize {
        2
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
    fn test_set_get() {
        let mut ctx = CommandContext::new();

        let result = SetCommand.execute(&mut ctx, &[bulk("mykey"), bulk("myvalue")]);
        assert_eq!(result, RespValue::simple_string("OK"));

        let result = GetCommand.execute(&mut ctx, &[bulk("mykey")]);
        assert_eq!(result, RespValue::bulk_string(Bytes::from("myvalue")));
    }

    #[test]
    fn test_get_nonexistent() {
        let mut ctx = CommandContext::new();
        let result = GetCommand.execute(&mut ctx, &[bulk("nonexistent")]);
        assert_eq!(result, RespValue::null());
    }

    #[test]
    fn test_set_detects_json() {
        let mut ctx = CommandContext::new();
        SetCommand.execute(&mut ctx, &[bulk("doc"), bulk(r#"{"a": 1}"#)]);
        assert_eq!(ctx.store.get("doc").unwrap().type_name(), "json");

        // invalid JSON falls back to plain text, unchanged
        SetCommand.execute(&mut ctx, &[bulk("broken"), bulk("{oops")]);
        assert_eq!(ctx.store.get("broken").unwrap().as_text(), Some("{oops"));
    }

    #[test]
    fn test_set_clears_expiry() {
        let mut ctx = CommandContext::new();
        SetCommand.execute(&mut ctx, &[bulk("k"), bulk("v1")]);
        ctx.store.expire_in("k", 100);
        SetCommand.execute(&mut ctx, &[bulk("k"), bulk("v2")]);
        assert_eq!(ctx.store.ttl("k"), -1);
    }

    #[test]
    fn test_get_renders_stored_json_compact() {
        let mut ctx = CommandContext::new();
        SetCommand.execute(&mut ctx, &[bulk("doc"), bulk(r#"{ "a": [1, 2] }"#)]);
        let result = GetCommand.execute(&mut ctx, &[bulk("doc")]);
        assert_eq!(result, RespValue::bulk_string(Bytes::from(r#"{"a":[1,2]}"#)));
    }

    #[test]
    fn test_mget_mixes_hits_and_nulls() {
        let mut ctx = CommandContext::new();
        SetCommand.execute(&mut ctx, &[bulk("a"), bulk("1")]);
        let result = MGetCommand.execute(&mut ctx, &[bulk("a"), bulk("missing")]);
        assert_eq!(
            result,
            RespValue::array(vec![
                RespValue::bulk_string(Bytes::from("1")),
                RespValue::null(),
            ])
        );
    }

    #[test]
    fn test_mset_requires_pairs() {
        let mut ctx = CommandContext::new();
        let result = MSetCommand.execute(&mut ctx, &[bulk("a"), bulk("1"), bulk("b")]);
        assert!(result.is_error());
        // validation happens before any mutation
        assert!(!ctx.store.exists("a"));

        let result = MSetCommand.execute(&mut ctx, &[bulk("a"), bulk("1"), bulk("b"), bulk("2")]);
        assert_eq!(result, RespValue::simple_string("OK"));
        assert!(ctx.store.exists("a"));
        assert!(ctx.store.exists("b"));
    }
}
