//! TTL commands (EXPIRE, TTL)

use super::{extract_text, Command, CommandContext};
use crate::protocol::RespValue;

/// EXPIRE command - Set a timeout on a key
///
/// Syntax: EXPIRE key seconds
///
/// Returns 0 without creating anything when the key does not exist.
pub struct ExpireCommand;

impl Command for ExpireCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let key = match extract_text(&args[0]) {
            Ok(k) => k,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };
        let seconds = match extract_text(&args[1]).ok().and_then(|s| s.parse::<u64>().ok()) {
            Some(secs) => secs,
            None => return RespValue::error("ERR value is not an integer or out of range"),
        };

        if ctx.store.expire_in(key, seconds) {
            RespValue::integer(1)
        } else {
            RespValue::integer(0)
        }
    }

    fn name(&self) -> &'static str {
        "EXPIRE"
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

/// TTL command - Get the time to live for a key
///
/// Syntax: TTL key
///
/// Returns:
/// - the remaining TTL in seconds
/// - -1 if no expiry is set on the key
/// - -2 if the deadline has already passed
pub struct TtlCommand;

impl Command for TtlCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let key = match extract_text(&args[0]) {
            Ok(k) => k,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };
        RespValue::integer(ctx.store.ttl(key))
    }

    fn name(&self) -> &'static str {
        "TTL"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Value;

    fn bulk(s: &str) -> RespValue {
        RespValue::bulk_string(s.to_string())
    }

    #[test]
    fn test_expire_then_ttl() {
        let mut ctx = CommandContext::new();
        ctx.store.set("key1", Value::text("v"));

        let result = ExpireCommand.execute(&mut ctx, &[bulk("key1"), bulk("100")]);
        assert_eq!(result, RespValue::integer(1));

        let result = TtlCommand.execute(&mut ctx, &[bulk("key1")]);
        if let RespValue::Integer(ttl) = result {
            assert!(ttl >= 99 && ttl <= 100);
        } else {
            panic!("Expected integer response");
        }
    }

    #[test]
    fn test_expire_missing_key_returns_zero() {
        let mut ctx = CommandContext::new();
        let result = ExpireCommand.execute(&mut ctx, &[bulk("ghost"), bulk("10")]);
        assert_eq!(result, RespValue::integer(0));
        assert!(!ctx.store.exists("ghost"));
    }

    #[test]
    fn test_expire_rejects_bad_seconds() {
        let mut ctx = CommandContext::new();
        ctx.store.set("key1", Value::text("v"));
        let result = ExpireCommand.execute(&mut ctx, &[bulk("key1"), bulk("soon")]);
        assert!(result.is_error());
    }

    #[test]
    fn test_ttl_without_expiry() {
        let mut ctx = CommandContext::new();
        ctx.store.set("key1", Value::text("v"));
        assert_eq!(
            TtlCommand.execute(&mut ctx, &[bulk("key1")]),
            RespValue::integer(-1)
        );
        assert_eq!(
            TtlCommand.execute(&mut ctx, &[bulk("missing")]),
            RespValue::integer(-1)
        );
    }
}
