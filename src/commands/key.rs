//! Key commands (DEL, EXISTS, KEYS, FLUSHALL)

use super::{extract_text, log_to_journal, Command, CommandContext};
use crate::protocol::RespValue;

/// DEL command - Delete one or more keys
///
/// Syntax: DEL key [key ...]
///
/// Returns the number of keys actually removed; deleting a key also drops any
/// expiry set on it.
pub struct DelCommand;

impl Command for DelCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let mut removed = 0;
        for arg in args {
            let key = match extract_text(arg) {
                Ok(k) => k,
                Err(e) => return RespValue::error(format!("ERR {}", e)),
            };
            if ctx.store.remove(key) {
                log_to_journal(ctx, format!("DEL {}", key));
                removed += 1;
            }
        }
        RespValue::integer(removed)
    }

    fn name(&self) -> &'static str {
        "DEL"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn is_write(&self) -> bool {
        true
    }
}

/// EXISTS command - Check whether a key exists
///
/// Syntax: EXISTS key
pub struct ExistsCommand;

impl Command for ExistsCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let key = match extract_text(&args[0]) {
            Ok(k) => k,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };
        RespValue::integer(if ctx.store.exists(key) { 1 } else { 0 })
    }

    fn name(&self) -> &'static str {
        "EXISTS"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// KEYS command - Find all keys matching a glob pattern
///
/// Syntax: KEYS pattern
///
/// `*` matches any substring, at any position and any number of times; every
/// other character matches itself. Only non-expired keys are reported.
pub struct KeysCommand;

impl Command for KeysCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let pattern = match extract_text(&args[0]) {
            Ok(p) => p,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };

        let matching: Vec<RespValue> = ctx
            .store
            .keys()
            .into_iter()
            .filter(|key| matches_pattern(key, pattern))
            .map(RespValue::bulk_string)
            .collect();

        RespValue::array(matching)
    }

    fn name(&self) -> &'static str {
        "KEYS"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// FLUSHALL command - Remove every key, every expiry and the fetch cache
///
/// Syntax: FLUSHALL
pub struct FlushAllCommand;

impl Command for FlushAllCommand {
    fn execute(&self, ctx: &mut CommandContext, _args: &[RespValue]) -> RespValue {
        ctx.store.flush_all();
        log_to_journal(ctx, "FLUSHALL".to_string());
        RespValue::simple_string("OK")
    }

    fn name(&self) -> &'static str {
        "FLUSHALL"
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }

    fn is_write(&self) -> bool {
        true
    }
}

/// Check if a key matches a glob pattern where `*` matches any substring
fn matches_pattern(key: &str, pattern: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return key == pattern;
    }

    let mut pos = 0;
    let last = parts.len() - 1;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            if !key.starts_with(part) {
                return false;
            }
            pos = part.len();
        } else if i == last {
            let rest = &key[pos..];
            return rest.len() >= part.len() && rest.ends_with(part);
        } else {
            match key[pos..].find(part) {
                Some(idx) => pos += idx + part.len(),
                None => return false,
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Value;

    fn bulk(s: &str) -> RespValue {
        RespValue::bulk_string(s.to_string())
    }

    #[test]
    fn test_del_counts_only_existing() {
        let mut ctx = CommandContext::new();
        ctx.store.set("a", Value::text("1"));
        ctx.store.set("b", Value::text("2"));

        let result = DelCommand.execute(&mut ctx, &[bulk("a"), bulk("ghost"), bulk("b")]);
        assert_eq!(result, RespValue::integer(2));
        assert!(!ctx.store.exists("a"));

        let result = DelCommand.execute(&mut ctx, &[bulk("a")]);
        assert_eq!(result, RespValue::integer(0));
    }

    #[test]
    fn test_exists() {
        let mut ctx = CommandContext::new();
        ctx.store.set("a", Value::text("1"));
        assert_eq!(
            ExistsCommand.execute(&mut ctx, &[bulk("a")]),
            RespValue::integer(1)
        );
        assert_eq!(
            ExistsCommand.execute(&mut ctx, &[bulk("b")]),
            RespValue::integer(0)
        );
    }

    #[test]
    fn test_keys_prefix_glob() {
        let mut ctx = CommandContext::new();
        ctx.store.set("a1", Value::text("1"));
        ctx.store.set("a2", Value::text("2"));
        ctx.store.set("b1", Value::text("3"));

        let result = KeysCommand.execute(&mut ctx, &[bulk("a*")]);
        let mut keys: Vec<String> = result
            .as_array()
            .unwrap()
            .iter()
            .map(|v| String::from_utf8(v.as_bulk_string().unwrap().to_vec()).unwrap())
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["a1", "a2"]);
    }

    #[test]
    fn test_flushall_clears_everything() {
        let mut ctx = CommandContext::new();
        ctx.store.set("a", Value::text("1"));
        ctx.store.cache_put("http://x", "body".to_string(), None);

        let result = FlushAllCommand.execute(&mut ctx, &[]);
        assert_eq!(result, RespValue::simple_string("OK"));
        assert!(ctx.store.is_empty());
        assert!(ctx.store.cache_get("http://x").is_none());
    }

    #[test]
    fn test_pattern_matching() {
        assert!(matches_pattern("anything", "*"));
        assert!(matches_pattern("user:1", "user:*"));
        assert!(!matches_pattern("session:1", "user:*"));
        assert!(matches_pattern("data:cache", "*:cache"));
        assert!(matches_pattern("user_admin_role", "*admin*"));
        assert!(matches_pattern("a-middle-b", "a*middle*b"));
        assert!(!matches_pattern("a-b", "a*middle*b"));
        assert!(matches_pattern("exact", "exact"));
        assert!(!matches_pattern("exactly", "exact"));
        assert!(matches_pattern("ab", "a*b"));
        assert!(!matches_pattern("a", "a*b"));
    }
}
