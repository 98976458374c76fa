//! JSON document commands (JSONSET, JSONGET, JSONUPDATE)

use super::{extract_text, log_to_journal, Command, CommandContext};
use crate::protocol::RespValue;
use crate::store::Value;
use serde_json::{Map, Value as Json};

/// JSONSET command - Store a key as a structured document
///
/// Syntax: JSONSET key json
///
/// Unlike SET, the input must parse; invalid documents are rejected before
/// any mutation.
pub struct JsonSetCommand;

impl Command for JsonSetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let key = match extract_text(&args[0]) {
            Ok(k) => k.to_string(),
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };
        let raw = match extract_text(&args[1]) {
            Ok(v) => v,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };

        let doc = match serde_json::from_str::<Json>(raw) {
            Ok(doc) => doc,
            Err(_) => return RespValue::error("ERR invalid JSON"),
        };

        log_to_journal(ctx, format!("JSON.SET {}", key));
        ctx.store.set(key, Value::Json(doc));
        RespValue::simple_string("OK")
    }

    fn name(&self) -> &'static str {
        "JSONSET"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["JSON.SET"]
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

/// JSONGET command - Read a key as a structured document
///
/// Syntax: JSONGET key
///
/// Every variant renders as its JSON encoding, so a Text value comes back
/// quoted and a list comes back as an array.
pub struct JsonGetCommand;

impl Command for JsonGetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let key = match extract_text(&args[0]) {
            Ok(k) => k,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };

        match ctx.store.get(key) {
            Some(value) => RespValue::bulk_string(value.to_json().to_string()),
            None => RespValue::null(),
        }
    }

    fn name(&self) -> &'static str {
        "JSONGET"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["JSON.GET"]
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// JSONUPDATE command - Shallow-merge a patch into a document
///
/// Syntax: JSONUPDATE key path patch
///
/// An empty path (also "." or "$") merges at the top level. A dotted path
/// walks into the document, creating intermediate objects as needed, and
/// merges the patch at the final segment. A key that does not currently hold
/// a JSON object is replaced with an empty one first.
pub struct JsonUpdateCommand;

impl Command for JsonUpdateCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[RespValue]) -> RespValue {
        let key = match extract_text(&args[0]) {
            Ok(k) => k.to_string(),
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };
        let path = match extract_text(&args[1]) {
            Ok(p) => p,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };
        let raw_patch = match extract_text(&args[2]) {
            Ok(p) => p,
            Err(e) => return RespValue::error(format!("ERR {}", e)),
        };

        let patch = match serde_json::from_str::<Json>(raw_patch) {
            Ok(Json::Object(fields)) => fields,
            _ => return RespValue::error("ERR invalid JSON patch"),
        };

        let holds_object = matches!(ctx.store.get(&key), Some(Value::Json(Json::Object(_))));
        if !holds_object {
            ctx.store.set(key.clone(), Value::Json(Json::Object(Map::new())));
        }

        if let Some(Value::Json(Json::Object(root))) = ctx.store.get_mut(&key) {
            merge_at_path(root, path, patch);
        }

        log_to_journal(ctx, format!("JSON.UPDATE {} {}", key, path));
        RespValue::simple_string("OK")
    }

    fn name(&self) -> &'static str {
        "JSONUPDATE"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["JSON.UPDATE"]
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

/// Walk `path` inside `root` and shallow-merge `patch` at its final segment
fn merge_at_path(root: &mut Map<String, Json>, path: &str, patch: Map<String, Json>) {
    let path = path.strip_prefix('$').unwrap_or(path);
    let path = path.strip_prefix('.').unwrap_or(path);

    if path.is_empty() || path == "." {
        for (field, value) in patch {
            root.insert(field, value);
        }
        return;
    }

    let segments: Vec<&str> = path.split('.').collect();
    let mut current = root;
    for segment in &segments[..segments.len() - 1] {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Json::Object(Map::new()));
        if !slot.is_object() {
            *slot = Json::Object(Map::new());
        }
        current = match slot.as_object_mut() {
            Some(obj) => obj,
            None => return,
        };
    }

    let last = segments[segments.len() - 1];
    match current.get_mut(last).and_then(Json::as_object_mut) {
        Some(target) => {
            for (field, value) in patch {
                target.insert(field, value);
            }
        }
        None => {
            current.insert(last.to_string(), Json::Object(patch));
        }
    }
}
