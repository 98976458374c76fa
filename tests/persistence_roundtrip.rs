//! Persistence integration tests: snapshot round trips through the full
//! dispatch path, recovery from corrupt files, and journal output.

use emberdb::commands::CommandContext;
use emberdb::dispatch::{Dispatched, Dispatcher};
use emberdb::persist::{JournalWriter, SnapshotFile};
use emberdb::protocol::RespValue;
use std::path::Path;
use std::sync::Arc;

fn command(parts: &[&str]) -> RespValue {
    RespValue::Array(
        parts
            .iter()
            .map(|p| RespValue::bulk_string(p.to_string()))
            .collect(),
    )
}

fn reply_of(dispatched: Dispatched) -> RespValue {
    match dispatched {
        Dispatched::Reply(reply) => reply,
        other => panic!("expected a single reply, got {:?}", other),
    }
}

fn dispatcher_with_snapshot(path: &Path) -> Dispatcher {
    let snapshot_file = SnapshotFile::new(path);
    let store = snapshot_file.load_or_default().restore();
    let registry = Arc::new(emberdb::SessionRegistry::new());
    let mut context = CommandContext::with_store(store, registry);
    context.set_snapshot(snapshot_file);
    Dispatcher::new(context)
}

#[test]
fn snapshot_round_trip_reproduces_observable_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");

    {
        let mut engine = dispatcher_with_snapshot(&path);
        engine.dispatch(1, command(&["SET", "name", "Alice"]));
        engine.dispatch(1, command(&["SET", "doc", r#"{"kind": "auto"}"#]));
        engine.dispatch(1, command(&["RPUSH", "items", "a"]));
        engine.dispatch(1, command(&["RPUSH", "items", "b"]));
        engine.dispatch(1, command(&["HSET", "user:1", "name", "Bob"]));
        engine.dispatch(1, command(&["JSONSET", "typed", r#"{"n": 1}"#]));
        engine.dispatch(1, command(&["EXPIRE", "name", "600"]));
    }

    // a fresh engine built from the same file sees the same data
    let mut engine = dispatcher_with_snapshot(&path);

    assert_eq!(
        reply_of(engine.dispatch(2, command(&["GET", "name"]))),
        RespValue::bulk_string("Alice".to_string())
    );
    assert_eq!(
        reply_of(engine.dispatch(2, command(&["GET", "doc"]))),
        RespValue::bulk_string(r#"{"kind":"auto"}"#.to_string())
    );
    assert_eq!(
        reply_of(engine.dispatch(2, command(&["LRANGE", "items", "0", "-1"]))),
        RespValue::array(vec![
            RespValue::bulk_string("a".to_string()),
            RespValue::bulk_string("b".to_string()),
        ])
    );
    assert_eq!(
        reply_of(engine.dispatch(2, command(&["HGET", "user:1", "name"]))),
        RespValue::bulk_string("Bob".to_string())
    );
    assert_eq!(
        reply_of(engine.dispatch(2, command(&["JSONGET", "typed"]))),
        RespValue::bulk_string(r#"{"n":1}"#.to_string())
    );

    // the expiry deadline survived the restart
    let ttl = reply_of(engine.dispatch(2, command(&["TTL", "name"])));
    match ttl {
        RespValue::Integer(secs) => assert!(secs > 0 && secs <= 600),
        other => panic!("expected an integer TTL, got {:?}", other),
    }
}

#[test]
fn hash_and_json_object_stay_distinct_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");

    {
        let mut engine = dispatcher_with_snapshot(&path);
        engine.dispatch(1, command(&["HSET", "asmap", "f", "v"]));
        engine.dispatch(1, command(&["JSONSET", "asdoc", r#"{"f": "v"}"#]));
    }

    let mut engine = dispatcher_with_snapshot(&path);

    // the mapping still answers hash reads, the document does not
    assert_eq!(
        reply_of(engine.dispatch(2, command(&["HGET", "asmap", "f"]))),
        RespValue::bulk_string("v".to_string())
    );
    assert_eq!(
        reply_of(engine.dispatch(2, command(&["HGETALL", "asdoc"]))),
        RespValue::array(vec![])
    );
}

#[test]
fn corrupt_snapshot_starts_empty_without_failing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    std::fs::write(&path, b"}}} definitely not json").unwrap();

    let mut engine = dispatcher_with_snapshot(&path);
    assert_eq!(
        reply_of(engine.dispatch(1, command(&["GET", "anything"]))),
        RespValue::null()
    );

    // the engine overwrites the corrupt file on the next mutation
    engine.dispatch(1, command(&["SET", "fresh", "start"]));
    let reloaded = SnapshotFile::new(&path).load_or_default();
    assert_eq!(reloaded.store.len(), 1);
}

#[test]
fn fetch_cache_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");

    {
        let mut engine = dispatcher_with_snapshot(&path);
        let request = match engine.dispatch(1, command(&["FETCHCACHE", "http://example.com/a", "300"]))
        {
            Dispatched::Fetch(request) => request,
            other => panic!("expected a deferred fetch, got {:?}", other),
        };
        engine.complete_fetch(&request, "cached-body".to_string());
    }

    // after a restart the entry is served without any outbound request
    let mut engine = dispatcher_with_snapshot(&path);
    assert_eq!(
        reply_of(engine.dispatch(2, command(&["FETCH", "http://example.com/a"]))),
        RespValue::bulk_string("cached-body".to_string())
    );
}

#[test]
fn journal_records_mutations_with_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot_path = dir.path().join("data.json");
    let journal_path = dir.path().join("journal.log");

    let mut engine = dispatcher_with_snapshot(&snapshot_path);
    engine
        .context_mut()
        .set_journal(Arc::new(JournalWriter::open(&journal_path).unwrap()));

    engine.dispatch(1, command(&["SET", "k", "v"]));
    engine.dispatch(1, command(&["DEL", "k"]));
    // reads are not journaled
    engine.dispatch(1, command(&["GET", "k"]));

    let content = std::fs::read_to_string(&journal_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("SET k"));
    assert!(lines[1].ends_with("DEL k"));
}
