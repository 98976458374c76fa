//! Server module
//!
//! Accepts TCP connections, registers sessions, and owns the background
//! expiry sweep. Command processing is delegated to the dispatcher, which
//! lives behind one async mutex: that lock is what serializes store
//! mutations, transaction batches and sweep passes.

mod connection;

pub use connection::Connection;

use crate::commands::CommandContext;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::fetch::Fetcher;
use crate::persist::{JournalWriter, SnapshotFile};
use crate::protocol::RespValue;
use crate::session::SessionRegistry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Build the engine from its durable state and run the server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let registry = Arc::new(SessionRegistry::new());

    // Recover the snapshot; a missing or corrupt file starts empty
    let snapshot_file = SnapshotFile::new(&config.snapshot_path);
    let store = snapshot_file.load_or_default().restore();

    let mut context = CommandContext::with_store(store, registry.clone());
    context.set_snapshot(snapshot_file);
    match JournalWriter::open(&config.journal_path) {
        Ok(journal) => context.set_journal(Arc::new(journal)),
        Err(e) => warn!("Journal disabled, cannot open {:?}: {}", config.journal_path, e),
    }

    let dispatcher = Arc::new(Mutex::new(Dispatcher::new(context)));
    let fetcher = Arc::new(Fetcher::new(config.fetch_timeout)?);

    // Eager expiry sweep, mutually exclusive with command execution through
    // the dispatcher lock
    let sweeper = dispatcher.clone();
    let sweep_interval = config.sweep_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            sweeper.lock().await.sweep();
        }
    });

    serve(&config.addr(), dispatcher, registry, fetcher).await
}

/// Accept connections and spawn a handler per client
pub async fn serve(
    addr: &str,
    dispatcher: Arc<Mutex<Dispatcher>>,
    registry: Arc<SessionRegistry>,
    fetcher: Arc<Fetcher>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("EmberDB server listening on {}", addr);

    loop {
        let (socket, peer) = listener.accept().await?;
        let dispatcher = dispatcher.clone();
        let registry = registry.clone();
        let fetcher = fetcher.clone();

        tokio::spawn(async move {
            let (reader, writer) = socket.into_split();
            let (outbound, inbox) = mpsc::unbounded_channel();
            let cancel = CancellationToken::new();

            let session_id = registry.register(peer.to_string(), outbound.clone(), cancel.clone());
            info!("Session {} connected from {}", session_id, peer);

            // one writer task per session keeps outgoing frames ordered
            let writer_task = tokio::spawn(connection::write_loop(writer, inbox));

            let _ = outbound.send(RespValue::simple_string(format!(
                "WELCOME ClientID:{}",
                session_id
            )));

            let mut conn = Connection::new(reader, session_id, outbound, cancel);
            if let Err(e) = conn.handle(dispatcher.clone(), fetcher).await {
                error!("Connection error (session {}): {}", session_id, e);
            }

            // teardown: registry entry, channel memberships and any pending
            // transaction go away together
            dispatcher.lock().await.disconnect(session_id);

            // dropping the last sender lets the writer drain queued frames
            // (the kill notice included) before closing the socket
            drop(conn);
            let _ = writer_task.await;
            info!("Session {} disconnected", session_id);
        });
    }
}
