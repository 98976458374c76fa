//! Connection handling
//!
//! Each client connection runs two tasks: this read loop, which parses RESP
//! commands and drives the dispatcher, and a writer task that drains the
//! session's outbound channel. Funneling every frame (replies, pub/sub
//! messages, the kill notice) through that single channel keeps the byte
//! stream free of interleaved frames.

use crate::dispatch::{Dispatched, Dispatcher};
use crate::fetch::Fetcher;
use crate::protocol::{RespEncoder, RespParser, RespValue};
use bytes::BytesMut;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Read half of a client connection
pub struct Connection {
    /// Incoming byte stream
    reader: OwnedReadHalf,

    /// Read buffer
    buffer: BytesMut,

    /// Session this connection belongs to
    session_id: u64,

    /// Channel into the session's writer task
    outbound: UnboundedSender<RespValue>,

    /// Cancelled when the session is killed or the server stops
    cancel: CancellationToken,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(
        reader: OwnedReadHalf,
        session_id: u64,
        outbound: UnboundedSender<RespValue>,
        cancel: CancellationToken,
    ) -> Self {
        Connection {
            reader,
            buffer: BytesMut::with_capacity(4096),
            session_id,
            outbound,
            cancel,
        }
    }

    /// Handle the connection
    ///
    /// Reads commands from the client, dispatches them, and queues responses.
    /// Returns when the client disconnects or the session is cancelled.
    pub async fn handle(
        &mut self,
        dispatcher: Arc<Mutex<Dispatcher>>,
        fetcher: Arc<Fetcher>,
    ) -> anyhow::Result<()> {
        loop {
            let n = tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                read = self.reader.read_buf(&mut self.buffer) => read?,
            };

            // Connection closed
            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(());
                }
                anyhow::bail!("connection reset by peer");
            }

            debug!("Read {} bytes (session {})", n, self.session_id);

            // Drain every complete command from the buffer
            loop {
                match RespParser::parse(&mut self.buffer) {
                    Ok(Some(command)) => {
                        self.process(&dispatcher, &fetcher, command).await;
                    }
                    Ok(None) => break,
                    Err(e) => {
                        // Protocol error: report it and drop the rest of the
                        // buffer, the stream is desynchronized
                        warn!("Protocol error (session {}): {}", self.session_id, e);
                        self.send(RespValue::error(format!("ERR protocol error: {}", e)));
                        self.buffer.clear();
                        break;
                    }
                }
            }
        }
    }

    /// Dispatch one decoded command and queue its replies
    async fn process(
        &mut self,
        dispatcher: &Arc<Mutex<Dispatcher>>,
        fetcher: &Arc<Fetcher>,
        command: RespValue,
    ) {
        let outcome = {
            let mut engine = dispatcher.lock().await;
            engine.dispatch(self.session_id, command)
        };

        match outcome {
            Dispatched::Reply(reply) => self.send(reply),
            Dispatched::Batch(replies) => {
                for reply in replies {
                    self.send(reply);
                }
            }
            Dispatched::Fetch(request) => {
                // the engine lock is released across the outbound request, so
                // other sessions keep executing while this one waits
                let reply = match fetcher.fetch(&request.url).await {
                    Ok(payload) => dispatcher.lock().await.complete_fetch(&request, payload),
                    Err(e) => RespValue::error(format!("ERR {}", e)),
                };
                self.send(reply);
            }
        }
    }

    /// Queue one frame for the writer task; failures mean the writer is gone
    /// and the read loop will notice the closed socket on its own
    fn send(&self, reply: RespValue) {
        let _ = self.outbound.send(reply);
    }
}

/// Drain a session's outbound channel into its socket
///
/// Ends when the channel closes (session unregistered or killed), shutting
/// the write half down so the peer sees EOF.
pub async fn write_loop(mut writer: OwnedWriteHalf, mut outbound: UnboundedReceiver<RespValue>) {
    let mut buffer = BytesMut::with_capacity(4096);
    while let Some(reply) = outbound.recv().await {
        buffer.clear();
        RespEncoder::encode_to(&mut buffer, &reply);
        if writer.write_all(&buffer).await.is_err() {
            break;
        }
        if writer.flush().await.is_err() {
            break;
        }
    }
    let _ = writer.shutdown().await;
}
