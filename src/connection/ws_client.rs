//! Outbound WebSocket client (tokio-tungstenite).
//!
//! One socket carries any number of concurrent calls. Each call gets a fresh
//! envelope id and waits for the reply with that id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::{self, Message};

use super::envelope::{CommandEnvelope, ReplyEnvelope};
use super::{Client, RemoteCall};
use crate::command::Session;
use crate::error::{CommandError, HttpCode};

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<ReplyEnvelope>>>>;

/// Forwards calls to a remote server as WebSocket envelopes.
///
/// The session of the upgrade request applies to every call on the socket;
/// per-call sessions are not forwarded. Once the socket closes, outstanding
/// and new calls fail with `Unavailable`.
#[derive(Debug)]
pub struct WsClient {
    outgoing: mpsc::UnboundedSender<String>,
    pending: Pending,
    closed: Arc<AtomicBool>,
    next_id: AtomicU64,
    tasks: [JoinHandle<()>; 2],
}

impl WsClient {
    pub async fn connect(url: &str) -> Result<Self, tungstenite::Error> {
        Self::connect_with_session(url, &Session::new()).await
    }

    /// Connect, sending the forwardable session variables as upgrade headers.
    pub async fn connect_with_session(url: &str, session: &Session) -> Result<Self, tungstenite::Error> {
        let mut request = url.into_client_request()?;
        for (key, value) in session.forwardable() {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                request.headers_mut().insert(name, value);
            }
        }

        let (stream, _) = connect_async(request).await?;
        let (mut sink, mut source) = stream.split();
        tracing::debug!(url, "websocket client connected");

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));

        let (outgoing, mut queue) = mpsc::unbounded_channel::<String>();
        let (writer_pending, writer_closed) = (pending.clone(), closed.clone());
        let writer = tokio::spawn(async move {
            while let Some(text) = queue.recv().await {
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            shut(&writer_closed, &writer_pending);
            let _ = sink.close().await;
        });

        let (waiting, reader_closed) = (pending.clone(), closed.clone());
        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) | Err(_) => break,
                    Ok(_) => continue,
                };
                let reply: ReplyEnvelope = match serde_json::from_str(&text) {
                    Ok(reply) => reply,
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping malformed reply frame");
                        continue;
                    }
                };
                let waiter = lock(&waiting).remove(&reply.id);
                if let Some(waiter) = waiter {
                    let _ = waiter.send(reply);
                }
            }
            shut(&reader_closed, &waiting);
            tracing::debug!("websocket client disconnected");
        });

        Ok(Self {
            outgoing,
            pending,
            closed,
            next_id: AtomicU64::new(1),
            tasks: [writer, reader],
        })
    }

    /// Whether the socket has been closed by either side.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Send one envelope and wait for its reply.
    pub async fn call(&self, command: &str, data: Value) -> Result<Value, CommandError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = CommandEnvelope {
            id,
            command: command.to_string(),
            data,
        };
        let text = serde_json::to_string(&envelope)?;

        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id, tx);

        // Checked after registering: `shut` sets the flag before draining, so
        // either the drain drops our sender or we see the flag here.
        if self.is_closed() || self.outgoing.send(text).is_err() {
            lock(&self.pending).remove(&id);
            return Err(closed());
        }

        match rx.await {
            Ok(reply) => reply.into_result(),
            Err(_) => Err(closed()),
        }
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[async_trait]
impl Client for WsClient {
    async fn dispatch(&self, call: RemoteCall<'_>) -> Result<Value, CommandError> {
        self.call(call.name, call.data.clone()).await
    }
}

fn lock(
    pending: &Mutex<HashMap<u64, oneshot::Sender<ReplyEnvelope>>>,
) -> std::sync::MutexGuard<'_, HashMap<u64, oneshot::Sender<ReplyEnvelope>>> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mark the connection closed, then drop every waiting sender so
/// outstanding calls fail.
fn shut(closed: &AtomicBool, pending: &Mutex<HashMap<u64, oneshot::Sender<ReplyEnvelope>>>) {
    closed.store(true, Ordering::SeqCst);
    lock(pending).clear();
}

fn closed() -> CommandError {
    CommandError::new(HttpCode::Unavailable, "websocket connection closed")
}
