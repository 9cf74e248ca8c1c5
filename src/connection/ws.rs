//! WebSocket command endpoint.
//!
//! Each text frame carries a [`CommandEnvelope`]; each is answered with a
//! [`ReplyEnvelope`] bearing the same id. Frames on one socket are handled in
//! order. The upgrade request's headers become the session of every call on
//! the socket.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;

use super::envelope::CommandEnvelope;
use super::http::session_from_headers;
use super::server::ServerRouter;
use crate::command::Session;

pub(crate) async fn ws_handler(
    State(router): State<ServerRouter>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let session = session_from_headers(&headers);
    ws.on_upgrade(move |socket| serve_socket(router, socket, session))
}

async fn serve_socket(router: ServerRouter, mut socket: WebSocket, session: Session) {
    tracing::debug!("websocket connected");

    while let Some(frame) = socket.recv().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(error = %e, "websocket receive failed");
                break;
            }
        };

        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let envelope: CommandEnvelope = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed command frame");
                continue;
            }
        };

        let reply = router.handle_envelope(envelope, session.clone()).await;
        let reply = match serde_json::to_string(&reply) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode reply");
                continue;
            }
        };
        if socket.send(Message::Text(reply)).await.is_err() {
            break;
        }
    }

    tracing::debug!("websocket closed");
}
