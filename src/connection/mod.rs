//! Connections — the boundary between a command table and a transport.
//!
//! - [`Client`]: outbound. Attached to an [`App`](crate::App), it turns every
//!   call into a remote one.
//! - [`ServerRouter`]: inbound. Resolves wire requests and WebSocket
//!   envelopes against the table and executes the matching command.
//! - [`Loopback`]: a client that feeds a `ServerRouter` in-process.
//!
//! Transports (feature-gated):
//!
//! - `http`: [`router`]/[`serve`] (axum) and [`HttpClient`] (reqwest).
//! - `ws`: the WebSocket command endpoint on the same axum router and
//!   [`WsClient`] (tokio-tungstenite).

mod envelope;
mod server;

use async_trait::async_trait;
use serde_json::Value;

use crate::command::Session;
use crate::error::CommandError;
use crate::request::WireRequest;

pub use envelope::{CommandEnvelope, ReplyEnvelope};
pub use server::{Loopback, ServerRouter, WireResponse};

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
mod http_client;
#[cfg(feature = "http")]
pub use http::{router, router_with_config, serve};
#[cfg(feature = "http")]
pub use http_client::HttpClient;

#[cfg(feature = "ws")]
mod ws;
#[cfg(feature = "ws")]
mod ws_client;
#[cfg(feature = "ws")]
pub use ws_client::WsClient;

/// One call on its way to a remote peer.
///
/// REST clients send `request`; envelope-based clients send `name` and
/// `data`.
#[derive(Debug, Clone)]
pub struct RemoteCall<'a> {
    pub name: &'a str,
    pub data: &'a Value,
    pub request: WireRequest,
    pub session: &'a Session,
}

/// An outbound connection.
#[async_trait]
pub trait Client: Send + Sync {
    async fn dispatch(&self, call: RemoteCall<'_>) -> Result<Value, CommandError>;
}
