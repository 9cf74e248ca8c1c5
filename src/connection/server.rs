//! Transport-agnostic inbound routing.
//!
//! `ServerRouter` is what the HTTP and WebSocket transports delegate to. It
//! can also be driven directly (or through [`Loopback`]) without sockets.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::envelope::{CommandEnvelope, ReplyEnvelope};
use super::{Client, RemoteCall};
use crate::app::App;
use crate::command::Session;
use crate::error::CommandError;
use crate::request::WireRequest;
use crate::service::CommandEntry;

/// Status and body of a handled wire request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireResponse {
    pub status: u16,
    pub body: Value,
}

impl WireResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn from_error(err: &CommandError) -> Self {
        Self {
            status: err.status_code(),
            body: serde_json::to_value(err).unwrap_or_else(|_| json!({ "message": err.message })),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Back to a command result, as a client sees it.
    pub fn into_result(self) -> Result<Value, CommandError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(CommandError::from_body(self.status, self.body))
        }
    }
}

impl From<Result<Value, CommandError>> for WireResponse {
    fn from(result: Result<Value, CommandError>) -> Self {
        match result {
            Ok(value) => WireResponse::ok(value),
            Err(err) => WireResponse::from_error(&err),
        }
    }
}

/// Routes inbound traffic to an app's commands.
#[derive(Debug, Clone)]
pub struct ServerRouter {
    app: Arc<App>,
}

impl ServerRouter {
    pub fn new(app: Arc<App>) -> Self {
        Self { app }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// The first command, in declaration order, whose request handler
    /// accepts `request`, with the decoded input.
    pub fn route(&self, request: &WireRequest) -> Option<(&CommandEntry, Value)> {
        self.app
            .commands()
            .iter()
            .find_map(|entry| entry.command.match_request(request).map(|data| (entry, data)))
    }

    /// Execute the command a REST request addresses.
    pub async fn handle(&self, request: WireRequest, session: Session) -> WireResponse {
        let Some((entry, input)) = self.route(&request) else {
            tracing::debug!(method = %request.method, url = %request.url, "no command matches");
            return WireResponse::from_error(&CommandError::not_found(format!(
                "no command matches {} {}",
                request.method, request.url
            )));
        };
        self.app.execute_entry(entry, input, session).await.into()
    }

    /// Execute the command a WebSocket envelope names.
    pub async fn handle_envelope(&self, envelope: CommandEnvelope, session: Session) -> ReplyEnvelope {
        let result = self
            .app
            .execute_with_session(&envelope.command, envelope.data, session)
            .await;
        ReplyEnvelope::from_result(envelope.id, result)
    }
}

/// A client that serves every call from an in-process [`ServerRouter`],
/// going through the full request encoding and matching.
#[derive(Debug, Clone)]
pub struct Loopback {
    router: ServerRouter,
}

impl Loopback {
    pub fn new(server: Arc<App>) -> Self {
        Self {
            router: ServerRouter::new(server),
        }
    }
}

#[async_trait]
impl Client for Loopback {
    async fn dispatch(&self, call: RemoteCall<'_>) -> Result<Value, CommandError> {
        self.router
            .handle(call.request, call.session.clone())
            .await
            .into_result()
    }
}
