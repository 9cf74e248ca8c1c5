//! HTTP transport — maps HTTP requests onto the command table.
//!
//! Requires the `http` feature. Uses axum for serving.
//!
//! ## Routes
//!
//! - `GET /_health` — `{ "ok": true, "commands": [...] }` (path configurable).
//! - `GET /ws` — WebSocket command endpoint (with the `ws` feature).
//! - anything else — matched against every command's method and path
//!   template; request headers become the session.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use command_tree::{connection, App, ServerConfig};
//!
//! let app = Arc::new(App::new(tree())?);
//!
//! // Get the router to compose with other axum routes
//! let routes = connection::router(app.clone());
//!
//! // Or serve directly
//! connection::serve(app, &ServerConfig::default()).await?;
//! ```

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use super::server::{ServerRouter, WireResponse};
use crate::app::App;
use crate::command::Session;
use crate::config::ServerConfig;
use crate::error::{CommandError, HttpCode};
use crate::request::{HttpMethod, WireRequest};

/// Build an axum `Router` for the app with default settings.
pub fn router(app: Arc<App>) -> Router {
    router_with_config(app, &ServerConfig::default())
}

pub fn router_with_config(app: Arc<App>, config: &ServerConfig) -> Router {
    let routes = Router::new().route(&config.health_path, get(health_handler));

    #[cfg(feature = "ws")]
    let routes = routes.route(&config.ws_path, get(super::ws::ws_handler));

    routes
        .fallback(command_handler)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(ServerRouter::new(app))
}

/// Serve the app over HTTP at `config.bind`.
pub async fn serve(app: Arc<App>, config: &ServerConfig) -> Result<(), std::io::Error> {
    let routes = router_with_config(app, config);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(address = %listener.local_addr()?, "HTTP server listening");
    axum::serve(listener, routes).await
}

/// `GET /_health` — returns `{ "ok": true, "commands": [...] }`.
async fn health_handler(State(router): State<ServerRouter>) -> impl IntoResponse {
    let commands = router.app().commands().names();
    Json(json!({ "ok": true, "commands": commands }))
}

/// Every other route: match the request against the command table.
async fn command_handler(
    State(router): State<ServerRouter>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let method = match method.as_str().parse::<HttpMethod>() {
        Ok(method) => method,
        Err(message) => {
            return error_response(&CommandError::new(HttpCode::MethodNotAllowed, message));
        }
    };

    let body = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                return error_response(&CommandError::bad_request(format!(
                    "request body is not valid JSON: {}",
                    e
                )));
            }
        }
    };

    let url = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let request = WireRequest { method, url, body };
    let session = session_from_headers(&headers);
    respond(router.handle(request, session).await)
}

fn respond(response: WireResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body)).into_response()
}

fn error_response(err: &CommandError) -> Response {
    respond(WireResponse::from_error(err))
}

/// Headers that are not visible ASCII are skipped.
pub(crate) fn session_from_headers(headers: &HeaderMap) -> Session {
    Session::from_headers(
        headers
            .iter()
            .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?))),
    )
}
