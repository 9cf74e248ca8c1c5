//! Outbound REST client (reqwest).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use super::{Client, RemoteCall};
use crate::config::ServerConfig;
use crate::error::CommandError;

/// Forwards calls to a remote server as REST requests.
///
/// ```ignore
/// let app = App::new(tree())?.with_client(HttpClient::new("http://127.0.0.1:3030"));
/// let todos = app.execute("todosGet", json!({})).await?;   // GET http://127.0.0.1:3030/todos
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// A client using the request timeout from `config`.
    pub fn with_config(base_url: &str, config: &ServerConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Client for HttpClient {
    async fn dispatch(&self, call: RemoteCall<'_>) -> Result<Value, CommandError> {
        let method = Method::from_bytes(call.request.method.as_str().as_bytes())
            .map_err(|e| CommandError::general(e.to_string()))?;
        let url = format!("{}{}", self.base_url, call.request.url);

        let mut builder = self.client.request(method, &url);
        for (key, value) in call.session.forwardable() {
            builder = builder.header(key, value);
        }
        if let Some(body) = &call.request.body {
            builder = builder.json(body);
        }

        tracing::debug!(command = %call.name, url = %url, "forwarding command");
        let response = builder.send().await.map_err(|e| {
            CommandError::general(format!("dispatch of `{}` failed: {}", call.name, e))
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            CommandError::general(format!("reading reply to `{}` failed: {}", call.name, e))
        })?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        if (200..300).contains(&status) {
            Ok(body)
        } else {
            Err(CommandError::from_body(status, body))
        }
    }
}
