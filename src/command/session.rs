//! Per-call session variables.
//!
//! Inbound, every HTTP request header and every WebSocket upgrade header
//! becomes a variable, keyed by its lowercase name. Outbound, clients send the
//! `x-` variables back out as headers, so identity set at the edge follows a
//! call across hops.

use std::collections::HashMap;

/// Caller identity, checked by [`Context::user_id`](super::Context::user_id).
pub const USER_ID: &str = "x-user-id";
pub const ROLE: &str = "x-role";

const FORWARD_PREFIX: &str = "x-";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    variables: HashMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a session from header pairs. Names are lowercased; a repeated
    /// name keeps its last value.
    pub fn from_headers<'a>(headers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let variables = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.to_string()))
            .collect();
        Self { variables }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.get(USER_ID)
    }

    pub fn role(&self) -> Option<&str> {
        self.get(ROLE)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// The variables a client sends to its peer: REST clients as request
    /// headers on every call, the WebSocket client as upgrade headers once
    /// per socket. Transport headers such as `content-type` stay behind.
    pub fn forwardable(&self) -> impl Iterator<Item = (&str, &str)> {
        self.variables
            .iter()
            .filter(|(key, _)| key.starts_with(FORWARD_PREFIX))
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}
