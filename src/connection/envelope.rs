//! WebSocket command envelopes.
//!
//! Request: `{"id": 7, "command": "todosGet", "data": {}}`.
//! Reply: `{"id": 7, "error": null, "result": [...]}`, or with `error` set to
//! the error body and `result` null.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CommandError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub id: u64,
    pub command: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub id: u64,
    #[serde(default)]
    pub error: Option<CommandError>,
    #[serde(default)]
    pub result: Option<Value>,
}

impl ReplyEnvelope {
    pub fn from_result(id: u64, result: Result<Value, CommandError>) -> Self {
        match result {
            Ok(value) => Self {
                id,
                error: None,
                result: Some(value),
            },
            Err(err) => Self {
                id,
                error: Some(err),
                result: None,
            },
        }
    }

    pub fn into_result(self) -> Result<Value, CommandError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}
