//! Error types shared across the routing core.
//!
//! Everything that crosses a command pipeline boundary is normalized into a
//! [`CommandError`]. The other enums describe programmer or assembly mistakes
//! and surface before any traffic is served.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// HTTP status codes a command may fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpCode {
    BadRequest,
    NotAuthenticated,
    PaymentError,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    NotAcceptable,
    Timeout,
    Conflict,
    LengthRequired,
    Unprocessable,
    TooManyRequests,
    GeneralError,
    NotImplemented,
    BadGateway,
    Unavailable,
}

impl HttpCode {
    pub fn as_u16(self) -> u16 {
        match self {
            HttpCode::BadRequest => 400,
            HttpCode::NotAuthenticated => 401,
            HttpCode::PaymentError => 402,
            HttpCode::Forbidden => 403,
            HttpCode::NotFound => 404,
            HttpCode::MethodNotAllowed => 405,
            HttpCode::NotAcceptable => 406,
            HttpCode::Timeout => 408,
            HttpCode::Conflict => 409,
            HttpCode::LengthRequired => 411,
            HttpCode::Unprocessable => 422,
            HttpCode::TooManyRequests => 429,
            HttpCode::GeneralError => 500,
            HttpCode::NotImplemented => 501,
            HttpCode::BadGateway => 502,
            HttpCode::Unavailable => 503,
        }
    }

    /// Map a numeric status back to a code. Unknown statuses become
    /// `GeneralError`.
    pub fn from_u16(status: u16) -> Self {
        match status {
            400 => HttpCode::BadRequest,
            401 => HttpCode::NotAuthenticated,
            402 => HttpCode::PaymentError,
            403 => HttpCode::Forbidden,
            404 => HttpCode::NotFound,
            405 => HttpCode::MethodNotAllowed,
            406 => HttpCode::NotAcceptable,
            408 => HttpCode::Timeout,
            409 => HttpCode::Conflict,
            411 => HttpCode::LengthRequired,
            422 => HttpCode::Unprocessable,
            429 => HttpCode::TooManyRequests,
            501 => HttpCode::NotImplemented,
            502 => HttpCode::BadGateway,
            503 => HttpCode::Unavailable,
            _ => HttpCode::GeneralError,
        }
    }

    /// The error name reported in error bodies.
    pub fn name(self) -> &'static str {
        match self {
            HttpCode::BadRequest => "BadRequest",
            HttpCode::NotAuthenticated => "NotAuthenticated",
            HttpCode::PaymentError => "PaymentError",
            HttpCode::Forbidden => "Forbidden",
            HttpCode::NotFound => "NotFound",
            HttpCode::MethodNotAllowed => "MethodNotAllowed",
            HttpCode::NotAcceptable => "NotAcceptable",
            HttpCode::Timeout => "Timeout",
            HttpCode::Conflict => "Conflict",
            HttpCode::LengthRequired => "LengthRequired",
            HttpCode::Unprocessable => "Unprocessable",
            HttpCode::TooManyRequests => "TooManyRequests",
            HttpCode::GeneralError => "GeneralError",
            HttpCode::NotImplemented => "NotImplemented",
            HttpCode::BadGateway => "BadGateway",
            HttpCode::Unavailable => "Unavailable",
        }
    }
}

impl fmt::Display for HttpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.name())
    }
}

impl Serialize for HttpCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.as_u16())
    }
}

impl<'de> Deserialize<'de> for HttpCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u16::deserialize(deserializer).map(HttpCode::from_u16)
    }
}

/// The normalized error every command failure is turned into.
///
/// Serializes to the wire error body `{ code, name, message, data? }`, so REST
/// responders and WebSocket replies send the same object.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{name}: {message}")]
pub struct CommandError {
    pub code: HttpCode,
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CommandError {
    pub fn new(code: HttpCode, message: impl Into<String>) -> Self {
        Self {
            code,
            name: code.name().to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Rebuild an error from a numeric status, e.g. a remote response.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(HttpCode::from_u16(status), message)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(HttpCode::BadRequest, message)
    }

    pub fn not_authenticated(message: impl Into<String>) -> Self {
        Self::new(HttpCode::NotAuthenticated, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(HttpCode::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(HttpCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(HttpCode::Conflict, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(HttpCode::Unprocessable, message)
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self::new(HttpCode::GeneralError, message)
    }

    /// The HTTP status to respond with.
    pub fn status_code(&self) -> u16 {
        self.code.as_u16()
    }

    /// Parse an error body received from a remote peer. Bodies that are not
    /// error-shaped are wrapped with the given status.
    pub fn from_body(status: u16, body: Value) -> Self {
        match serde_json::from_value::<CommandError>(body.clone()) {
            Ok(err) => err,
            Err(_) => {
                let message = match &body {
                    Value::String(s) => s.clone(),
                    Value::Null => format!("remote call failed with status {}", status),
                    other => other.to_string(),
                };
                Self::from_status(status, message)
            }
        }
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        CommandError::bad_request(err.to_string())
    }
}

impl From<RequestError> for CommandError {
    fn from(err: RequestError) -> Self {
        CommandError::general(err.to_string())
    }
}

impl From<anyhow::Error> for CommandError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<CommandError>() {
            Ok(command) => command,
            Err(other) => CommandError::general(other.to_string()),
        }
    }
}

/// A tree invariant was violated. Raised while validating or assembling,
/// never while serving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("command `{name}` is mounted twice: at `{first}` and at `{second}`")]
    CommandCollision {
        name: String,
        first: String,
        second: String,
    },
    #[error("module `{module}` must be the only one of its type among its siblings")]
    NotSingle { module: String },
    #[error("module `{module}` must be the root of the tree")]
    NotRoot { module: String },
    #[error("module `{module}` must be a direct child of the root")]
    NotRootParent { module: String },
    #[error("module `{module}` requires a `{required}` module in the tree")]
    MissingRequired { module: String, required: String },
    #[error("module `{module}` conflicts with `{conflicting}` in the tree")]
    Conflicting { module: String, conflicting: String },
    #[error("module `{module}` is mounted more than once; mount a copy instead")]
    SharedNode { module: String },
}

/// A path template could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("parameters `{first}` and `{second}` must be separated by a literal")]
    AdjacentParams { first: String, second: String },
    #[error("malformed path template `{template}`: {reason}")]
    Malformed { template: String, reason: String },
}

/// Command data could not be turned into, or read back from, a wire request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("data could not be placed in the {method} request: {detail}")]
    UnhandledData { method: String, detail: String },
}

/// A lifecycle transition was not legal, or its hook failed.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("module `{0}` is already started")]
    AlreadyStarted(String),
    #[error("module `{0}` is not started")]
    NotStarted(String),
    #[error("module `{module}` failed to change state: {source}")]
    Failed {
        module: String,
        #[source]
        source: anyhow::Error,
    },
    #[error(transparent)]
    Structural(#[from] StructuralError),
}
