//! Wire requests and the handler that maps command data onto them.
//!
//! A [`RequestHandler`] pairs an HTTP method with a [`PathTemplate`] and an
//! optional input schema. `to_request` turns command data into a
//! [`WireRequest`]; `match_request` reads one back.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::command::Schema;
use crate::error::RequestError;
use crate::path::{query, PathTemplate};

/// The HTTP verbs a command can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(format!("unsupported method: {}", other)),
        }
    }
}

/// A transport-neutral HTTP request: `{ method, url, body? }`.
///
/// `url` is the path, followed by `?query` when there is a query string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRequest {
    pub method: HttpMethod,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl WireRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// The URL without its query string.
    pub fn path(&self) -> &str {
        match self.url.find('?') {
            Some(pos) => &self.url[..pos],
            None => &self.url,
        }
    }

    /// The query string without the leading `?`, empty when absent.
    pub fn query(&self) -> &str {
        match self.url.find('?') {
            Some(pos) => &self.url[pos + 1..],
            None => "",
        }
    }
}

/// Binds a method, a path template and an optional schema.
#[derive(Clone)]
pub struct RequestHandler {
    method: HttpMethod,
    template: PathTemplate,
    schema: Option<Arc<dyn Schema>>,
}

impl fmt::Debug for RequestHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandler")
            .field("method", &self.method)
            .field("template", &self.template.to_string())
            .field("schema", &self.schema.is_some())
            .finish()
    }
}

impl RequestHandler {
    pub fn new(method: HttpMethod, template: PathTemplate) -> Self {
        Self {
            method,
            template,
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: Arc<dyn Schema>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_template(mut self, template: PathTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    pub fn schema(&self) -> Option<&Arc<dyn Schema>> {
        self.schema.as_ref()
    }

    /// The same handler mounted under `prefix`.
    pub fn prefixed(&self, prefix: &str) -> Self {
        Self {
            method: self.method,
            template: self.template.prefixed(prefix),
            schema: self.schema.clone(),
        }
    }

    /// Place `data` into a wire request.
    ///
    /// Fields not consumed by the path go to the query string for GET and to
    /// the JSON body otherwise.
    pub fn to_request(&self, data: &Value) -> Result<WireRequest, RequestError> {
        let (path, leftover) = self.template.to_path(data).map_err(|err| match err {
            RequestError::UnhandledData { detail, .. } => RequestError::UnhandledData {
                method: self.method.to_string(),
                detail,
            },
            other => other,
        })?;

        if self.method == HttpMethod::Get {
            let query = match &leftover {
                Value::Object(map) => query::encode(map),
                Value::Null => String::new(),
                other => {
                    return Err(RequestError::UnhandledData {
                        method: self.method.to_string(),
                        detail: format!("{} cannot be sent as a query string", other),
                    })
                }
            };
            let url = if query.is_empty() {
                path
            } else {
                format!("{}?{}", path, query)
            };
            return Ok(WireRequest::new(self.method, url));
        }

        let request = WireRequest::new(self.method, path);
        Ok(match leftover {
            Value::Null => request,
            body => request.with_body(body),
        })
    }

    /// Read a wire request back into command data, or `None` when it was not
    /// addressed to this handler.
    pub fn match_request(&self, request: &WireRequest) -> Option<Value> {
        if request.method != self.method {
            return None;
        }

        let seed = if self.method == HttpMethod::Get {
            query::decode(request.query())
        } else {
            match &request.body {
                None | Some(Value::Null) => Map::new(),
                Some(Value::Object(map)) => map.clone(),
                Some(_) => return None,
            }
        };

        self.template
            .match_path(request.path(), seed)
            .map(Value::Object)
    }
}
