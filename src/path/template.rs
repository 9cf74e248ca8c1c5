//! Bidirectional URL templates.
//!
//! A [`PathTemplate`] is an ordered list of literal segments interleaved with
//! parameter keys: `lit₀ key₀ lit₁ key₁ … litₙ`. It renders command data into
//! a path (`to_path`) and reads a path back into data (`match_path`).
//!
//! ```ignore
//! let template = PathTemplate::parse("/todos/{id}")?;
//! let (path, rest) = template.to_path(&json!({ "id": "abc", "completed": true }))?;
//! assert_eq!(path, "/todos/abc");
//! assert_eq!(rest, json!({ "completed": true }));
//! ```

use std::fmt;
use std::str::FromStr;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::{Map, Value};

use crate::error::{RequestError, TemplateError};

/// Characters escaped inside a path parameter. `/` is included so a value
/// can never introduce extra segments.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A literal/parameter path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    /// Always `keys.len() + 1` entries.
    literals: Vec<String>,
    keys: Vec<String>,
}

impl Default for PathTemplate {
    fn default() -> Self {
        Self::root()
    }
}

impl PathTemplate {
    /// The `/` template.
    pub fn root() -> Self {
        Self {
            literals: vec!["/".to_string()],
            keys: Vec::new(),
        }
    }

    /// Build a template from its literal and key lists.
    ///
    /// `literals` must hold exactly one more entry than `keys`. Two keys must
    /// be separated by a non-empty literal, otherwise there is no way to tell
    /// where the first value ends.
    pub fn from_parts(literals: Vec<String>, keys: Vec<String>) -> Result<Self, TemplateError> {
        if literals.len() != keys.len() + 1 {
            return Err(TemplateError::Malformed {
                template: format!("{:?} / {:?}", literals, keys),
                reason: "expected one more literal than parameters".to_string(),
            });
        }
        for (i, pair) in keys.windows(2).enumerate() {
            if literals[i + 1].is_empty() {
                return Err(TemplateError::AdjacentParams {
                    first: pair[0].clone(),
                    second: pair[1].clone(),
                });
            }
        }
        Ok(Self { literals, keys })
    }

    /// Parse `/todos/{id}/items/{item}` style syntax.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let malformed = |reason: &str| TemplateError::Malformed {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut literals = Vec::new();
        let mut keys = Vec::new();
        let mut current = String::new();
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut key = String::new();
                    let mut closed = false;
                    for k in chars.by_ref() {
                        match k {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(malformed("nested `{`")),
                            other => key.push(other),
                        }
                    }
                    if !closed {
                        return Err(malformed("unterminated `{`"));
                    }
                    let key = key.trim().to_string();
                    if key.is_empty() {
                        return Err(malformed("empty parameter name"));
                    }
                    literals.push(std::mem::take(&mut current));
                    keys.push(key);
                }
                '}' => return Err(malformed("unmatched `}`")),
                other => current.push(other),
            }
        }
        literals.push(current);

        Self::from_parts(literals, keys)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn literals(&self) -> &[String] {
        &self.literals
    }

    pub fn has_params(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Mount this template under `prefix` (e.g. a service path).
    ///
    /// `/` under `/todos` becomes `/todos`; `/{id}` under `/todos` becomes
    /// `/todos/{id}`.
    pub fn prefixed(&self, prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return self.clone();
        }
        let prefix = if prefix.starts_with('/') {
            prefix.to_string()
        } else {
            format!("/{}", prefix)
        };

        let mut literals = self.literals.clone();
        let first = &self.literals[0];
        literals[0] = if first == "/" && self.keys.is_empty() {
            prefix
        } else if first.starts_with('/') {
            format!("{}{}", prefix, first)
        } else {
            format!("{}/{}", prefix, first)
        };

        Self {
            literals,
            keys: self.keys.clone(),
        }
    }

    /// Render `data` into a path.
    ///
    /// Returns the path and whatever part of `data` was not consumed by a
    /// parameter. A key counts as present when its value is anything but
    /// `null` — `0`, `false` and `""` are all rendered.
    pub fn to_path(&self, data: &Value) -> Result<(String, Value), RequestError> {
        let map = match data {
            Value::Object(map) => map,
            Value::Null => {
                return Ok((self.render(&Map::new()), Value::Null));
            }
            other if self.keys.is_empty() => {
                return Ok((self.literals[0].clone(), other.clone()));
            }
            other => {
                return Err(RequestError::UnhandledData {
                    method: "any".to_string(),
                    detail: format!(
                        "template `{}` needs an object with its parameters, got {}",
                        self, other
                    ),
                });
            }
        };

        let path = self.render(map);
        let leftover: Map<String, Value> = map
            .iter()
            .filter(|(key, value)| !(self.keys.contains(key) && !value.is_null()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok((path, Value::Object(leftover)))
    }

    fn render(&self, map: &Map<String, Value>) -> String {
        let mut path = String::new();
        for (i, literal) in self.literals.iter().enumerate() {
            path.push_str(literal);
            if let Some(key) = self.keys.get(i) {
                if let Some(segment) = map.get(key).and_then(segment_text) {
                    path.extend(utf8_percent_encode(&segment, SEGMENT));
                }
            }
        }
        path
    }

    /// Read a path back into data.
    ///
    /// Template parameters are written over `partial`. Returns `None` when the
    /// path was not produced by this template. A path that runs out after the
    /// first literal leaves the remaining parameters as `""` instead of
    /// failing.
    pub fn match_path(&self, url: &str, partial: Map<String, Value>) -> Option<Map<String, Value>> {
        let mut data = partial;
        let mut rest = url;
        let last = self.keys.len();

        for (i, literal) in self.literals.iter().enumerate() {
            if i > 0 && is_exhausted(rest) {
                for key in &self.keys[i..] {
                    data.insert(key.clone(), Value::String(String::new()));
                }
                return Some(data);
            }

            rest = strip_literal(rest, literal)?;

            if i == last {
                break;
            }

            let next = &self.literals[i + 1];
            let raw = if next.is_empty() {
                let value = rest.strip_suffix('/').unwrap_or(rest);
                rest = "";
                value
            } else if let Some(pos) = rest.find(next.as_str()) {
                let (value, remainder) = rest.split_at(pos);
                rest = remainder;
                value
            } else {
                // The URL may end inside the next literal: `/items` for `/items/`.
                let stem = next.trim_end_matches('/');
                match rest.strip_suffix(stem).filter(|_| !stem.is_empty()) {
                    Some(value) => {
                        rest = &rest[value.len()..];
                        value
                    }
                    None => {
                        let value = rest.strip_suffix('/').unwrap_or(rest);
                        rest = "";
                        value
                    }
                }
            };

            // Rendered values never contain a raw `/`.
            if raw.contains('/') {
                return None;
            }

            let value = percent_decode_str(raw).decode_utf8_lossy().into_owned();
            data.insert(self.keys[i].clone(), Value::String(value));
        }

        if is_exhausted(rest) {
            Some(data)
        } else {
            None
        }
    }
}

impl FromStr for PathTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, literal) in self.literals.iter().enumerate() {
            f.write_str(literal)?;
            if let Some(key) = self.keys.get(i) {
                write!(f, "{{{}}}", key)?;
            }
        }
        Ok(())
    }
}

fn segment_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn is_exhausted(rest: &str) -> bool {
    rest.is_empty() || rest == "/"
}

fn strip_literal<'u>(rest: &'u str, literal: &str) -> Option<&'u str> {
    if let Some(remainder) = rest.strip_prefix(literal) {
        return Some(remainder);
    }
    // `/todos/` also accepts `/todos`
    match literal.strip_suffix('/') {
        Some(without) if rest == without => Some(""),
        _ => None,
    }
}
