//! Input schemas.
//!
//! A schema runs as the first pipeline step. It either returns the
//! (possibly normalized) input or a `BadRequest` describing what was wrong.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::CommandError;

/// Validates command input.
pub trait Schema: Send + Sync + 'static {
    fn validate(&self, data: Value) -> Result<Value, CommandError>;
}

impl<F> Schema for F
where
    F: Fn(Value) -> Result<Value, CommandError> + Send + Sync + 'static,
{
    fn validate(&self, data: Value) -> Result<Value, CommandError> {
        self(data)
    }
}

/// Accepts input that deserializes into `T`, and normalizes it by
/// re-serializing (defaults filled in, unknown fields kept out if `T` denies
/// them).
pub struct TypedSchema<T> {
    _type: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    pub fn new() -> Self {
        Self { _type: PhantomData }
    }
}

impl<T> Default for TypedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Schema for TypedSchema<T>
where
    T: DeserializeOwned + Serialize + 'static,
{
    fn validate(&self, data: Value) -> Result<Value, CommandError> {
        let typed: T = serde_json::from_value(data).map_err(|e| {
            CommandError::bad_request(format!("validation failed: {}", e))
        })?;
        serde_json::to_value(typed)
            .map_err(|e| CommandError::general(format!("failed to normalize input: {}", e)))
    }
}

/// Requires a set of top-level fields to be present and non-null.
#[derive(Debug, Clone)]
pub struct RequiredFields {
    fields: Vec<String>,
}

impl RequiredFields {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl Schema for RequiredFields {
    fn validate(&self, data: Value) -> Result<Value, CommandError> {
        let missing: Vec<&str> = self
            .fields
            .iter()
            .filter(|field| data.get(field.as_str()).map_or(true, Value::is_null))
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            Ok(data)
        } else {
            Err(
                CommandError::bad_request(format!("missing fields: {}", missing.join(", ")))
                    .with_data(json!({ "missing": missing })),
            )
        }
    }
}
