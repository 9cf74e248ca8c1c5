//! Context passed to every pipeline step.
//!
//! Carries the runtime command (qualified name, method, path), the caller's
//! session and the resources the application injected. Hooks reach their
//! collaborators through the context instead of through the module tree.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::session::Session;
use crate::error::CommandError;
use crate::request::HttpMethod;

/// The command as seen by a running call. Read-only for hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeCommand {
    pub name: String,
    pub method: HttpMethod,
    pub path: String,
}

/// Type-keyed collaborators shared by every call (database handles, token
/// verifiers, ...).
#[derive(Clone, Default)]
pub struct Resources {
    entries: Arc<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource, replacing any previous one of the same type.
    pub fn insert<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        Arc::make_mut(&mut self.entries).insert(TypeId::of::<T>(), Arc::new(value));
        self
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|entry| entry.downcast::<T>().ok())
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The context a hook runs with.
#[derive(Clone)]
pub struct Context {
    command: RuntimeCommand,
    session: Session,
    resources: Resources,
}

impl Context {
    pub fn new(command: RuntimeCommand, session: Session, resources: Resources) -> Self {
        Self {
            command,
            session,
            resources,
        }
    }

    /// Deserialize a JSON value into a typed struct, mapping failures to
    /// `BadRequest`.
    pub fn decode<T: DeserializeOwned>(&self, data: Value) -> Result<T, CommandError> {
        serde_json::from_value(data).map_err(|e| {
            CommandError::bad_request(format!("invalid input for `{}`: {}", self.command.name, e))
        })
    }

    pub fn command(&self) -> &RuntimeCommand {
        &self.command
    }

    /// The qualified command name, e.g. `todosGet`.
    pub fn name(&self) -> &str {
        &self.command.name
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Get the user ID from the session. Returns `NotAuthenticated` if not present.
    pub fn user_id(&self) -> Result<&str, CommandError> {
        self.session
            .user_id()
            .ok_or_else(|| CommandError::not_authenticated("missing user ID in session"))
    }

    pub fn role(&self) -> Option<&str> {
        self.session.role()
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn resource<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.resources.get::<T>()
    }

    /// Like [`Context::resource`], but a missing resource is a server error.
    pub fn require<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, CommandError> {
        self.resource::<T>().ok_or_else(|| {
            CommandError::general(format!(
                "`{}` needs a `{}` resource that was not provided",
                self.command.name,
                std::any::type_name::<T>()
            ))
        })
    }
}
