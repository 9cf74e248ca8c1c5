//! Command — a named, executable module bound to one HTTP mapping.
//!
//! A `Command` owns a [`RequestHandler`] (method + path template + optional
//! schema) and a pipeline of [`Hook`]s. It is immutable: every builder method
//! returns a new command.
//!
//! ## Quick Start
//!
//! ```ignore
//! use command_tree::{Command, CommandError};
//! use serde_json::json;
//!
//! let update = Command::new("update")              // PUT /
//!     .set_path("/{id}")?                          // PUT /{id}
//!     .set_schema(RequiredFields::new(["id"]))
//!     .handle_fn(|ctx, input| {
//!         let user = ctx.user_id()?;
//!         Ok(json!({ "id": input["id"], "by": user }))
//!     });
//!
//! // Local execution: runs the pipeline directly
//! let out = update.execute(json!({ "id": "t1" })).await;
//! ```
//!
//! ## Pipeline
//!
//! `[schema] → pre-hooks → hooks → handler`. The schema always runs first;
//! `use_pre_hook` prepends to the hooks, `use_hook` and the `handle*`
//! methods append.

mod context;
mod executor;
mod hook;
pub mod naming;
mod schema;
mod session;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CommandError, RequestError, TemplateError};
use crate::module::{Lifecycle, Module};
use crate::path::PathTemplate;
use crate::request::{HttpMethod, RequestHandler, WireRequest};

pub use context::{Context, Resources, RuntimeCommand};
pub use executor::Executor;
pub use hook::{hook_async, hook_fn, typed, AsyncHook, FnHook, Hook, TypedHandler};
pub use schema::{RequiredFields, Schema, TypedSchema};
pub use session::{Session, ROLE, USER_ID};

/// A named command.
#[derive(Clone)]
pub struct Command {
    name: String,
    request: RequestHandler,
    hooks: Vec<Arc<dyn Hook>>,
    lifecycle: Lifecycle,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("method", &self.request.method())
            .field("path", &self.request.template().to_string())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl Command {
    /// Create a command. Its method follows the name prefix (`get`, `create`,
    /// `update`, ...) and its path is `/`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let method = naming::method_for(&name);
        Self {
            name,
            request: RequestHandler::new(method, PathTemplate::root()),
            hooks: Vec::new(),
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn set_name(&self, name: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.name = name.into();
        next
    }

    pub fn set_request(&self, request: RequestHandler) -> Self {
        let mut next = self.clone();
        next.request = request;
        next
    }

    pub fn set_method(&self, method: HttpMethod) -> Self {
        self.set_request(self.request.clone().with_method(method))
    }

    pub fn set_template(&self, template: PathTemplate) -> Self {
        self.set_request(self.request.clone().with_template(template))
    }

    /// Parse and bind a path template, e.g. `/{id}`.
    pub fn set_path(&self, template: &str) -> Result<Self, TemplateError> {
        Ok(self.set_template(PathTemplate::parse(template)?))
    }

    pub fn set_schema(&self, schema: impl Schema) -> Self {
        self.set_request(self.request.clone().with_schema(Arc::new(schema)))
    }

    /// Append a step to the pipeline.
    pub fn use_hook(&self, hook: impl Hook) -> Self {
        let mut next = self.clone();
        next.hooks.push(Arc::new(hook));
        next
    }

    /// Prepend a step, ahead of every other hook (the schema still runs
    /// first).
    pub fn use_pre_hook(&self, hook: impl Hook) -> Self {
        let mut next = self.clone();
        next.hooks.insert(0, Arc::new(hook));
        next
    }

    /// Append an async handler.
    pub fn handle<F, Fut>(&self, handler: F) -> Self
    where
        F: Fn(Context, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, CommandError>> + Send + 'static,
    {
        self.use_hook(hook_async(handler))
    }

    /// Append a synchronous handler.
    pub fn handle_fn<F>(&self, handler: F) -> Self
    where
        F: Fn(&mut Context, Value) -> Result<Value, CommandError> + Send + Sync + 'static,
    {
        self.use_hook(hook_fn(handler))
    }

    /// Append an async handler with typed input and output.
    pub fn handle_typed<F, Fut, I, O>(&self, handler: F) -> Self
    where
        F: Fn(Context, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, CommandError>> + Send + 'static,
        I: DeserializeOwned + Send + 'static,
        O: Serialize + Send + 'static,
    {
        self.use_hook(typed(handler))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> HttpMethod {
        self.request.method()
    }

    pub fn template(&self) -> &PathTemplate {
        self.request.template()
    }

    pub fn request_handler(&self) -> &RequestHandler {
        &self.request
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// The same command with its path mounted under `prefix`.
    pub(crate) fn mounted(&self, prefix: &str) -> Self {
        self.set_request(self.request.prefixed(prefix))
    }

    /// Runtime view of this command under the given qualified name.
    pub fn runtime(&self, name: &str) -> RuntimeCommand {
        RuntimeCommand {
            name: name.to_string(),
            method: self.method(),
            path: self.template().to_string(),
        }
    }

    pub fn to_request(&self, data: &Value) -> Result<WireRequest, RequestError> {
        self.request.to_request(data)
    }

    pub fn match_request(&self, request: &WireRequest) -> Option<Value> {
        self.request.match_request(request)
    }

    /// Run the pipeline: schema first, then every hook in order.
    pub async fn run_pipeline(&self, ctx: &mut Context, input: Value) -> Result<Value, CommandError> {
        let mut data = input;
        if let Some(schema) = self.request.schema() {
            data = schema.validate(data)?;
        }
        for hook in &self.hooks {
            data = hook.call(ctx, data).await?;
        }
        Ok(data)
    }

    /// Execute locally with an empty session and no resources.
    pub async fn execute(&self, input: Value) -> Result<Value, CommandError> {
        let mut ctx = Context::new(self.runtime(&self.name), Session::new(), Resources::new());
        self.run_pipeline(&mut ctx, input).await
    }

    /// Execute locally with typed input and output.
    pub async fn execute_as<I, O>(&self, input: &I) -> Result<O, CommandError>
    where
        I: Serialize + Sync,
        O: DeserializeOwned,
    {
        let input = serde_json::to_value(input)
            .map_err(|e| CommandError::bad_request(format!("failed to encode input: {}", e)))?;
        let output = self.execute(input).await?;
        serde_json::from_value(output)
            .map_err(|e| CommandError::general(format!("failed to decode output: {}", e)))
    }
}

#[async_trait]
impl Module for Command {
    fn name(&self) -> &str {
        &self.name
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn as_command(&self) -> Option<&Command> {
        Some(self)
    }

    fn duplicate(&self) -> Option<Arc<dyn Module>> {
        Some(Arc::new(self.clone()))
    }
}
