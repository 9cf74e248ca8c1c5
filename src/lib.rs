//! A tree of commands that is both an API and a router.
//!
//! Commands are grouped into services, services are nested under paths, and
//! the root of the tree is wrapped in an [`App`]. From one declaration the
//! crate derives:
//!
//! - a flat, collision-checked table of qualified command names
//!   (`/todos` + `get` → `todosGet`),
//! - an HTTP mapping for every command (`GET /todos`), with path templates
//!   such as `/todos/{id}`,
//! - local execution through a hook pipeline, or remote dispatch through a
//!   [`connection::Client`] speaking REST or WebSocket envelopes,
//! - an inbound [`connection::ServerRouter`] that turns wire requests back
//!   into command calls, served over axum with the `http`/`ws` features.
//!
//! ```ignore
//! use command_tree::{App, Command, Service};
//! use serde_json::json;
//!
//! let todos = Service::new()
//!     .use_command(Command::new("get").handle_fn(|_, _| Ok(json!([]))))
//!     .use_command(Command::new("update").set_path("/{id}")?.handle_fn(|_, data| Ok(data)));
//!
//! let app = App::new(Service::new().use_service("/todos", todos))?;
//! app.start().await?;
//! app.execute("todosUpdate", json!({ "id": "t1", "done": true })).await?;
//! ```

mod app;
mod command;
mod config;
pub mod connection;
mod error;
mod module;
pub mod path;
mod request;
mod service;

pub use app::App;
pub use command::naming;
pub use command::{
    hook_async, hook_fn, typed, Command, Context, Executor, Hook, RequiredFields, Resources,
    RuntimeCommand, Schema, Session, TypedSchema, ROLE, USER_ID,
};
pub use config::{load_config, ConfigError, ServerConfig};
pub use error::{
    CommandError, HttpCode, LifecycleError, RequestError, StructuralError, TemplateError,
};
pub use module::{validate_tree, AsAny, Lifecycle, Module, ModuleExt, TreeCursor};
pub use path::PathTemplate;
pub use request::{HttpMethod, RequestHandler, WireRequest};
pub use service::{CommandEntry, CommandTable, Service};

/// Register command modules with a service using the convention pattern.
///
/// Each module must export `command() -> Command`.
///
/// # Example
/// ```ignore
/// mod commands {
///     pub mod get {
///         pub fn command() -> command_tree::Command { /* ... */ }
///     }
///     pub mod create {
///         pub fn command() -> command_tree::Command { /* ... */ }
///     }
/// }
///
/// let todos = command_tree::register_commands!(
///     command_tree::Service::new(),
///     commands::get,
///     commands::create,
/// );
/// ```
#[macro_export]
macro_rules! register_commands {
    ($service:expr, $( $($seg:ident)::+ ),+ $(,)?) => {
        $service
        $(
            .use_command($($seg)::+::command())
        )+
    };
}
