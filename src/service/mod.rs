//! Service — a module that owns child modules and aggregates their commands.
//!
//! Commands directly under a service keep their (camel-cased) names. A nested
//! service mounted at a path contributes its whole table, every name
//! prefixed with the camel-cased path and every URL mounted under it:
//!
//! ```ignore
//! let todos = Service::new()
//!     .use_command(Command::new("get").handle_fn(|_, _| Ok(json!([]))))
//!     .use_command(Command::new("create").handle_fn(|_, data| Ok(data)));
//!
//! let api = Service::new().use_service("/todos", todos);
//!
//! let table = api.commands()?;
//! assert!(table.contains("todosGet"));       // GET /todos
//! assert!(table.contains("todosCreate"));    // POST /todos
//! ```
//!
//! The table is built once per service and memoized; a name collision is a
//! [`StructuralError`] raised at assembly, never at call time.

mod table;

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use futures::future::join_all;

use crate::command::naming::qualified_name;
use crate::command::{naming, Command};
use crate::error::StructuralError;
use crate::module::{Lifecycle, Module, ModuleExt};

pub use table::{CommandEntry, CommandTable};

/// A container module with an optional mount path.
pub struct Service {
    name: String,
    path: Option<String>,
    children: Vec<Arc<dyn Module>>,
    table: OnceLock<Result<CommandTable, StructuralError>>,
    lifecycle: Lifecycle,
}

impl Default for Service {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Service {
    /// A deep copy: every child that can be duplicated is, so the copy has
    /// its own stopped nodes, memo and lifecycle. Children that cannot be
    /// duplicated are shared.
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            path: self.path.clone(),
            children: self
                .children
                .iter()
                .map(|child| child.duplicate().unwrap_or_else(|| child.clone()))
                .collect(),
            table: OnceLock::new(),
            lifecycle: Lifecycle::new(),
        }
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("children", &self.children.len())
            .finish()
    }
}

impl Service {
    pub fn new() -> Self {
        Self {
            name: "Service".to_string(),
            path: None,
            children: Vec::new(),
            table: OnceLock::new(),
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn set_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Bind a mount path (`/todos`).
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self.table = OnceLock::new();
        self
    }

    /// Add any module as a child.
    pub fn use_module(self, module: impl Module) -> Self {
        self.use_arc(Arc::new(module))
    }

    /// Add an already shared module as a child.
    pub fn use_arc(mut self, module: Arc<dyn Module>) -> Self {
        self.children.push(module);
        self.table = OnceLock::new();
        self
    }

    pub fn use_command(self, command: Command) -> Self {
        self.use_module(command)
    }

    /// Mount `service` at `path`. The child is rebound to the path; the value
    /// passed in is consumed, so mounting the same service twice means
    /// cloning it first, which gives the second mount its own nodes.
    pub fn use_service(self, path: impl Into<String>, service: Service) -> Self {
        self.use_module(service.with_path(path))
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn children(&self) -> &[Arc<dyn Module>] {
        &self.children
    }

    /// The aggregated command table, built on first access.
    pub fn commands(&self) -> Result<&CommandTable, StructuralError> {
        self.table
            .get_or_init(|| self.aggregate())
            .as_ref()
            .map_err(Clone::clone)
    }

    fn aggregate(&self) -> Result<CommandTable, StructuralError> {
        let mut table = CommandTable::new();
        for child in &self.children {
            if let Some(command) = child.as_command() {
                table.insert(CommandEntry {
                    name: naming::camel_case(command.name()),
                    mount: "/".to_string(),
                    command: Arc::new(command.clone()),
                })?;
            } else if let Some(service) = child.as_service() {
                let path = service.path().unwrap_or("");
                for entry in service.commands()? {
                    table.insert(CommandEntry {
                        name: qualified_name(path, &entry.name),
                        mount: join_mount(path, &entry.mount),
                        command: Arc::new(entry.command.mounted(path)),
                    })?;
                }
            }
        }
        tracing::trace!(service = %self.name, commands = table.len(), "command table built");
        Ok(table)
    }

    /// Find a nested service by path, descending through services whose own
    /// path prefixes the query. `""` and `"/"` return `self`.
    pub fn get_service(&self, path: &str) -> Option<&Service> {
        let wanted = normalize_path(path);
        if wanted.is_empty() {
            return Some(self);
        }

        for child in &self.children {
            let Some(service) = child.as_service() else {
                continue;
            };
            let own = normalize_path(service.path().unwrap_or(""));
            if own.is_empty() {
                if let Some(found) = service.get_service(&wanted) {
                    return Some(found);
                }
                continue;
            }
            if wanted == own {
                return Some(service);
            }
            if let Some(rest) = wanted.strip_prefix(own.as_str()) {
                if rest.starts_with('/') {
                    if let Some(found) = service.get_service(rest) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }
}

#[async_trait]
impl Module for Service {
    fn name(&self) -> &str {
        &self.name
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn children(&self) -> &[Arc<dyn Module>] {
        &self.children
    }

    fn as_service(&self) -> Option<&Service> {
        Some(self)
    }

    fn duplicate(&self) -> Option<Arc<dyn Module>> {
        Some(Arc::new(self.clone()))
    }

    /// Start every child. If any fails, the children that did start are
    /// stopped again before the error is returned.
    async fn on_start(&self) -> anyhow::Result<()> {
        let results = join_all(self.children.iter().map(|child| child.start())).await;
        let Some(err) = results.into_iter().find_map(Result::err) else {
            return Ok(());
        };

        tracing::warn!(service = %self.name, error = %err, "start failed, stopping started children");
        let started = self.children.iter().filter(|child| child.is_active());
        for result in join_all(started.map(|child| child.stop())).await {
            if let Err(e) = result {
                tracing::warn!(service = %self.name, error = %e, "rollback stop failed");
            }
        }
        Err(err.into())
    }

    async fn on_stop(&self) -> anyhow::Result<()> {
        let results = join_all(self.children.iter().map(|child| child.stop())).await;
        match results.into_iter().find_map(Result::err) {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

/// `/todos/` → `/todos`, `todos` → `/todos`, `/` → ``.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

fn join_mount(path: &str, mount: &str) -> String {
    let path = normalize_path(path);
    let mount = normalize_path(mount);
    let joined = format!("{}{}", path, mount);
    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}
