//! App — the root of a module tree.
//!
//! The app assembles the tree (forcing every command table so collisions
//! surface immediately), validates it before anything starts, owns the
//! resources injected into every call, and decides per call whether a
//! command runs here or is forwarded to a connected client.
//!
//! ```ignore
//! let app = App::new(Service::new().use_service("/todos", todos()))?
//!     .with_resource(Database::connect(url));
//!
//! app.start().await?;                       // validate, then start every module
//! let todos = app.execute("todosGet", json!({})).await?;
//!
//! // Same tree, acting as a router to a remote server
//! let proxy = App::new(tree())?.with_client(HttpClient::new("http://api:3000"));
//! let todos = proxy.execute("todosGet", json!({})).await?;
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::command::{Context, Executor, Resources, Session};
use crate::connection::Client;
use crate::error::{CommandError, LifecycleError, StructuralError};
use crate::module::{validate_tree, ModuleExt};
use crate::service::{CommandEntry, CommandTable, Service};

/// An assembled application.
pub struct App {
    root: Arc<Service>,
    table: CommandTable,
    resources: Resources,
    client: Option<Arc<dyn Client>>,
}

impl App {
    /// Assemble the tree. Fails on any command-name collision.
    pub fn new(root: Service) -> Result<Self, StructuralError> {
        let table = root.commands()?.clone();
        Ok(Self {
            root: Arc::new(root),
            table,
            resources: Resources::new(),
            client: None,
        })
    }

    /// Inject a collaborator, reachable from every hook via
    /// [`Context::resource`].
    pub fn with_resource<T: Send + Sync + 'static>(mut self, resource: T) -> Self {
        self.resources = self.resources.insert(resource);
        self
    }

    /// Attach an outbound client. From then on every call is forwarded.
    pub fn with_client(mut self, client: impl Client + 'static) -> Self {
        self.client = Some(Arc::new(client));
        self
    }

    pub fn with_shared_client(mut self, client: Arc<dyn Client>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn root(&self) -> &Service {
        &self.root
    }

    pub fn commands(&self) -> &CommandTable {
        &self.table
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn has_client(&self) -> bool {
        self.client.is_some()
    }

    /// Local unless a client is attached.
    pub fn executor(&self) -> Executor {
        match &self.client {
            Some(client) => Executor::Remote(client.clone()),
            None => Executor::Local,
        }
    }

    /// Run every structural assertion in the tree.
    pub fn validate(&self) -> Result<(), StructuralError> {
        validate_tree(self.root.as_ref())
    }

    /// Validate the whole tree, then start it. No module starts if any
    /// assertion fails.
    pub async fn start(&self) -> Result<(), LifecycleError> {
        self.validate()?;
        self.root.start().await?;
        tracing::info!(
            commands = self.table.len(),
            remote = self.has_client(),
            "application started"
        );
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), LifecycleError> {
        self.root.stop().await?;
        tracing::info!("application stopped");
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.root.is_active()
    }

    /// Execute a command by qualified name with an empty session.
    pub async fn execute(&self, name: &str, input: Value) -> Result<Value, CommandError> {
        self.execute_with_session(name, input, Session::new()).await
    }

    pub async fn execute_with_session(
        &self,
        name: &str,
        input: Value,
        session: Session,
    ) -> Result<Value, CommandError> {
        let entry = self
            .table
            .get(name)
            .ok_or_else(|| CommandError::not_found(format!("unknown command: {}", name)))?;
        self.execute_entry(entry, input, session).await
    }

    /// Execute an entry of this app's table.
    pub async fn execute_entry(
        &self,
        entry: &CommandEntry,
        input: Value,
        session: Session,
    ) -> Result<Value, CommandError> {
        let executor = self.executor();
        let mut ctx = Context::new(
            entry.command.runtime(&entry.name),
            session,
            self.resources.clone(),
        );

        tracing::debug!(command = %entry.name, executor = ?executor, "dispatching command");
        let result = executor.run(&entry.command, &mut ctx, input).await;

        if let Err(err) = &result {
            if err.status_code() >= 500 {
                tracing::warn!(command = %entry.name, code = err.status_code(), error = %err.message, "command failed");
            } else {
                tracing::debug!(command = %entry.name, code = err.status_code(), "command rejected");
            }
        }
        result
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("commands", &self.table.names())
            .field("resources", &self.resources.len())
            .field("remote", &self.has_client())
            .finish()
    }
}
