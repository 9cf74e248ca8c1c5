//! Module — the base node of an application tree.
//!
//! Every node (command, service, or a user module owning a resource such as
//! a database connection) implements [`Module`]. Nodes are immutable once
//! built and shared as `Arc<dyn Module>`; the parent relation is not stored
//! on the node but supplied by a [`TreeCursor`] while the tree is walked.
//!
//! ## Lifecycle
//!
//! ```ignore
//! module.start().await?;   // Stopped → Started, runs on_start
//! module.start().await;    // Err(AlreadyStarted)
//! module.stop().await?;    // Started → Stopped, runs on_stop
//! ```
//!
//! ## Structural checks
//!
//! Modules declare tree requirements in [`Module::validate`]; the application
//! root runs them over every node before anything starts.
//!
//! ```ignore
//! impl Module for Database {
//!     fn lifecycle(&self) -> &Lifecycle { &self.lifecycle }
//!
//!     fn validate(&self, cursor: &TreeCursor<'_>) -> Result<(), StructuralError> {
//!         cursor.assert_single()?;
//!         cursor.assert_root_parent()
//!     }
//! }
//! ```

mod cursor;
mod lifecycle;

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::command::Command;
use crate::error::{LifecycleError, StructuralError};
use crate::service::Service;

pub use cursor::{validate_tree, TreeCursor};
pub use lifecycle::Lifecycle;

/// Upcast helper so trait objects can be queried by concrete type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A node in the application tree.
#[async_trait]
pub trait Module: AsAny + Send + Sync + 'static {
    /// Display name. Defaults to the short type name.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    fn lifecycle(&self) -> &Lifecycle;

    fn children(&self) -> &[Arc<dyn Module>] {
        &[]
    }

    fn as_command(&self) -> Option<&Command> {
        None
    }

    fn as_service(&self) -> Option<&Service> {
        None
    }

    /// A fresh, stopped copy of this node for mounting somewhere else.
    ///
    /// `None` means the node cannot be copied and stays shared; the tree
    /// validation then rejects it if it ends up mounted twice.
    fn duplicate(&self) -> Option<Arc<dyn Module>> {
        None
    }

    /// Structural assertions, run before any module starts.
    fn validate(&self, _cursor: &TreeCursor<'_>) -> Result<(), StructuralError> {
        Ok(())
    }

    async fn on_start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// `start`/`stop` for every module. Not meant to be overridden; customize
/// `on_start`/`on_stop` instead.
#[async_trait]
pub trait ModuleExt {
    fn is_active(&self) -> bool;
    async fn start(&self) -> Result<(), LifecycleError>;
    async fn stop(&self) -> Result<(), LifecycleError>;
}

#[async_trait]
impl<M: Module + ?Sized> ModuleExt for M {
    fn is_active(&self) -> bool {
        self.lifecycle().is_active()
    }

    async fn start(&self) -> Result<(), LifecycleError> {
        if !self.lifecycle().begin_start() {
            return Err(LifecycleError::AlreadyStarted(self.name().to_string()));
        }
        match self.on_start().await {
            Ok(()) => {
                self.lifecycle().finish_start(true);
                tracing::debug!(module = %self.name(), "module started");
                Ok(())
            }
            Err(source) => {
                self.lifecycle().finish_start(false);
                Err(failed(self.name(), source))
            }
        }
    }

    async fn stop(&self) -> Result<(), LifecycleError> {
        if !self.lifecycle().begin_stop() {
            return Err(LifecycleError::NotStarted(self.name().to_string()));
        }
        match self.on_stop().await {
            Ok(()) => {
                self.lifecycle().finish_stop(true);
                tracing::debug!(module = %self.name(), "module stopped");
                Ok(())
            }
            Err(source) => {
                self.lifecycle().finish_stop(false);
                Err(failed(self.name(), source))
            }
        }
    }
}

/// Keep lifecycle errors raised by children as they are; wrap anything else.
fn failed(module: &str, source: anyhow::Error) -> LifecycleError {
    match source.downcast::<LifecycleError>() {
        Ok(inner) => inner,
        Err(source) => LifecycleError::Failed {
            module: module.to_string(),
            source,
        },
    }
}

/// `my_app::db::Database<T>` → `Database`.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
