//! Local vs. remote execution of a command.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::context::Context;
use super::Command;
use crate::connection::{Client, RemoteCall};
use crate::error::CommandError;

/// How a call is carried out, resolved once per call from what is attached
/// to the application root.
#[derive(Clone)]
pub enum Executor {
    /// Run the command's pipeline in this process.
    Local,
    /// Serialize the input and hand it to a connected client; this process
    /// only routes.
    Remote(Arc<dyn Client>),
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Executor::Local => f.write_str("Local"),
            Executor::Remote(_) => f.write_str("Remote"),
        }
    }
}

impl Executor {
    pub fn is_remote(&self) -> bool {
        matches!(self, Executor::Remote(_))
    }

    pub async fn run(
        &self,
        command: &Command,
        ctx: &mut Context,
        input: Value,
    ) -> Result<Value, CommandError> {
        match self {
            Executor::Local => command.run_pipeline(ctx, input).await,
            Executor::Remote(client) => {
                let request = command.to_request(&input)?;
                client
                    .dispatch(RemoteCall {
                        name: ctx.name(),
                        data: &input,
                        request,
                        session: ctx.session(),
                    })
                    .await
            }
        }
    }
}
