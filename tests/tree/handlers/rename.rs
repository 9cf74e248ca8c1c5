//! Command: rename
//!
//! Typed input and output, addressed by id.

use command_tree::{Command, CommandError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct Input {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Output {
    pub id: String,
    pub name: String,
    pub renamed: bool,
}

pub fn command() -> Command {
    Command::new("patchName")
        .set_path("/{id}/name")
        .unwrap()
        .handle_typed(|_, input: Input| async move {
            if input.name.trim().is_empty() {
                return Err(CommandError::unprocessable("name must not be blank"));
            }
            Ok(Output {
                id: input.id,
                name: input.name,
                renamed: true,
            })
        })
}
