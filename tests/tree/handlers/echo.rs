//! Command: echo
//!
//! Returns its input unchanged.

use command_tree::Command;

pub fn command() -> Command {
    Command::new("echo").handle_fn(|_, data| Ok(data))
}
