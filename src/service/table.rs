//! The flat, collision-checked command table a service aggregates.

use std::collections::HashMap;
use std::sync::Arc;

use crate::command::Command;
use crate::error::StructuralError;

/// One aggregated command.
#[derive(Debug, Clone)]
pub struct CommandEntry {
    /// Qualified, camel-cased name (`todosGet`).
    pub name: String,
    /// Where the command was mounted, relative to the aggregating service.
    pub mount: String,
    /// The command, rebound under its mount path.
    pub command: Arc<Command>,
}

/// Name → command, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct CommandTable {
    entries: Vec<CommandEntry>,
    index: HashMap<String, usize>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. A name that is already present is a structural error
    /// naming both mount points.
    pub fn insert(&mut self, entry: CommandEntry) -> Result<(), StructuralError> {
        if let Some(&existing) = self.index.get(&entry.name) {
            return Err(StructuralError::CommandCollision {
                name: entry.name,
                first: self.entries[existing].mount.clone(),
                second: entry.mount,
            });
        }
        self.index.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a CommandTable {
    type Item = &'a CommandEntry;
    type IntoIter = std::slice::Iter<'a, CommandEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
