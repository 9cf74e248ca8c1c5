//! Tree cursor and structural assertions.

use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;

use super::{short_type_name, Module};
use crate::error::StructuralError;

/// A position in the tree: a node plus the chain of its ancestors.
///
/// Cursors only live for the duration of a walk, so ancestry never needs to
/// be stored on (or mutate) the nodes themselves.
#[derive(Clone, Copy)]
pub struct TreeCursor<'a> {
    node: &'a dyn Module,
    parent: Option<&'a TreeCursor<'a>>,
}

impl<'a> TreeCursor<'a> {
    pub fn root(node: &'a dyn Module) -> Self {
        Self { node, parent: None }
    }

    /// A cursor on `child`, one level below this one.
    pub fn child(&'a self, child: &'a dyn Module) -> TreeCursor<'a> {
        TreeCursor {
            node: child,
            parent: Some(self),
        }
    }

    pub fn node(&self) -> &'a dyn Module {
        self.node
    }

    pub fn parent(&self) -> Option<&'a TreeCursor<'a>> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = &'a TreeCursor<'a>> {
        std::iter::successors(self.parent, |cursor| cursor.parent)
    }

    pub fn top(&self) -> &'a dyn Module {
        self.ancestors().last().map_or(self.node, |root| root.node)
    }

    /// The parent's other children. Empty for the root.
    pub fn siblings(&self) -> impl Iterator<Item = &'a Arc<dyn Module>> {
        let me = self.node;
        let children: &'a [Arc<dyn Module>] = match self.parent {
            Some(parent) => parent.node.children(),
            None => &[],
        };
        children
            .iter()
            .filter(move |sibling| !same_node(sibling.as_ref(), me))
    }

    /// Fails if a sibling has the same concrete type as this node.
    pub fn assert_single(&self) -> Result<(), StructuralError> {
        let own = self.node.as_any().type_id();
        if self
            .siblings()
            .any(|sibling| sibling.as_ref().as_any().type_id() == own)
        {
            return Err(StructuralError::NotSingle {
                module: self.node.name().to_string(),
            });
        }
        Ok(())
    }

    pub fn assert_root(&self) -> Result<(), StructuralError> {
        if self.is_root() {
            Ok(())
        } else {
            Err(StructuralError::NotRoot {
                module: self.node.name().to_string(),
            })
        }
    }

    /// Fails unless the parent is the root.
    pub fn assert_root_parent(&self) -> Result<(), StructuralError> {
        match self.parent {
            Some(parent) if parent.is_root() => Ok(()),
            _ => Err(StructuralError::NotRootParent {
                module: self.node.name().to_string(),
            }),
        }
    }

    /// Fails unless a `T` exists somewhere in the tree.
    pub fn assert_required<T: Module>(&self) -> Result<(), StructuralError> {
        let wanted = TypeId::of::<T>();
        if any_node(self.top(), &mut |node| node.as_any().type_id() == wanted) {
            Ok(())
        } else {
            Err(StructuralError::MissingRequired {
                module: self.node.name().to_string(),
                required: short_type_name(std::any::type_name::<T>()).to_string(),
            })
        }
    }

    /// Fails if a `T` other than this node exists anywhere in the tree.
    pub fn assert_conflicting<T: Module>(&self) -> Result<(), StructuralError> {
        let unwanted = TypeId::of::<T>();
        let me = self.node;
        let found = any_node(self.top(), &mut |node| {
            node.as_any().type_id() == unwanted && !same_node(node, me)
        });
        if found {
            Err(StructuralError::Conflicting {
                module: self.node.name().to_string(),
                conflicting: short_type_name(std::any::type_name::<T>()).to_string(),
            })
        } else {
            Ok(())
        }
    }
}

fn same_node(a: &dyn Module, b: &dyn Module) -> bool {
    std::ptr::addr_eq(a as *const dyn Module, b as *const dyn Module)
}

/// Depth-first search over `node` and all its descendants.
fn any_node(node: &dyn Module, predicate: &mut dyn FnMut(&dyn Module) -> bool) -> bool {
    if predicate(node) {
        return true;
    }
    node.children()
        .iter()
        .any(|child| any_node(child.as_ref(), predicate))
}

/// Run every node's structural assertions and build every service's command
/// table, depth-first, before anything is started. A node reachable by two
/// paths is rejected: it would be started twice.
pub fn validate_tree(root: &dyn Module) -> Result<(), StructuralError> {
    validate_at(&TreeCursor::root(root), &mut HashSet::new())
}

fn validate_at(
    cursor: &TreeCursor<'_>,
    seen: &mut HashSet<*const ()>,
) -> Result<(), StructuralError> {
    let node = cursor.node();
    if !seen.insert(node as *const dyn Module as *const ()) {
        return Err(StructuralError::SharedNode {
            module: node.name().to_string(),
        });
    }
    node.validate(cursor)?;
    if let Some(service) = node.as_service() {
        service.commands()?;
    }
    for child in node.children() {
        validate_at(&cursor.child(child.as_ref()), seen)?;
    }
    Ok(())
}
