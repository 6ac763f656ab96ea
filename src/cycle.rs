//! Cycle guard for nested collection graphs.
//!
//! The named-alias mechanism makes it possible to wire a composite so that it
//! ends up nested inside itself. Before any computation, the structure is
//! walked depth-first with an explicit visitation stack of node addresses; a
//! node already on the stack means the graph loops, and the walk fails with
//! [`Error::CircularReference`] instead of recursing forever.

use std::sync::Arc;

use crate::collection::ResourceCollection;
use crate::error::{Error, Result};

/// Validate that no collection in the nested graph contains itself.
pub(crate) fn check_cycles(root: &dyn ResourceCollection) -> Result<()> {
    let mut stack = Vec::new();
    visit(addr_of(root), root, &mut stack)
}

/// Thin address of a collection, used as node identity during the walk.
fn addr_of(node: &dyn ResourceCollection) -> usize {
    (node as *const dyn ResourceCollection).cast::<()>() as usize
}

fn visit(addr: usize, node: &dyn ResourceCollection, stack: &mut Vec<usize>) -> Result<()> {
    if stack.contains(&addr) {
        return Err(Error::CircularReference(
            "collection graph nests itself".to_string(),
        ));
    }
    stack.push(addr);
    for child in node.direct_children() {
        let child_addr = Arc::as_ptr(&child).cast::<()>() as usize;
        visit(child_addr, child.as_ref(), stack)?;
    }
    stack.pop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::union::Union;

    #[test]
    fn test_acyclic_graph_passes() {
        let inner = Arc::new(Union::new());
        let outer = Union::new();
        outer.add(inner);
        assert!(check_cycles(&outer).is_ok());
    }

    #[test]
    fn test_direct_self_nesting_detected() {
        let u = Arc::new(Union::new());
        u.add(u.clone() as Arc<dyn ResourceCollection>);
        assert!(matches!(
            check_cycles(u.as_ref()),
            Err(Error::CircularReference(_))
        ));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        // The same collection nested twice, but never inside itself.
        let shared: Arc<dyn ResourceCollection> = Arc::new(Union::new());
        let left = Arc::new(Union::new());
        left.add(shared.clone());
        let right = Arc::new(Union::new());
        right.add(shared);
        let top = Union::new();
        top.add(left);
        top.add(right);
        assert!(check_cycles(&top).is_ok());
    }

    #[test]
    fn test_deep_chain_terminates() {
        let mut current = Arc::new(Union::new());
        let bottom = current.clone();
        for _ in 0..1000 {
            let next = Arc::new(Union::new());
            next.add(current.clone() as Arc<dyn ResourceCollection>);
            current = next;
        }
        assert!(check_cycles(current.as_ref()).is_ok());

        // Close the loop at the bottom and the same walk must now fail,
        // still without hanging.
        bottom.add(current.clone() as Arc<dyn ResourceCollection>);
        assert!(matches!(
            check_cycles(current.as_ref()),
            Err(Error::CircularReference(_))
        ));
    }
}
