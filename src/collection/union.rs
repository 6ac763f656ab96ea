//! Union of resource collections.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::collection::{
    children_filesystem_only, prepare, Core, Elements, ResourceCollection, ResourceIter,
};
use crate::error::Result;
use crate::resource::Resource;

/// The deduplicating union of any number of nested collections.
///
/// Elements appear in first-seen order across the concatenation of children;
/// duplicates (by identity key) collapse to the first occurrence. Caches by
/// default.
///
/// # Example
///
/// ```ignore
/// use rescollect::{ResourceCollection, Union};
///
/// let union = Union::new();
/// union.add(sources);
/// union.add(generated);
/// for r in union.iter()? {
///     println!("{:?}", r?.name());
/// }
/// ```
pub struct Union {
    core: Core<Arc<dyn ResourceCollection>>,
}

impl Union {
    /// Create an empty union (caching enabled).
    pub fn new() -> Self {
        Self {
            core: Core::new(true),
        }
    }

    /// Add a nested collection.
    pub fn add(&self, collection: Arc<dyn ResourceCollection>) {
        self.core.push(collection);
    }

    /// Enable or disable memoization of the materialized elements.
    pub fn set_cache(&self, on: bool) {
        self.core.set_cache(on);
    }

    /// Drop any memoized elements, forcing the next access to recompute.
    pub fn clear_cache(&self) {
        self.core.clear_cache();
    }

    fn materialized(&self) -> Result<(Elements, u64)> {
        prepare(self, &self.core)?;
        self.core.materialize(compute)
    }
}

impl Default for Union {
    fn default() -> Self {
        Self::new()
    }
}

fn compute(children: &[Arc<dyn ResourceCollection>]) -> Result<Vec<Arc<dyn Resource>>> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for child in children {
        for r in child.iter()? {
            let r = r?;
            if seen.insert(r.key()) {
                out.push(r);
            }
        }
    }
    Ok(out)
}

impl ResourceCollection for Union {
    fn size(&self) -> Result<usize> {
        Ok(self.materialized()?.0.len())
    }

    fn iter(&self) -> Result<ResourceIter> {
        let (items, generation) = self.materialized()?;
        Ok(ResourceIter::new(
            items,
            generation,
            self.core.generation_handle(),
        ))
    }

    fn is_filesystem_only(&self) -> Result<bool> {
        prepare(self, &self.core)?;
        children_filesystem_only(&self.core.children())
    }

    fn direct_children(&self) -> Vec<Arc<dyn ResourceCollection>> {
        self.core.children()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::tests::{list_of, named, names_of};
    use crate::collection::ResourceList;
    use crate::error::Error;

    #[test]
    fn test_first_seen_order_and_dedup() {
        let shared = named(&["b"]).remove(0);
        let a = ResourceList::new();
        a.push(named(&["a"]).remove(0));
        a.push(shared.clone());
        let b = ResourceList::new();
        b.push(shared);
        b.push(named(&["c"]).remove(0));

        let union = Union::new();
        union.add(Arc::new(a));
        union.add(Arc::new(b));
        assert_eq!(names_of(&union), ["a", "b", "c"]);
        assert_eq!(union.size().unwrap(), 3);
    }

    #[test]
    fn test_union_with_itself_is_idempotent() {
        let shared = named(&["x", "y"]);
        let a = list_of(shared.clone());
        let union = Union::new();
        union.add(a.clone());
        union.add(a);
        assert_eq!(names_of(&union), ["x", "y"]);
    }

    #[test]
    fn test_empty_union() {
        let union = Union::new();
        assert_eq!(union.size().unwrap(), 0);
        assert_eq!(union.iter().unwrap().count(), 0);
    }

    #[test]
    fn test_caching_enabled_pins_elements() {
        let nested = Arc::new(ResourceList::new());
        nested.push(named(&["a"]).remove(0));

        let union = Union::new();
        union.add(nested.clone());
        assert_eq!(names_of(&union), ["a"]);

        // The nested collection changes underneath; the memoized union
        // does not observe it.
        nested.push(named(&["b"]).remove(0));
        assert_eq!(names_of(&union), ["a"]);

        // With caching off, the live nested state shows through.
        union.set_cache(false);
        assert_eq!(names_of(&union), ["a", "b"]);
    }

    #[test]
    fn test_clear_cache_recomputes() {
        let nested = Arc::new(ResourceList::new());
        nested.push(named(&["a"]).remove(0));
        let union = Union::new();
        union.add(nested.clone());
        assert_eq!(union.size().unwrap(), 1);

        nested.push(named(&["b"]).remove(0));
        union.clear_cache();
        assert_eq!(union.size().unwrap(), 2);
    }

    #[test]
    fn test_self_reference_fails_before_iteration() {
        let union = Arc::new(Union::new());
        union.add(union.clone() as Arc<dyn ResourceCollection>);
        assert!(matches!(union.iter(), Err(Error::CircularReference(_))));
        assert!(matches!(union.size(), Err(Error::CircularReference(_))));
    }

    #[test]
    fn test_fail_fast_on_add() {
        let union = Union::new();
        union.add(list_of(named(&["a", "b"])));
        let mut it = union.iter().unwrap();
        assert!(it.next().unwrap().is_ok());

        union.add(list_of(named(&["c"])));
        assert!(matches!(
            it.next(),
            Some(Err(Error::ConcurrentModification))
        ));
    }
}
