//! Symmetric difference of resource collections.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::collection::{
    children_filesystem_only, prepare, Core, Elements, ResourceCollection, ResourceIter,
};
use crate::error::{Error, Result};
use crate::resource::{Resource, ResourceKey};

/// Resources appearing an odd number of times across all nested collections.
///
/// This is a symmetric (XOR-like) difference, not "first minus the rest":
/// iterating all children in order, a resource not yet seen is recorded and a
/// resource seen before is *cancelled*. An element cancelled and seen again
/// re-enters at the end of the sequence. Surprising, but deliberate —
/// callers rely on the multi-set symmetric behavior.
///
/// Requires at least two nested collections. Caches by default.
pub struct Difference {
    core: Core<Arc<dyn ResourceCollection>>,
}

impl Difference {
    /// Create an empty difference (caching enabled).
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

    fn materialized(&self) -> Result<(Elements, u64)> {
        prepare(self, &self.core)?;
        self.core.materialize(compute)
    }
}

impl Default for Difference {
    fn default() -> Self {
        Self::new()
    }
}

fn compute(children: &[Arc<dyn ResourceCollection>]) -> Result<Vec<Arc<dyn Resource>>> {
    if children.len() < 2 {
        return Err(Error::config(
            "difference requires at least two nested collections",
        ));
    }
    // Toggle scan: tombstone on cancellation so survivors keep their
    // insertion positions and re-insertions land at the end.
    let mut slots: Vec<Option<Arc<dyn Resource>>> = Vec::new();
    let mut index: FxHashMap<ResourceKey, usize> = FxHashMap::default();
    for child in children {
        for r in child.iter()? {
            let r = r?;
            let key = r.key();
            match index.remove(&key) {
                Some(i) => slots[i] = None,
                None => {
                    index.insert(key, slots.len());
                    slots.push(Some(r));
                }
            }
        }
    }
    Ok(slots.into_iter().flatten().collect())
}

impl ResourceCollection for Difference {
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

    #[test]
    fn test_requires_two_children() {
        let d = Difference::new();
        d.add(list_of(named(&["a"])));
        assert!(matches!(d.size(), Err(Error::Config(_))));
    }

    #[test]
    fn test_symmetric_pair() {
        // A = {x, y}, B = {y, z}  =>  {x, z}
        let x = named(&["x"]).remove(0);
        let y = named(&["y"]).remove(0);
        let z = named(&["z"]).remove(0);

        let a = ResourceList::new();
        a.push(x);
        a.push(y.clone());
        let b = ResourceList::new();
        b.push(y);
        b.push(z);

        let d = Difference::new();
        d.add(Arc::new(a));
        d.add(Arc::new(b));
        assert_eq!(names_of(&d), ["x", "z"]);
    }

    #[test]
    fn test_odd_occurrences_survive() {
        // w appears in all three children: cancelled once, re-added at the end.
        let w = named(&["w"]).remove(0);
        let d = Difference::new();
        for extra in ["a", "b", "c"] {
            let l = ResourceList::new();
            l.push(w.clone());
            l.push(named(&[extra]).remove(0));
            d.add(Arc::new(l));
        }
        assert_eq!(names_of(&d), ["a", "b", "w", "c"]);
    }

    #[test]
    fn test_identical_children_cancel_out() {
        let shared = named(&["p", "q"]);
        let d = Difference::new();
        d.add(list_of(shared.clone()));
        d.add(list_of(shared));
        assert_eq!(d.size().unwrap(), 0);
    }
}
