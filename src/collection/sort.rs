//! Comparator-stack sorting of a collection.

use std::cmp::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::collection::{
    children_filesystem_only, prepare, Core, Elements, ResourceCollection, ResourceIter,
};
use crate::error::{Error, Result};
use crate::resource::{natural_order, Resource};

/// A comparison function over resources.
pub type Comparator = Arc<dyn Fn(&dyn Resource, &dyn Resource) -> Ordering + Send + Sync>;

/// The nested collection's elements in sorted order.
///
/// With no comparators, natural (identity-key) ordering applies. With
/// comparators, each is one full **stable** sort pass, run in reverse of
/// configuration order: the last-added comparator runs first and the
/// first-added runs last, so the first-added ordering dominates and later
/// ones only break its ties. Sorting by size then by name therefore groups
/// by size, with same-size elements ordered by name.
///
/// Requires exactly one nested collection. Caches by default.
pub struct Sort {
    core: Core<Arc<dyn ResourceCollection>>,
    comparators: Mutex<Vec<Comparator>>,
}

impl Sort {
    /// Create an empty sort (caching enabled).
    pub fn new() -> Self {
        Self {
            core: Core::new(true),
            comparators: Mutex::new(Vec::new()),
        }
    }

    /// Set the nested collection. Fails if one is already present.
    pub fn add(&self, collection: Arc<dyn ResourceCollection>) -> Result<()> {
        if self.core.push_limited(collection, 1) {
            Ok(())
        } else {
            Err(Error::config("sort accepts a single nested collection"))
        }
    }

    /// Push a comparator onto the configuration stack.
    pub fn add_comparator(
        &self,
        comparator: impl Fn(&dyn Resource, &dyn Resource) -> Ordering + Send + Sync + 'static,
    ) {
        self.comparators.lock().push(Arc::new(comparator));
        self.core.invalidate();
    }

    /// Enable or disable memoization of the materialized elements.
    pub fn set_cache(&self, on: bool) {
        self.core.set_cache(on);
    }

    fn materialized(&self) -> Result<(Elements, u64)> {
        prepare(self, &self.core)?;
        let comparators = self.comparators.lock().clone();
        self.core.materialize(move |children| {
            if children.len() != 1 {
                return Err(Error::config(
                    "sort requires exactly one nested collection",
                ));
            }
            let mut items = Vec::new();
            for r in children[0].iter()? {
                items.push(r?);
            }
            if comparators.is_empty() {
                items.sort_by(|a, b| natural_order(a.as_ref(), b.as_ref()));
            } else {
                // Last-added first; the final (first-added) pass dominates.
                for comparator in comparators.iter().rev() {
                    items.sort_by(|a, b| comparator(a.as_ref(), b.as_ref()));
                }
            }
            Ok(items)
        })
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCollection for Sort {
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
    use crate::collection::tests::{list_of, names_of};
    use crate::collection::ResourceList;
    use crate::resource::string::StringResource;

    fn sized(name: &str, content: &str) -> Arc<dyn Resource> {
        Arc::new(StringResource::new(content).with_name(name))
    }

    #[test]
    fn test_requires_exactly_one_child() {
        let s = Sort::new();
        assert!(matches!(s.size(), Err(Error::Config(_))));
        s.add(list_of(vec![sized("a", "x")])).unwrap();
        assert!(matches!(
            s.add(list_of(vec![sized("b", "y")])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_single_comparator() {
        let list = ResourceList::new();
        list.push(sized("c", "3"));
        list.push(sized("a", "1"));
        list.push(sized("b", "2"));

        let s = Sort::new();
        s.add(Arc::new(list)).unwrap();
        s.add_comparator(|x, y| x.name().cmp(&y.name()));
        assert_eq!(names_of(&s), ["a", "b", "c"]);
    }

    #[test]
    fn test_first_added_comparator_dominates() {
        // Duplicate sizes; size comparator added first, name second.
        let list = ResourceList::new();
        list.push(sized("delta", "22"));
        list.push(sized("bravo", "1"));
        list.push(sized("alpha", "22"));
        list.push(sized("charlie", "1"));

        let s = Sort::new();
        s.add(Arc::new(list)).unwrap();
        s.add_comparator(|x, y| x.size().cmp(&y.size()));
        s.add_comparator(|x, y| x.name().cmp(&y.name()));

        // Grouped by size ascending, ties ordered by name.
        assert_eq!(names_of(&s), ["bravo", "charlie", "alpha", "delta"]);
    }

    #[test]
    fn test_stability_within_ties() {
        // One comparator that considers everything equal keeps input order.
        let list = ResourceList::new();
        for n in ["z", "m", "a"] {
            list.push(sized(n, "x"));
        }
        let s = Sort::new();
        s.add(Arc::new(list)).unwrap();
        s.add_comparator(|_, _| Ordering::Equal);
        assert_eq!(names_of(&s), ["z", "m", "a"]);
    }

    #[test]
    fn test_adding_comparator_invalidates() {
        let s = Sort::new();
        s.add(list_of(vec![sized("b", "x"), sized("a", "y")]))
            .unwrap();
        let mut it = s.iter().unwrap();
        assert!(it.next().unwrap().is_ok());

        s.add_comparator(|x, y| x.name().cmp(&y.name()));
        assert!(matches!(
            it.next(),
            Some(Err(Error::ConcurrentModification))
        ));
        assert_eq!(names_of(&s), ["a", "b"]);
    }
}
