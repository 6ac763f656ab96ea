//! Intersection of resource collections.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::collection::{
    children_filesystem_only, prepare, Core, Elements, ResourceCollection, ResourceIter,
};
use crate::error::{Error, Result};
use crate::resource::Resource;

/// Resources present in every nested collection, in the first child's order.
///
/// Requires at least two nested collections; fewer is a configuration error
/// surfaced on first use. Caches by default.
pub struct Intersect {
    core: Core<Arc<dyn ResourceCollection>>,
}

impl Intersect {
    /// Create an empty intersection (caching enabled).
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

impl Default for Intersect {
    fn default() -> Self {
        Self::new()
    }
}

fn compute(children: &[Arc<dyn ResourceCollection>]) -> Result<Vec<Arc<dyn Resource>>> {
    if children.len() < 2 {
        return Err(Error::config(
            "intersect requires at least two nested collections",
        ));
    }
    // First child establishes candidates and order.
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for r in children[0].iter()? {
        let r = r?;
        if seen.insert(r.key()) {
            out.push(r);
        }
    }
    for child in &children[1..] {
        let mut keys = FxHashSet::default();
        for r in child.iter()? {
            keys.insert(r?.key());
        }
        out.retain(|r| keys.contains(&r.key()));
    }
    Ok(out)
}

impl ResourceCollection for Intersect {
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
        let i = Intersect::new();
        assert!(matches!(i.size(), Err(Error::Config(_))));
        i.add(list_of(named(&["a"])));
        assert!(matches!(i.iter(), Err(Error::Config(_))));
    }

    #[test]
    fn test_disjoint_children_yield_empty() {
        let i = Intersect::new();
        i.add(list_of(named(&["a"])));
        i.add(list_of(named(&["b"])));
        assert_eq!(i.size().unwrap(), 0);
    }

    #[test]
    fn test_common_elements_in_first_child_order() {
        let one = named(&["1"]).remove(0);
        let two = named(&["2"]).remove(0);
        let three = named(&["3"]).remove(0);

        let a = ResourceList::new();
        a.push(three.clone());
        a.push(one.clone());
        a.push(two.clone());
        let b = ResourceList::new();
        b.push(one);
        b.push(three);

        let i = Intersect::new();
        i.add(Arc::new(a));
        i.add(Arc::new(b));
        assert_eq!(names_of(&i), ["3", "1"]);
        drop(two);
    }

    #[test]
    fn test_three_way() {
        let x = named(&["x"]).remove(0);
        let lists: Vec<_> = (0..3)
            .map(|i| {
                let l = ResourceList::new();
                l.push(x.clone());
                l.push(named(&[format!("only-{i}").as_str()]).remove(0));
                Arc::new(l) as Arc<dyn ResourceCollection>
            })
            .collect();

        let i = Intersect::new();
        for l in lists {
            i.add(l);
        }
        assert_eq!(names_of(&i), ["x"]);
    }
}
