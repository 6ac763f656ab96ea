//! Selector-filtered view of a collection.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::collection::{
    children_filesystem_only, prepare, Core, Elements, ResourceCollection, ResourceIter,
};
use crate::error::{Error, Result};
use crate::resource::Resource;

// =============================================================================
// Selector
// =============================================================================

/// A predicate over resources, used by [`Restrict`].
///
/// Implemented for plain closures:
///
/// ```ignore
/// restrict.add_selector(|r: &dyn Resource| r.size() > 0);
/// ```
pub trait Selector: Send + Sync {
    /// Whether the resource passes this selector.
    fn is_selected(&self, resource: &dyn Resource) -> bool;
}

impl<F> Selector for F
where
    F: Fn(&dyn Resource) -> bool + Send + Sync,
{
    fn is_selected(&self, resource: &dyn Resource) -> bool {
        self(resource)
    }
}

/// Selects resources that currently exist.
pub struct ExistsSelector;

impl Selector for ExistsSelector {
    fn is_selected(&self, resource: &dyn Resource) -> bool {
        resource.exists()
    }
}

// =============================================================================
// Restrict
// =============================================================================

/// The nested collection filtered through an ordered list of selectors.
///
/// A resource is included iff **all** selectors accept it; evaluation
/// short-circuits on the first rejection. Zero selectors is a passthrough,
/// and no nested collection at all yields an empty sequence. At most one
/// nested collection may be added. Caches by default.
pub struct Restrict {
    core: Core<Arc<dyn ResourceCollection>>,
    selectors: Mutex<Vec<Arc<dyn Selector>>>,
}

impl Restrict {
    /// Create an empty restriction (caching enabled).
    pub fn new() -> Self {
        Self {
            core: Core::new(true),
            selectors: Mutex::new(Vec::new()),
        }
    }

    /// Set the nested collection. Fails if one is already present.
    pub fn add(&self, collection: Arc<dyn ResourceCollection>) -> Result<()> {
        if self.core.push_limited(collection, 1) {
            Ok(())
        } else {
            Err(Error::config(
                "restrict accepts a single nested collection",
            ))
        }
    }

    /// Append a selector. Selectors run in the order they were added.
    pub fn add_selector(&self, selector: impl Selector + 'static) {
        self.selectors.lock().push(Arc::new(selector));
        self.core.invalidate();
    }

    /// Enable or disable memoization of the materialized elements.
    pub fn set_cache(&self, on: bool) {
        self.core.set_cache(on);
    }

    fn materialized(&self) -> Result<(Elements, u64)> {
        prepare(self, &self.core)?;
        let selectors = self.selectors.lock().clone();
        self.core.materialize(move |children| {
            let mut out = Vec::new();
            for child in children {
                for r in child.iter()? {
                    let r = r?;
                    if selectors.iter().all(|s| s.is_selected(r.as_ref())) {
                        out.push(r);
                    }
                }
            }
            Ok(out)
        })
    }
}

impl Default for Restrict {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCollection for Restrict {
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
