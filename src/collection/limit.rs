//! Size-limited views: first-N, last-N and all-but-last-N.
//!
//! `Last` and `AllButLast` need the nested collection's declared size to
//! locate the tail, so they reconcile it against what iteration actually
//! yields. The handling is deliberately asymmetric: a collection producing
//! *more* than it declared is tolerated with a warning and the correct slice
//! is still returned, while one producing *fewer* is self-contradictory and
//! fails loudly with a consistency error.

use std::cmp::Ordering;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::collection::{
    children_filesystem_only, prepare, Core, Elements, ResourceCollection, ResourceIter,
};
use crate::error::{Error, Result};
use crate::resource::Resource;

/// Validate a configured count, rejecting negatives.
fn valid_count(count: i64) -> Result<usize> {
    if count < 0 {
        return Err(Error::config(format!(
            "count must not be negative: {count}"
        )));
    }
    Ok(count as usize)
}

/// Collect a nested collection and reconcile its declared size against the
/// produced element count, per the asymmetric policy above.
fn collect_reconciled(nested: &dyn ResourceCollection) -> Result<Vec<Arc<dyn Resource>>> {
    let declared = nested.size()?;
    let mut all = Vec::new();
    for r in nested.iter()? {
        all.push(r?);
    }
    match all.len().cmp(&declared) {
        Ordering::Equal => {}
        Ordering::Greater => {
            log::warn!(
                "nested collection reported size {declared} but iteration produced {} resources; \
                 using the produced elements",
                all.len()
            );
        }
        Ordering::Less => {
            return Err(Error::Consistency {
                declared,
                produced: all.len(),
            });
        }
    }
    Ok(all)
}

macro_rules! limit_collection {
    ($name:ident, $doc:literal, $what:literal) => {
        #[doc = $doc]
        ///
        /// Requires exactly one nested collection and a non-negative count.
        /// Caches by default.
        pub struct $name {
            core: Core<Arc<dyn ResourceCollection>>,
            count: Mutex<usize>,
        }

        impl $name {
            /// Create the view with the given count (caching enabled).
            pub fn new(count: usize) -> Self {
                Self {
                    core: Core::new(true),
                    count: Mutex::new(count),
                }
            }

            /// Set the nested collection. Fails if one is already present.
            pub fn add(&self, collection: Arc<dyn ResourceCollection>) -> Result<()> {
                if self.core.push_limited(collection, 1) {
                    Ok(())
                } else {
                    Err(Error::config(concat!(
                        $what,
                        " accepts a single nested collection"
                    )))
                }
            }

            /// Reconfigure the count. Negative counts are a configuration
            /// error.
            pub fn set_count(&self, count: i64) -> Result<()> {
                let count = valid_count(count)?;
                *self.count.lock() = count;
                self.core.invalidate();
                Ok(())
            }

            /// Enable or disable memoization of the materialized elements.
            pub fn set_cache(&self, on: bool) {
                self.core.set_cache(on);
            }

            fn materialized(&self) -> Result<(Elements, u64)> {
                prepare(self, &self.core)?;
                let count = *self.count.lock();
                self.core.materialize(move |children| {
                    let [nested] = children else {
                        return Err(Error::config(concat!(
                            $what,
                            " requires exactly one nested collection"
                        )));
                    };
                    Self::compute(nested.as_ref(), count)
                })
            }
        }

        impl ResourceCollection for $name {
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
    };
}

limit_collection!(
    First,
    "The first N elements of the nested collection, in iteration order.",
    "first"
);

impl First {
    fn compute(nested: &dyn ResourceCollection, count: usize) -> Result<Vec<Arc<dyn Resource>>> {
        let mut out = Vec::new();
        for r in nested.iter()? {
            if out.len() == count {
                break;
            }
            out.push(r?);
        }
        Ok(out)
    }
}

limit_collection!(
    Last,
    "The last N elements of the nested collection, in iteration order.",
    "last"
);

impl Last {
    fn compute(nested: &dyn ResourceCollection, count: usize) -> Result<Vec<Arc<dyn Resource>>> {
        let mut all = collect_reconciled(nested)?;
        let keep = count.min(all.len());
        Ok(all.split_off(all.len() - keep))
    }
}

limit_collection!(
    AllButLast,
    "Every element of the nested collection except the last N.",
    "allbutlast"
);

impl AllButLast {
    fn compute(nested: &dyn ResourceCollection, count: usize) -> Result<Vec<Arc<dyn Resource>>> {
        let mut all = collect_reconciled(nested)?;
        let drop = count.min(all.len());
        all.truncate(all.len() - drop);
        Ok(all)
    }
}
