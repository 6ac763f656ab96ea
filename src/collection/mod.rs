//! Resource collections and their algebra.
//!
//! A [`ResourceCollection`] is a restartable, sized sequence of resources.
//! Composites consume other collections and produce new ones lazily:
//!
//! - [`Union`], [`Intersect`], [`Difference`]: set algebra over identity keys
//! - [`Restrict`]: selector-filtered view
//! - [`Sort`]: comparator-stack ordering
//! - [`First`], [`Last`], [`AllButLast`]: size-limited views
//! - [`MappedResourceCollection`]: name remapping
//! - [`ArchiveExploder`]: archive → entry resources
//!
//! # Evaluation
//!
//! ```text
//! size() / iter()
//!   ├── 1. cycle-guard validation (skipped while the checked flag is sticky)
//!   ├── 2. cache lookup, when caching is enabled and nothing mutated
//!   ├── 3. compute: pull children, apply the composite's operator
//!   └── 4. fail-fast iterator carrying the generation at creation
//! ```
//!
//! Structural mutation (adding a child, a selector, a comparator, changing a
//! count) atomically drops the memoized elements, bumps the generation
//! counter and clears the checked flag; live iterators observe the bump and
//! fail with [`Error::ConcurrentModification`] on their next step instead of
//! yielding stale data.
//!
//! [`Union`]: union::Union
//! [`Intersect`]: intersect::Intersect
//! [`Difference`]: difference::Difference
//! [`Restrict`]: restrict::Restrict
//! [`Sort`]: sort::Sort
//! [`First`]: limit::First
//! [`Last`]: limit::Last
//! [`AllButLast`]: limit::AllButLast
//! [`MappedResourceCollection`]: mapped::MappedResourceCollection
//! [`ArchiveExploder`]: explode::ArchiveExploder
//! [`Error::ConcurrentModification`]: crate::Error::ConcurrentModification

pub mod difference;
pub mod explode;
pub mod intersect;
pub mod limit;
pub mod mapped;
pub mod restrict;
pub mod sort;
pub mod union;

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::cycle;
use crate::error::{Error, Result};
use crate::resource::Resource;

/// A materialized element list, shared between cache and iterators.
pub(crate) type Elements = Arc<Vec<Arc<dyn Resource>>>;

// =============================================================================
// ResourceCollection Trait
// =============================================================================

/// A restartable, sized sequence of [`Resource`]s.
///
/// `size()` is consistent with the element count iteration produces whenever
/// caching is enabled; a nested collection violating that contract is a
/// consistency error (see [`Last`]).
///
/// [`Last`]: limit::Last
pub trait ResourceCollection: Send + Sync {
    /// Number of resources this collection produces.
    fn size(&self) -> Result<usize> {
        let mut n = 0;
        for r in self.iter()? {
            r?;
            n += 1;
        }
        Ok(n)
    }

    /// Start a fresh iteration.
    fn iter(&self) -> Result<ResourceIter>;

    /// Whether every contained resource is file-backed.
    fn is_filesystem_only(&self) -> Result<bool>;

    /// The directly nested collections, for cycle validation.
    fn direct_children(&self) -> Vec<Arc<dyn ResourceCollection>> {
        Vec::new()
    }
}

// =============================================================================
// Fail-Fast Iterator
// =============================================================================

/// Iterator over a materialized element snapshot.
///
/// Captures the owning collection's generation at creation; once the
/// collection mutates structurally, every further [`Iterator::next`] call
/// yields [`Error::ConcurrentModification`] rather than stale elements.
///
/// Not meant to be shared across threads mid-iteration; the fail-fast check
/// runs on each step, so a mutation between a check and a use manifests on
/// the next call, never as silent skew.
///
/// [`Error::ConcurrentModification`]: crate::Error::ConcurrentModification
pub struct ResourceIter {
    items: Elements,
    index: usize,
    generation: u64,
    live: Arc<AtomicU64>,
}

impl ResourceIter {
    pub(crate) fn new(items: Elements, generation: u64, live: Arc<AtomicU64>) -> Self {
        Self {
            items,
            index: 0,
            generation,
            live,
        }
    }
}

impl Iterator for ResourceIter {
    type Item = Result<Arc<dyn Resource>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.live.load(AtomicOrdering::SeqCst) != self.generation {
            return Some(Err(Error::ConcurrentModification));
        }
        let item = self.items.get(self.index)?.clone();
        self.index += 1;
        Some(Ok(item))
    }
}

// =============================================================================
// Core - Shared Composite State
// =============================================================================

/// Shared state of a mutable collection: payload list, cache slot, sticky
/// checked flag, and the generation counter iterators validate against.
///
/// `C` is `Arc<dyn ResourceCollection>` for composites and
/// `Arc<dyn Resource>` for the leaf [`ResourceList`].
pub(crate) struct Core<C> {
    generation: Arc<AtomicU64>,
    state: Mutex<CoreState<C>>,
}

struct CoreState<C> {
    children: Vec<C>,
    cache: bool,
    cached: Option<Elements>,
    checked: bool,
}

impl<C: Clone> Core<C> {
    pub(crate) fn new(cache: bool) -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            state: Mutex::new(CoreState {
                children: Vec::new(),
                cache,
                cached: None,
                checked: false,
            }),
        }
    }

    /// Append a child; a structural mutation.
    pub(crate) fn push(&self, child: C) {
        let mut state = self.state.lock();
        state.children.push(child);
        self.touch(&mut state);
    }

    /// Append a child unless `max` children are already present.
    pub(crate) fn push_limited(&self, child: C, max: usize) -> bool {
        let mut state = self.state.lock();
        if state.children.len() >= max {
            return false;
        }
        state.children.push(child);
        self.touch(&mut state);
        true
    }

    pub(crate) fn children(&self) -> Vec<C> {
        self.state.lock().children.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().children.len()
    }

    /// Toggle memoization. Turning it off drops the memo; neither direction
    /// is a structural mutation.
    pub(crate) fn set_cache(&self, on: bool) {
        let mut state = self.state.lock();
        state.cache = on;
        if !on {
            state.cached = None;
        }
    }

    pub(crate) fn cache_enabled(&self) -> bool {
        self.state.lock().cache
    }

    /// Drop the memoized elements without invalidating iterators.
    pub(crate) fn clear_cache(&self) {
        self.state.lock().cached = None;
    }

    /// Record a structural mutation that did not go through [`Core::push`].
    pub(crate) fn invalidate(&self) {
        let mut state = self.state.lock();
        self.touch(&mut state);
    }

    pub(crate) fn is_checked(&self) -> bool {
        self.state.lock().checked
    }

    pub(crate) fn set_checked(&self) {
        self.state.lock().checked = true;
    }

    pub(crate) fn generation_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.generation)
    }

    /// Cached-or-computed elements plus the generation they belong to.
    ///
    /// The compute closure runs outside the lock so children of this
    /// collection can be other live collections; the result is only stored
    /// back when no mutation interleaved.
    pub(crate) fn materialize(
        &self,
        compute: impl FnOnce(&[C]) -> Result<Vec<Arc<dyn Resource>>>,
    ) -> Result<(Elements, u64)> {
        let (children, generation, cache) = {
            let state = self.state.lock();
            if state.cache {
                if let Some(cached) = &state.cached {
                    return Ok((
                        Arc::clone(cached),
                        self.generation.load(AtomicOrdering::SeqCst),
                    ));
                }
            }
            (
                state.children.clone(),
                self.generation.load(AtomicOrdering::SeqCst),
                state.cache,
            )
        };
        let items: Elements = Arc::new(compute(&children)?);
        if cache {
            let mut state = self.state.lock();
            if self.generation.load(AtomicOrdering::SeqCst) == generation {
                state.cached = Some(Arc::clone(&items));
            }
        }
        Ok((items, generation))
    }

    fn touch(&self, state: &mut CoreState<C>) {
        state.cached = None;
        state.checked = false;
        self.generation.fetch_add(1, AtomicOrdering::SeqCst);
    }
}

/// Cycle-validate a composite, honoring its sticky checked flag.
pub(crate) fn prepare<C: Clone>(this: &dyn ResourceCollection, core: &Core<C>) -> Result<()> {
    if core.is_checked() {
        return Ok(());
    }
    cycle::check_cycles(this)?;
    core.set_checked();
    Ok(())
}

/// Whether every child collection is filesystem-only.
pub(crate) fn children_filesystem_only(children: &[Arc<dyn ResourceCollection>]) -> Result<bool> {
    for child in children {
        if !child.is_filesystem_only()? {
            return Ok(false);
        }
    }
    Ok(true)
}

// =============================================================================
// ResourceList - Leaf Collection
// =============================================================================

/// A plain, push-mutable list of resources: the leaf of every collection
/// tree. Mutation fail-fasts live iterators like any composite.
pub struct ResourceList {
    core: Core<Arc<dyn Resource>>,
}

impl ResourceList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            core: Core::new(false),
        }
    }

    /// Create a list holding a single resource.
    pub fn singleton(resource: Arc<dyn Resource>) -> Self {
        let list = Self::new();
        list.push(resource);
        list
    }

    /// Append a resource.
    pub fn push(&self, resource: Arc<dyn Resource>) {
        self.core.push(resource);
    }

    /// Number of resources currently held.
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.core.len() == 0
    }
}

impl Default for ResourceList {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Arc<dyn Resource>> for ResourceList {
    fn from_iter<T: IntoIterator<Item = Arc<dyn Resource>>>(iter: T) -> Self {
        let list = Self::new();
        for r in iter {
            list.push(r);
        }
        list
    }
}

impl ResourceCollection for ResourceList {
    fn size(&self) -> Result<usize> {
        Ok(self.core.len())
    }

    fn iter(&self) -> Result<ResourceIter> {
        let (items, generation) = self.core.materialize(|items| Ok(items.to_vec()))?;
        Ok(ResourceIter::new(
            items,
            generation,
            self.core.generation_handle(),
        ))
    }

    fn is_filesystem_only(&self) -> Result<bool> {
        Ok(self
            .core
            .children()
            .iter()
            .all(|r| r.as_file_backed().is_some()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::resource::file::FileResource;
    use crate::resource::string::StringResource;

    /// Named string resources for collection tests.
    pub(crate) fn named(names: &[&str]) -> Vec<Arc<dyn Resource>> {
        names
            .iter()
            .map(|n| Arc::new(StringResource::new(*n).with_name(*n)) as Arc<dyn Resource>)
            .collect()
    }

    pub(crate) fn list_of(resources: Vec<Arc<dyn Resource>>) -> Arc<dyn ResourceCollection> {
        Arc::new(resources.into_iter().collect::<ResourceList>())
    }

    pub(crate) fn names_of(c: &dyn ResourceCollection) -> Vec<String> {
        c.iter()
            .unwrap()
            .map(|r| r.unwrap().name().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_list_size_and_iteration_agree() {
        let list = ResourceList::new();
        for r in named(&["a", "b", "c"]) {
            list.push(r);
        }
        assert_eq!(list.size().unwrap(), 3);
        assert_eq!(list.iter().unwrap().count(), 3);
    }

    #[test]
    fn test_fail_fast_on_mutation() {
        let list = ResourceList::new();
        for r in named(&["a", "b"]) {
            list.push(r);
        }
        let mut it = list.iter().unwrap();
        assert!(it.next().unwrap().is_ok());

        list.push(named(&["c"]).remove(0));
        assert!(matches!(
            it.next(),
            Some(Err(Error::ConcurrentModification))
        ));
        // The failure is sticky: the iterator never recovers.
        assert!(matches!(
            it.next(),
            Some(Err(Error::ConcurrentModification))
        ));
    }

    #[test]
    fn test_fresh_iterator_after_mutation_is_fine() {
        let list = ResourceList::new();
        list.push(named(&["a"]).remove(0));
        let _ = list.iter().unwrap();
        list.push(named(&["b"]).remove(0));
        assert_eq!(list.iter().unwrap().count(), 2);
    }

    #[test]
    fn test_filesystem_only() {
        let files = ResourceList::new();
        files.push(Arc::new(FileResource::new("/tmp/a")));
        assert!(files.is_filesystem_only().unwrap());

        files.push(named(&["s"]).remove(0));
        assert!(!files.is_filesystem_only().unwrap());
    }
}
