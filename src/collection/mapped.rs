//! Name-remapping view of a collection.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::collection::{prepare, Core, Elements, ResourceCollection, ResourceIter};
use crate::error::{Error, Result};
use crate::resource::mapped::MappedResource;
use crate::resource::Resource;

// =============================================================================
// NameMapper
// =============================================================================

/// Maps one resource name to zero, one or many output names.
///
/// Returning an empty vector drops the resource. Implemented for plain
/// closures:
///
/// ```ignore
/// mapped.set_mapper(|name: &str| vec![format!("out/{name}")]).unwrap();
/// ```
pub trait NameMapper: Send + Sync {
    /// The output names for one input name.
    fn map(&self, name: &str) -> Vec<String>;
}

impl<F> NameMapper for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn map(&self, name: &str) -> Vec<String> {
        self(name)
    }
}

/// Maps every input name to one fixed output name.
pub struct MergeMapper {
    to: String,
}

impl MergeMapper {
    /// Create a mapper producing `to` for every input.
    pub fn new(to: impl Into<String>) -> Self {
        Self { to: to.into() }
    }
}

impl NameMapper for MergeMapper {
    fn map(&self, _name: &str) -> Vec<String> {
        vec![self.to.clone()]
    }
}

/// Strips any leading path, keeping the base name.
pub struct FlatMapper;

impl NameMapper for FlatMapper {
    fn map(&self, name: &str) -> Vec<String> {
        let base = name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(name)
            .to_string();
        vec![base]
    }
}

// =============================================================================
// MappedResourceCollection
// =============================================================================

/// The nested collection with every resource renamed through a [`NameMapper`].
///
/// In single-mapping mode (the default), only the first mapped name is used
/// per input resource. With multiple mappings enabled, every mapped name
/// produces a distinct decorated resource sharing the same underlying
/// content. A mapper returning no names drops the resource; without a mapper
/// the collection is an identity passthrough. Decorated resources suppress
/// the file-backed capability (see [`MappedResource`]). Caches by default.
pub struct MappedResourceCollection {
    core: Core<Arc<dyn ResourceCollection>>,
    mapper: Mutex<Option<Arc<dyn NameMapper>>>,
    multiple: Mutex<bool>,
}

impl MappedResourceCollection {
    /// Create an empty mapping collection (caching enabled, single mode).
    pub fn new() -> Self {
        Self {
            core: Core::new(true),
            mapper: Mutex::new(None),
            multiple: Mutex::new(false),
        }
    }

    /// Set the nested collection. Fails if one is already present.
    pub fn add(&self, collection: Arc<dyn ResourceCollection>) -> Result<()> {
        if self.core.push_limited(collection, 1) {
            Ok(())
        } else {
            Err(Error::config(
                "mapped collection accepts a single nested collection",
            ))
        }
    }

    /// Set the name mapper. Fails if one is already set.
    pub fn set_mapper(&self, mapper: impl NameMapper + 'static) -> Result<()> {
        let mut slot = self.mapper.lock();
        if slot.is_some() {
            return Err(Error::config("cannot define more than one mapper"));
        }
        *slot = Some(Arc::new(mapper));
        drop(slot);
        self.core.invalidate();
        Ok(())
    }

    /// Use every mapped name instead of just the first.
    pub fn enable_multiple_mappings(&self, on: bool) {
        *self.multiple.lock() = on;
        self.core.invalidate();
    }

    /// Enable or disable memoization of the materialized elements.
    pub fn set_cache(&self, on: bool) {
        self.core.set_cache(on);
    }

    fn materialized(&self) -> Result<(Elements, u64)> {
        prepare(self, &self.core)?;
        let mapper = self.mapper.lock().clone();
        let multiple = *self.multiple.lock();
        self.core.materialize(move |children| {
            let mut seen = FxHashSet::default();
            let mut out: Vec<Arc<dyn Resource>> = Vec::new();
            let mut push = |r: Arc<dyn Resource>| {
                if seen.insert(r.key()) {
                    out.push(r);
                }
            };
            for child in children {
                for r in child.iter()? {
                    let r = r?;
                    let Some(mapper) = &mapper else {
                        push(r);
                        continue;
                    };
                    let Some(name) = r.name() else {
                        push(r);
                        continue;
                    };
                    let names = mapper.map(&name);
                    let take = if multiple { names.len() } else { 1 };
                    for mapped in names.into_iter().take(take) {
                        push(Arc::new(MappedResource::new(r.clone(), mapped)));
                    }
                }
            }
            Ok(out)
        })
    }
}

impl Default for MappedResourceCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCollection for MappedResourceCollection {
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
        // Mapped names no longer correspond to real paths.
        Ok(false)
    }

    fn direct_children(&self) -> Vec<Arc<dyn ResourceCollection>> {
        self.core.children()
    }
}
