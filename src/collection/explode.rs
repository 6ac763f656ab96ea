//! Archive explosion: a collection of archives becomes their entries.

use std::sync::Arc;

use crate::collection::{prepare, Core, Elements, ResourceCollection, ResourceIter};
use crate::error::{Error, Result};
use crate::resource::archive::{ArchiveEntryResource, ArchiveScanner};
use crate::resource::Resource;

/// Explodes every archive in the nested collection into its entries.
///
/// Each enumerated entry becomes an [`ArchiveEntryResource`] with metadata
/// already captured. Caching is **off** by default: archive scanning stays
/// live, matching the entry resources' own rescan-on-read behavior.
///
/// Requires exactly one nested collection and an [`ArchiveScanner`]
/// collaborator supplied at construction.
pub struct ArchiveExploder {
    core: Core<Arc<dyn ResourceCollection>>,
    scanner: Arc<dyn ArchiveScanner>,
}

impl ArchiveExploder {
    /// Create an exploder using the given codec collaborator.
    pub fn new(scanner: Arc<dyn ArchiveScanner>) -> Self {
        Self {
            core: Core::new(false),
            scanner,
        }
    }

    /// Set the nested collection of archives. Fails if one is already present.
    pub fn add(&self, collection: Arc<dyn ResourceCollection>) -> Result<()> {
        if self.core.push_limited(collection, 1) {
            Ok(())
        } else {
            Err(Error::config(
                "archive exploder accepts a single nested collection",
            ))
        }
    }

    /// Enable or disable memoization of the materialized entries.
    pub fn set_cache(&self, on: bool) {
        self.core.set_cache(on);
    }

    fn materialized(&self) -> Result<(Elements, u64)> {
        prepare(self, &self.core)?;
        let scanner = Arc::clone(&self.scanner);
        self.core.materialize(move |children| {
            let mut out: Vec<Arc<dyn Resource>> = Vec::new();
            for child in children {
                for archive in child.iter()? {
                    let archive = archive?;
                    for (name, metadata) in scanner.entries(archive.as_ref())? {
                        out.push(Arc::new(ArchiveEntryResource::prefetched(
                            archive.clone(),
                            name,
                            Arc::clone(&scanner),
                            metadata,
                        )));
                    }
                }
            }
            Ok(out)
        })
    }
}

impl ResourceCollection for ArchiveExploder {
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
        // Entries live inside archives, never directly on the filesystem.
        Ok(false)
    }

    fn direct_children(&self) -> Vec<Arc<dyn ResourceCollection>> {
        self.core.children()
    }
}
