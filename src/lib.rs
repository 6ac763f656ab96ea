//! # rescollect
//!
//! Uniform resources and a lazy collection algebra for build tooling.
//!
//! A [`Resource`] describes a named, byte-bearing entity behind a single
//! surface (name, existence, size, timestamp, read/write streams) regardless
//! of where it lives:
//!
//! - **Files**: [`FileResource`], optionally named relative to a base directory
//! - **Archive entries**: [`ArchiveEntryResource`], via a pluggable codec
//! - **URLs**: [`UrlResource`], HTTP(S) and `file://` (feature `url`)
//! - **In-memory values**: [`StringResource`], [`PropertyResource`]
//! - **Search paths**: [`SearchPathResource`], first hit across ordered roots
//!
//! A [`ResourceCollection`] is a restartable, sized sequence of resources, and
//! composites combine collections lazily: [`Union`], [`Intersect`],
//! [`Difference`], [`Restrict`], [`Sort`], [`First`]/[`Last`]/[`AllButLast`],
//! [`MappedResourceCollection`] and [`ArchiveExploder`]. Nothing is touched
//! until iteration; structural mutation invalidates live iterators instead of
//! feeding them stale elements.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use rescollect::prelude::*;
//!
//! let sources = ResourceList::new();
//! sources.push(Arc::new(FileResource::new("src/main.rs")));
//! sources.push(Arc::new(FileResource::new("src/lib.rs")));
//!
//! let generated = ResourceList::new();
//! generated.push(Arc::new(FileResource::new("target/gen/version.rs")));
//!
//! let union = Union::new();
//! union.add(Arc::new(sources));
//! union.add(Arc::new(generated));
//!
//! for r in union.iter()? {
//!     let r = r?;
//!     println!("{:?} ({} bytes)", r.name(), r.size());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`resource`]: the resource model, identity keys and capability traits
//! - [`collection`]: collections, composites and the fail-fast iterator
//! - [`registry`]: named bindings, aliases and by-name reference handles
//! - [`config`]: runtime configuration (User-Agent for URL fetches)
//! - [`error`]: the crate error type

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod collection;
pub mod config;
pub mod error;
pub mod registry;
pub mod resource;

mod cycle;

// =============================================================================
// Prelude - import commonly used items with a single `use`
// =============================================================================

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
///
/// ```ignore
/// use rescollect::prelude::*;
/// ```
pub mod prelude {
    // Resources
    pub use crate::{
        Appendable, FileBacked, FileResource, MappedResource, PropertyResource, PropertyStore,
        Resource, ResourceKey, SearchPathResource, StringResource, UrlBacked,
    };
    #[cfg(feature = "url")]
    pub use crate::UrlResource;

    // Archives
    pub use crate::{ArchiveEntryResource, ArchiveExploder, ArchiveScanner, EntryMetadata};

    // Collections
    pub use crate::{
        AllButLast, Difference, First, Intersect, Last, MappedResourceCollection, Restrict,
        ResourceCollection, ResourceIter, ResourceList, Sort, Union,
    };

    // Selectors and mappers
    pub use crate::{ExistsSelector, FlatMapper, MergeMapper, NameMapper, Selector};

    // References
    pub use crate::{CollectionRef, Registry, ResourceRef};

    // Errors
    pub use crate::{Error, Result};
}

// =============================================================================
// Resources
// =============================================================================

pub use resource::archive::{
    ArchiveEntryResource, ArchiveScanner, EntryMetadata, TarExtras,
};
pub use resource::file::FileResource;
pub use resource::mapped::MappedResource;
pub use resource::property::{PropertyResource, PropertyStore};
pub use resource::search::SearchPathResource;
pub use resource::string::StringResource;
#[cfg(feature = "url")]
pub use resource::url::UrlResource;
pub use resource::{
    natural_order, Appendable, FileBacked, Resource, ResourceKey, UrlBacked, UNKNOWN_DATETIME,
    UNKNOWN_SIZE,
};

// =============================================================================
// Collections
// =============================================================================

pub use collection::difference::Difference;
pub use collection::explode::ArchiveExploder;
pub use collection::intersect::Intersect;
pub use collection::limit::{AllButLast, First, Last};
pub use collection::mapped::{FlatMapper, MappedResourceCollection, MergeMapper, NameMapper};
pub use collection::restrict::{ExistsSelector, Restrict, Selector};
pub use collection::sort::{Comparator, Sort};
pub use collection::union::Union;
pub use collection::{ResourceCollection, ResourceIter, ResourceList};

// =============================================================================
// Infrastructure
// =============================================================================

pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use registry::{CollectionRef, Registry, ResourceRef};
