//! The resource model: a uniform descriptor for named, byte-bearing entities.
//!
//! A [`Resource`] can be an ordinary file, an entry inside an archive, a
//! network URL, an in-memory string or a build-property value. All of them
//! expose the same metadata surface (name, existence, size, timestamp),
//! read/write stream access and an optional-capability query.
//!
//! # Identity
//!
//! Every resource produces a [`ResourceKey`] capturing the fields that define
//! its identity (a file's absolute path, an archive entry's archive + entry
//! name, a URL's value, ...). Equality, hashing and natural ordering are all
//! key-based, so the three are consistent with each other by construction.
//!
//! # Capabilities
//!
//! Optional behaviors are queried through accessors returning
//! `Option<&dyn Capability>`:
//!
//! - [`FileBacked`]: the resource is a literal copy of a filesystem path
//! - [`Appendable`]: the resource supports an append-mode output stream
//! - [`UrlBacked`]: the resource is addressable by URL
//!
//! Decorators forward or suppress capabilities individually; a renaming
//! decorator, for instance, suppresses [`FileBacked`] because its name no
//! longer matches the real path, while still serving the real content.

pub mod archive;
pub mod file;
pub mod mapped;
pub mod property;
pub mod search;
pub mod string;
#[cfg(feature = "url")]
pub mod url;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::error::Result;

// =============================================================================
// Sentinels
// =============================================================================

/// Sentinel size for resources whose size cannot be determined.
pub const UNKNOWN_SIZE: i64 = -1;

/// Sentinel timestamp for resources without a meaningful modification time.
///
/// This deliberately coincides with the "nonexistent" timestamp: absent files
/// also report 0, so existence must be checked separately where 0 is ambiguous.
pub const UNKNOWN_DATETIME: i64 = 0;

// =============================================================================
// Resource Trait
// =============================================================================

/// A named, byte-bearing entity with metadata and stream access.
///
/// Metadata getters are infallible and mirror absent-file semantics: a
/// nonexistent resource reports size 0 and timestamp 0 rather than an error.
/// Stream accessors never hand back a useless object — a kind that does not
/// support the operation returns an `Err` instead.
pub trait Resource: Send + Sync {
    /// The resource name, if one has been determined yet.
    fn name(&self) -> Option<String>;

    /// Whether the backing entity currently exists.
    fn exists(&self) -> bool;

    /// Whether the resource is a directory (or directory-like entry).
    fn is_directory(&self) -> bool {
        false
    }

    /// Size in bytes: 0 if nonexistent, [`UNKNOWN_SIZE`] if indeterminate.
    fn size(&self) -> i64;

    /// Modification time in epoch milliseconds: 0 if nonexistent,
    /// [`UNKNOWN_DATETIME`] if indeterminate.
    fn last_modified(&self) -> i64;

    /// Open the resource content for reading.
    fn open_read(&self) -> Result<Box<dyn Read + Send>>;

    /// Open the resource for writing, replacing existing content.
    ///
    /// Kinds that forbid writes fail with [`Error::Immutable`] or
    /// [`Error::Unsupported`], never by returning a dummy stream.
    ///
    /// [`Error::Immutable`]: crate::Error::Immutable
    /// [`Error::Unsupported`]: crate::Error::Unsupported
    fn open_write(&self) -> Result<Box<dyn Write + Send>>;

    /// The identity key of this resource. See [`ResourceKey`].
    fn key(&self) -> ResourceKey;

    /// Query the [`FileBacked`] capability.
    fn as_file_backed(&self) -> Option<&dyn FileBacked> {
        None
    }

    /// Query the [`Appendable`] capability.
    fn as_appendable(&self) -> Option<&dyn Appendable> {
        None
    }

    /// Query the [`UrlBacked`] capability.
    fn as_url_backed(&self) -> Option<&dyn UrlBacked> {
        None
    }
}

/// Natural ordering over resources: identity-key order.
///
/// Consistent with key equality (equal resources compare as `Equal`) and
/// never resolves content.
pub fn natural_order(a: &dyn Resource, b: &dyn Resource) -> std::cmp::Ordering {
    a.key().cmp(&b.key())
}

// =============================================================================
// ResourceKey - Identity
// =============================================================================

/// The identity-defining fields of a resource, as one comparable value.
///
/// Two resources are considered the same element of a collection iff their
/// keys are equal. Keys of different kinds are never equal, and ordering is
/// total, making keys directly usable for dedup sets and natural sorting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKey {
    /// A filesystem file: absolute path plus the (possibly base-relative) name.
    File {
        /// Absolute path of the file.
        path: PathBuf,
        /// Resource name, relative to the base directory when one is set.
        name: String,
    },
    /// An entry inside an archive: the archive's own key plus the entry name.
    ArchiveEntry {
        /// Identity of the archive resource.
        archive: Box<ResourceKey>,
        /// Entry name within the archive.
        entry: String,
    },
    /// A URL resource, identified by its URL string.
    Url(String),
    /// A name resolved against an ordered list of root directories.
    Search {
        /// The relative name being searched for.
        name: String,
        /// The roots, in search order.
        roots: Vec<PathBuf>,
    },
    /// Identity by instance: strings, properties and unresolved references.
    Instance(u64),
    /// A renamed view of another resource.
    Renamed {
        /// Identity of the wrapped resource.
        inner: Box<ResourceKey>,
        /// The overriding name.
        name: String,
    },
}

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Allocate a fresh id for by-reference resource identity.
pub(crate) fn next_instance_id() -> u64 {
    NEXT_INSTANCE.fetch_add(1, AtomicOrdering::Relaxed)
}

// =============================================================================
// Capability Traits
// =============================================================================

/// Capability: the resource content is a literal copy of a filesystem path.
///
/// Filesystem-only operations (in-place moves, permission copies) special-case
/// on this. Decorators that change the name or transform content must not
/// expose it.
pub trait FileBacked {
    /// The filesystem path backing this resource.
    fn file_path(&self) -> &Path;
}

/// Capability: the resource supports appending to existing content.
pub trait Appendable {
    /// Open an append-mode output stream.
    fn open_append(&self) -> Result<Box<dyn Write + Send>>;
}

/// Capability: the resource is addressable by URL.
pub trait UrlBacked {
    /// The URL of this resource.
    fn url(&self) -> &str;
}

// =============================================================================
// Time Helpers
// =============================================================================

/// Convert a [`SystemTime`] to epoch milliseconds.
pub(crate) fn to_epoch_millis(t: SystemTime) -> i64 {
    chrono::DateTime::<chrono::Utc>::from(t).timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_keys_of_different_kinds_never_equal() {
        let a = ResourceKey::Url("http://example.com/a".into());
        let b = ResourceKey::Instance(7);
        assert_ne!(a, b);
        assert_ne!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_key_equality_implies_equal_ordering() {
        let a = ResourceKey::File {
            path: PathBuf::from("/tmp/x"),
            name: "x".into(),
        };
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_instance_ids_are_unique() {
        assert_ne!(next_instance_id(), next_instance_id());
    }
}
