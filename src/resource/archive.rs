//! Archive-entry resources.
//!
//! Archive codecs (zip/tar parsing) are external collaborators, consumed
//! through the opaque [`ArchiveScanner`] trait: enumerate entries with
//! metadata, and open a content stream positioned at a named entry.
//!
//! # State machine
//!
//! ```text
//! unfetched ──(first metadata access: open + linear scan)──► exists
//!     │                                                        ▲
//!     └────────────────(no matching entry)──────────► absent   │
//!                                (explode pre-populates) ──────┘
//! ```
//!
//! Fetch happens at most once per instance; redundant metadata accesses are
//! free. Content reads rescan the archive every time — codecs generally have
//! no random access by name, and this crate does not build an index.

use std::io::{Read, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::resource::{Resource, ResourceKey};

// =============================================================================
// Collaborator Interface
// =============================================================================

/// Opaque archive codec collaborator.
///
/// Implementations open the archive resource, walk its entries and expose
/// per-entry metadata and content streams. This crate never parses archive
/// bytes itself.
pub trait ArchiveScanner: Send + Sync {
    /// Enumerate entry names and metadata, in archive order.
    fn entries(&self, archive: &dyn Resource) -> Result<Vec<(String, EntryMetadata)>>;

    /// Open a content stream positioned at the named entry.
    fn open_entry(&self, archive: &dyn Resource, entry: &str) -> Result<Box<dyn Read + Send>>;
}

/// Metadata captured for one archive entry.
#[derive(Debug, Clone, Default)]
pub struct EntryMetadata {
    /// Uncompressed size in bytes.
    pub size: i64,
    /// Modification time in epoch milliseconds.
    pub last_modified: i64,
    /// Whether the entry is a directory.
    pub directory: bool,
    /// Unix permission bits.
    pub mode: u32,
    /// Tar-specific fields, `None` for zip entries.
    pub tar: Option<TarExtras>,
}

/// Ownership and link fields only tar archives carry.
#[derive(Debug, Clone, Default)]
pub struct TarExtras {
    /// Numeric owner id.
    pub uid: u64,
    /// Numeric group id.
    pub gid: u64,
    /// Owner name.
    pub user: String,
    /// Group name.
    pub group: String,
    /// Link target, empty for regular entries.
    pub link: String,
}

// =============================================================================
// ArchiveEntryResource
// =============================================================================

enum FetchState {
    Unfetched,
    Absent,
    Present(EntryMetadata),
}

/// A [`Resource`] representation of one entry inside an archive.
///
/// Identity is (archive identity, entry name). Write access is unsupported:
/// archives are produced by a separate writer collaborator, not through this
/// resource.
pub struct ArchiveEntryResource {
    archive: Arc<dyn Resource>,
    entry: String,
    scanner: Arc<dyn ArchiveScanner>,
    state: Mutex<FetchState>,
}

impl ArchiveEntryResource {
    /// Create an entry resource; the archive is scanned on first metadata
    /// access.
    pub fn new(
        archive: Arc<dyn Resource>,
        entry: impl Into<String>,
        scanner: Arc<dyn ArchiveScanner>,
    ) -> Self {
        Self {
            archive,
            entry: entry.into(),
            scanner,
            state: Mutex::new(FetchState::Unfetched),
        }
    }

    /// Create an entry resource with metadata already captured, skipping the
    /// scan. Used when an enumeration pass has just seen the entry.
    pub fn prefetched(
        archive: Arc<dyn Resource>,
        entry: impl Into<String>,
        scanner: Arc<dyn ArchiveScanner>,
        metadata: EntryMetadata,
    ) -> Self {
        Self {
            archive,
            entry: entry.into(),
            scanner,
            state: Mutex::new(FetchState::Present(metadata)),
        }
    }

    /// The archive resource this entry lives in.
    pub fn archive(&self) -> &Arc<dyn Resource> {
        &self.archive
    }

    /// Fetch metadata, scanning the archive at most once.
    ///
    /// Returns `Ok(None)` when the archive has no matching entry. Scan
    /// failures propagate and leave the state unfetched, so a later call can
    /// retry against a repaired archive.
    pub fn fetch(&self) -> Result<Option<EntryMetadata>> {
        let mut state = self.state.lock();
        if let FetchState::Unfetched = *state {
            let found = self
                .scanner
                .entries(self.archive.as_ref())?
                .into_iter()
                .find(|(name, _)| *name == self.entry);
            *state = match found {
                Some((_, metadata)) => FetchState::Present(metadata),
                None => FetchState::Absent,
            };
        }
        Ok(match &*state {
            FetchState::Present(metadata) => Some(metadata.clone()),
            _ => None,
        })
    }

    /// Unix permission bits of the entry, 0 when absent.
    pub fn mode(&self) -> u32 {
        self.metadata().map_or(0, |m| m.mode)
    }

    /// Tar ownership/link fields, `None` for zip entries or absent entries.
    pub fn tar_extras(&self) -> Option<TarExtras> {
        self.metadata().and_then(|m| m.tar)
    }

    fn metadata(&self) -> Option<EntryMetadata> {
        match self.fetch() {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("failed to scan archive for entry {}: {e}", self.entry);
                None
            }
        }
    }
}

impl Resource for ArchiveEntryResource {
    fn name(&self) -> Option<String> {
        Some(self.entry.clone())
    }

    fn exists(&self) -> bool {
        self.metadata().is_some()
    }

    fn is_directory(&self) -> bool {
        self.metadata().is_some_and(|m| m.directory)
    }

    fn size(&self) -> i64 {
        self.metadata().map_or(0, |m| m.size)
    }

    fn last_modified(&self) -> i64 {
        self.metadata().map_or(0, |m| m.last_modified)
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>> {
        self.scanner.open_entry(self.archive.as_ref(), &self.entry)
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>> {
        Err(Error::unsupported(format!(
            "archive entry \"{}\" is read-only",
            self.entry
        )))
    }

    fn key(&self) -> ResourceKey {
        ResourceKey::ArchiveEntry {
            archive: Box::new(self.archive.key()),
            entry: self.entry.clone(),
        }
    }
}
