//! Renaming decorator over another resource.

use std::io::{Read, Write};
use std::sync::Arc;

use crate::error::Result;
use crate::resource::{Appendable, FileBacked, Resource, ResourceKey, UrlBacked};

/// A decorator serving another resource's content under a different name.
///
/// Because the name no longer matches the wrapped resource's real path, the
/// [`FileBacked`] capability is suppressed. Renaming does not transform
/// content, so [`Appendable`] and [`UrlBacked`] are forwarded unchanged.
pub struct MappedResource {
    inner: Arc<dyn Resource>,
    name: String,
}

impl MappedResource {
    /// Wrap `inner`, overriding its name.
    pub fn new(inner: Arc<dyn Resource>, name: impl Into<String>) -> Self {
        Self {
            inner,
            name: name.into(),
        }
    }

    /// The wrapped resource.
    pub fn inner(&self) -> &Arc<dyn Resource> {
        &self.inner
    }
}

impl Resource for MappedResource {
    fn name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn exists(&self) -> bool {
        self.inner.exists()
    }

    fn is_directory(&self) -> bool {
        self.inner.is_directory()
    }

    fn size(&self) -> i64 {
        self.inner.size()
    }

    fn last_modified(&self) -> i64 {
        self.inner.last_modified()
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>> {
        self.inner.open_read()
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>> {
        self.inner.open_write()
    }

    fn key(&self) -> ResourceKey {
        ResourceKey::Renamed {
            inner: Box::new(self.inner.key()),
            name: self.name.clone(),
        }
    }

    // FileBacked is deliberately not forwarded: the mapped name no longer
    // matches the underlying path.

    fn as_appendable(&self) -> Option<&dyn Appendable> {
        self.inner.as_appendable()
    }

    fn as_url_backed(&self) -> Option<&dyn UrlBacked> {
        self.inner.as_url_backed()
    }
}
