//! In-memory string resources.

use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::resource::{next_instance_id, Resource, ResourceKey, UNKNOWN_DATETIME};

/// A [`Resource`] whose content is an in-memory string.
///
/// The value is set once: either at construction or through a single write
/// stream. Once set, further writes fail with [`Error::Immutable`]. Equality
/// is by instance, not by content.
pub struct StringResource {
    id: u64,
    name: Option<String>,
    value: Arc<Mutex<Option<String>>>,
}

impl StringResource {
    /// Create a resource with its value already set.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            id: next_instance_id(),
            name: None,
            value: Arc::new(Mutex::new(Some(value.into()))),
        }
    }

    /// Create a resource whose value will be supplied later through
    /// [`Resource::open_write`].
    pub fn deferred() -> Self {
        Self {
            id: next_instance_id(),
            name: None,
            value: Arc::new(Mutex::new(None)),
        }
    }

    /// Set the resource name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The current value, if set.
    pub fn value(&self) -> Option<String> {
        self.value.lock().clone()
    }

    /// Set the value directly. Fails with [`Error::Immutable`] if already set.
    pub fn set_value(&self, value: impl Into<String>) -> Result<()> {
        let mut slot = self.value.lock();
        if slot.is_some() {
            return Err(Error::Immutable(self.describe()));
        }
        *slot = Some(value.into());
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.name {
            Some(n) => format!("string resource \"{n}\""),
            None => "string resource".to_string(),
        }
    }
}

impl Resource for StringResource {
    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn exists(&self) -> bool {
        self.value.lock().is_some()
    }

    fn size(&self) -> i64 {
        self.value.lock().as_ref().map_or(0, |v| v.len() as i64)
    }

    fn last_modified(&self) -> i64 {
        UNKNOWN_DATETIME
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>> {
        match self.value.lock().clone() {
            Some(v) => Ok(Box::new(Cursor::new(v.into_bytes()))),
            None => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "string value has not been set",
            ))),
        }
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>> {
        if self.value.lock().is_some() {
            return Err(Error::Immutable(self.describe()));
        }
        Ok(Box::new(StringWriter {
            buf: Vec::new(),
            slot: Arc::clone(&self.value),
        }))
    }

    fn key(&self) -> ResourceKey {
        ResourceKey::Instance(self.id)
    }
}

/// Buffers written bytes and commits them as the string value on drop.
struct StringWriter {
    buf: Vec<u8>,
    slot: Arc<Mutex<Option<String>>>,
}

impl Write for StringWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for StringWriter {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buf).into_owned();
        *self.slot.lock() = Some(text);
    }
}
