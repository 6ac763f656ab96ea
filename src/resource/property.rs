//! Build-property resources.
//!
//! A [`PropertyResource`] reads and (once) writes a named value in a shared
//! [`PropertyStore`]. The store stands in for the surrounding build tool's
//! property layer, which is an external collaborator of this crate.

use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::resource::{next_instance_id, Resource, ResourceKey, UNKNOWN_DATETIME};

// =============================================================================
// PropertyStore
// =============================================================================

/// A shared, thread-safe name → value map of build properties.
#[derive(Default)]
pub struct PropertyStore {
    props: RwLock<FxHashMap<String, String>>,
}

impl PropertyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a property value.
    pub fn get(&self, name: &str) -> Option<String> {
        self.props.read().get(name).cloned()
    }

    /// Set a property value, replacing any previous one.
    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.props.write().insert(name.into(), value.into());
    }

    /// Whether the property is set.
    pub fn contains(&self, name: &str) -> bool {
        self.props.read().contains_key(name)
    }
}

// =============================================================================
// PropertyResource
// =============================================================================

/// A [`Resource`] view of one property in a [`PropertyStore`].
///
/// Exists iff the property is set. Content may be written once through
/// [`Resource::open_write`] while the property is unset; afterwards writes
/// fail with [`Error::Immutable`]. Equality is by instance.
pub struct PropertyResource {
    id: u64,
    store: Arc<PropertyStore>,
    name: String,
}

impl PropertyResource {
    /// Create a resource for the named property.
    pub fn new(store: Arc<PropertyStore>, name: impl Into<String>) -> Self {
        Self {
            id: next_instance_id(),
            store,
            name: name.into(),
        }
    }

    /// The property value, if set.
    pub fn value(&self) -> Option<String> {
        self.store.get(&self.name)
    }
}

impl Resource for PropertyResource {
    fn name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn exists(&self) -> bool {
        self.store.contains(&self.name)
    }

    fn size(&self) -> i64 {
        self.value().map_or(0, |v| v.len() as i64)
    }

    fn last_modified(&self) -> i64 {
        UNKNOWN_DATETIME
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>> {
        match self.value() {
            Some(v) => Ok(Box::new(Cursor::new(v.into_bytes()))),
            None => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("property \"{}\" has not been set", self.name),
            ))),
        }
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>> {
        if self.exists() {
            return Err(Error::Immutable(format!(
                "property \"{}\" is already set",
                self.name
            )));
        }
        Ok(Box::new(PropertyWriter {
            buf: Vec::new(),
            store: Arc::clone(&self.store),
            name: self.name.clone(),
        }))
    }

    fn key(&self) -> ResourceKey {
        ResourceKey::Instance(self.id)
    }
}

/// Buffers written bytes and commits them as the property value on drop.
struct PropertyWriter {
    buf: Vec<u8>,
    store: Arc<PropertyStore>,
    name: String,
}

impl Write for PropertyWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for PropertyWriter {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buf).into_owned();
        self.store.set(self.name.clone(), text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;

    #[test]
    fn test_unset_property_reads_as_nonexistent() {
        let store = Arc::new(PropertyStore::new());
        let r = PropertyResource::new(store, "missing");
        assert!(!r.exists());
        assert_eq!(r.size(), 0);
        assert_eq!(r.last_modified(), 0);
        assert!(r.open_read().is_err());
    }

    #[test]
    fn test_write_commits_on_drop_then_immutable() {
        let store = Arc::new(PropertyStore::new());
        let r = PropertyResource::new(Arc::clone(&store), "answer");
        {
            let mut w = r.open_write().unwrap();
            w.write_all(b"42").unwrap();
        }
        assert_eq!(store.get("answer").as_deref(), Some("42"));
        assert!(matches!(r.open_write(), Err(Error::Immutable(_))));
        let mut s = String::new();
        r.open_read().unwrap().read_to_string(&mut s).unwrap();
        assert_eq!(s, "42");
    }
}
