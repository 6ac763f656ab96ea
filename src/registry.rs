//! Named registration and by-name references.
//!
//! A [`Registry`] binds string names to collections and resources. Bindings
//! are either direct or aliases pointing at another name; alias chains are
//! followed iteratively at resolution time, and a chain that loops fails with
//! [`Error::CircularReference`] rather than spinning.
//!
//! [`CollectionRef`] and [`ResourceRef`] are the consuming side: lightweight
//! handles that look their target up by name. A collection handle stays live,
//! re-resolving on every use; a resource handle pins the first target it
//! resolves, so its identity stays stable across registry rebinds.

use std::io::{Read, Write};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::collection::{ResourceCollection, ResourceIter};
use crate::error::{Error, Result};
use crate::resource::{
    next_instance_id, Appendable, FileBacked, Resource, ResourceKey, UrlBacked,
};

// =============================================================================
// Registry
// =============================================================================

enum Binding<T> {
    Direct(T),
    Alias(String),
}

#[derive(Default)]
struct Bindings {
    collections: FxHashMap<String, Binding<Arc<dyn ResourceCollection>>>,
    resources: FxHashMap<String, Binding<Arc<dyn Resource>>>,
}

/// Name-to-binding table for collections and resources.
///
/// Collections and resources live in separate namespaces. Registering a name
/// again replaces the previous binding; handles created before the rebind
/// observe the change on their next resolution (collections) or keep their
/// pinned target (resources).
#[derive(Default)]
pub struct Registry {
    inner: RwLock<Bindings>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a collection to a name.
    pub fn register_collection(&self, name: impl Into<String>, c: Arc<dyn ResourceCollection>) {
        self.inner
            .write()
            .collections
            .insert(name.into(), Binding::Direct(c));
    }

    /// Bind a resource to a name.
    pub fn register_resource(&self, name: impl Into<String>, r: Arc<dyn Resource>) {
        self.inner
            .write()
            .resources
            .insert(name.into(), Binding::Direct(r));
    }

    /// Make `name` an alias for the collection bound to `target`.
    pub fn alias_collection(&self, name: impl Into<String>, target: impl Into<String>) {
        self.inner
            .write()
            .collections
            .insert(name.into(), Binding::Alias(target.into()));
    }

    /// Make `name` an alias for the resource bound to `target`.
    pub fn alias_resource(&self, name: impl Into<String>, target: impl Into<String>) {
        self.inner
            .write()
            .resources
            .insert(name.into(), Binding::Alias(target.into()));
    }

    /// Resolve a collection name, following alias chains.
    pub fn resolve_collection(&self, name: &str) -> Result<Arc<dyn ResourceCollection>> {
        let inner = self.inner.read();
        resolve(name, &inner.collections)
    }

    /// Resolve a resource name, following alias chains.
    pub fn resolve_resource(&self, name: &str) -> Result<Arc<dyn Resource>> {
        let inner = self.inner.read();
        resolve(name, &inner.resources)
    }
}

fn resolve<T: Clone>(name: &str, table: &FxHashMap<String, Binding<T>>) -> Result<T> {
    let mut seen = FxHashSet::default();
    let mut current = name;
    loop {
        if !seen.insert(current.to_string()) {
            return Err(Error::CircularReference(format!(
                "alias chain starting at \"{name}\" loops at \"{current}\""
            )));
        }
        match table.get(current) {
            Some(Binding::Direct(value)) => return Ok(value.clone()),
            Some(Binding::Alias(target)) => current = target,
            None => return Err(Error::UnknownReference(current.to_string())),
        }
    }
}

// =============================================================================
// CollectionRef
// =============================================================================

/// A collection resolved by name on every use.
///
/// All trait operations delegate to the current target. The handle appears in
/// [`ResourceCollection::direct_children`] as its resolved target, so the
/// cycle guard sees through references and a composite wired back into itself
/// via the registry still fails before iteration.
pub struct CollectionRef {
    registry: Arc<Registry>,
    name: String,
}

impl CollectionRef {
    /// Create a handle to the named collection.
    pub fn new(registry: Arc<Registry>, name: impl Into<String>) -> Self {
        Self {
            registry,
            name: name.into(),
        }
    }

    /// The name this handle resolves.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ResourceCollection for CollectionRef {
    fn size(&self) -> Result<usize> {
        self.registry.resolve_collection(&self.name)?.size()
    }

    fn iter(&self) -> Result<ResourceIter> {
        self.registry.resolve_collection(&self.name)?.iter()
    }

    fn is_filesystem_only(&self) -> Result<bool> {
        self.registry
            .resolve_collection(&self.name)?
            .is_filesystem_only()
    }

    fn direct_children(&self) -> Vec<Arc<dyn ResourceCollection>> {
        match self.registry.resolve_collection(&self.name) {
            Ok(target) => vec![target],
            // Unresolvable now; the delegating operations will report it.
            Err(_) => Vec::new(),
        }
    }
}

// =============================================================================
// ResourceRef
// =============================================================================

/// A resource resolved by name, pinned to its first successful target.
///
/// While unresolved it reads as a nonexistent resource: no name, size 0,
/// timestamp 0. Stream access on an unresolvable handle is an error. Once a
/// resolution succeeds the target is cached, so later registry rebinds do not
/// change what this handle points at.
pub struct ResourceRef {
    registry: Arc<Registry>,
    name: String,
    id: u64,
    resolved: OnceLock<Arc<dyn Resource>>,
}

impl ResourceRef {
    /// Create a handle to the named resource.
    pub fn new(registry: Arc<Registry>, name: impl Into<String>) -> Self {
        Self {
            registry,
            name: name.into(),
            id: next_instance_id(),
            resolved: OnceLock::new(),
        }
    }

    /// The name this handle resolves.
    pub fn name_ref(&self) -> &str {
        &self.name
    }

    fn target(&self) -> Option<&Arc<dyn Resource>> {
        if self.resolved.get().is_none() {
            if let Ok(target) = self.registry.resolve_resource(&self.name) {
                let _ = self.resolved.set(target);
            }
        }
        self.resolved.get()
    }

    fn required(&self) -> Result<&Arc<dyn Resource>> {
        self.target()
            .ok_or_else(|| Error::UnknownReference(self.name.clone()))
    }
}

impl Resource for ResourceRef {
    fn name(&self) -> Option<String> {
        self.target().and_then(|r| r.name())
    }

    fn exists(&self) -> bool {
        self.target().is_some_and(|r| r.exists())
    }

    fn is_directory(&self) -> bool {
        self.target().is_some_and(|r| r.is_directory())
    }

    fn size(&self) -> i64 {
        self.target().map_or(0, |r| r.size())
    }

    fn last_modified(&self) -> i64 {
        self.target().map_or(0, |r| r.last_modified())
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>> {
        self.required()?.open_read()
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>> {
        self.required()?.open_write()
    }

    fn key(&self) -> ResourceKey {
        match self.target() {
            Some(r) => r.key(),
            None => ResourceKey::Instance(self.id),
        }
    }

    fn as_file_backed(&self) -> Option<&dyn FileBacked> {
        self.target().and_then(|r| r.as_file_backed())
    }

    fn as_appendable(&self) -> Option<&dyn Appendable> {
        self.target().and_then(|r| r.as_appendable())
    }

    fn as_url_backed(&self) -> Option<&dyn UrlBacked> {
        self.target().and_then(|r| r.as_url_backed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::tests::{list_of, named, names_of};
    use crate::collection::union::Union;
    use crate::resource::file::FileResource;
    use crate::resource::string::StringResource;

    #[test]
    fn test_direct_binding_resolves() {
        let registry = Registry::new();
        registry.register_collection("sources", list_of(named(&["a"])));
        assert_eq!(registry.resolve_collection("sources").unwrap().size().unwrap(), 1);
    }

    #[test]
    fn test_alias_chain_resolves() {
        let registry = Registry::new();
        registry.register_collection("real", list_of(named(&["a", "b"])));
        registry.alias_collection("mid", "real");
        registry.alias_collection("top", "mid");
        assert_eq!(registry.resolve_collection("top").unwrap().size().unwrap(), 2);
    }

    #[test]
    fn test_long_alias_chain_terminates() {
        let registry = Registry::new();
        registry.register_collection("c0", list_of(named(&["a"])));
        for i in 1..1000 {
            registry.alias_collection(format!("c{i}"), format!("c{}", i - 1));
        }
        assert!(registry.resolve_collection("c999").is_ok());
    }

    #[test]
    fn test_alias_cycle_detected() {
        let registry = Registry::new();
        registry.alias_collection("a", "b");
        registry.alias_collection("b", "c");
        registry.alias_collection("c", "a");
        assert!(matches!(
            registry.resolve_collection("a"),
            Err(Error::CircularReference(_))
        ));
    }

    #[test]
    fn test_unknown_name_reported() {
        let registry = Registry::new();
        registry.alias_collection("dangling", "nowhere");
        assert!(matches!(
            registry.resolve_collection("dangling"),
            Err(Error::UnknownReference(_))
        ));
        assert!(matches!(
            registry.resolve_resource("nothing"),
            Err(Error::UnknownReference(_))
        ));
    }

    #[test]
    fn test_collection_ref_delegates() {
        let registry = Arc::new(Registry::new());
        registry.register_collection("sources", list_of(named(&["x", "y"])));
        let handle = CollectionRef::new(registry, "sources");
        assert_eq!(names_of(&handle), ["x", "y"]);
        assert_eq!(handle.size().unwrap(), 2);
    }

    #[test]
    fn test_collection_ref_tracks_rebinds() {
        let registry = Arc::new(Registry::new());
        registry.register_collection("sources", list_of(named(&["old"])));
        let handle = CollectionRef::new(registry.clone(), "sources");
        assert_eq!(names_of(&handle), ["old"]);

        registry.register_collection("sources", list_of(named(&["new"])));
        assert_eq!(names_of(&handle), ["new"]);
    }

    #[test]
    fn test_self_nesting_via_registry_fails_before_iteration() {
        let registry = Arc::new(Registry::new());
        let union = Arc::new(Union::new());
        registry.register_collection("u", union.clone() as Arc<dyn ResourceCollection>);
        union.add(Arc::new(CollectionRef::new(registry, "u")));
        assert!(matches!(
            union.iter(),
            Err(Error::CircularReference(_))
        ));
    }

    #[test]
    fn test_resource_ref_unresolved_is_nonexistent() {
        let registry = Arc::new(Registry::new());
        let handle = ResourceRef::new(registry, "missing");
        assert_eq!(handle.name(), None);
        assert!(!handle.exists());
        assert_eq!(handle.size(), 0);
        assert_eq!(handle.last_modified(), 0);
        assert!(matches!(
            handle.open_read(),
            Err(Error::UnknownReference(_))
        ));
        assert!(matches!(handle.key(), ResourceKey::Instance(_)));
    }

    #[test]
    fn test_resource_ref_pins_first_target() {
        let registry = Arc::new(Registry::new());
        let handle = ResourceRef::new(registry.clone(), "value");
        registry.register_resource("value", Arc::new(StringResource::new("v1").with_name("one")));
        assert_eq!(handle.name().as_deref(), Some("one"));

        registry.register_resource("value", Arc::new(StringResource::new("v2").with_name("two")));
        // First successful resolution sticks.
        assert_eq!(handle.name().as_deref(), Some("one"));
    }

    #[test]
    fn test_resource_ref_forwards_capabilities() {
        let registry = Arc::new(Registry::new());
        registry.register_resource("file", Arc::new(FileResource::new("/tmp/r")));
        let handle = ResourceRef::new(registry, "file");
        assert!(handle.as_file_backed().is_some());
        assert!(handle.as_url_backed().is_none());
    }
}
