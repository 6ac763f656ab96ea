//! Search-path resources: a relative name resolved against ordered roots.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::resource::{to_epoch_millis, Resource, ResourceKey};

/// A read-only [`Resource`] located by searching an ordered list of root
/// directories for a relative name. The first root containing the name wins.
///
/// Identity is (name, roots): the same name on different search paths is a
/// different resource.
#[derive(Debug, Clone)]
pub struct SearchPathResource {
    name: String,
    roots: Vec<PathBuf>,
}

impl SearchPathResource {
    /// Create a resource for `name` searched across `roots` in order.
    pub fn new(name: impl Into<String>, roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            name: name.into(),
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// The path of the first root that contains the name, if any.
    pub fn resolve(&self) -> Option<PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join(&self.name))
            .find(|candidate| candidate.exists())
    }

    /// The search roots, in order.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl Resource for SearchPathResource {
    fn name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn exists(&self) -> bool {
        self.resolve().is_some()
    }

    fn is_directory(&self) -> bool {
        self.resolve().as_deref().is_some_and(Path::is_dir)
    }

    fn size(&self) -> i64 {
        self.resolve()
            .and_then(|p| fs::metadata(p).ok())
            .map_or(0, |m| m.len() as i64)
    }

    fn last_modified(&self) -> i64 {
        self.resolve()
            .and_then(|p| fs::metadata(p).ok())
            .and_then(|m| m.modified().ok())
            .map_or(0, to_epoch_millis)
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>> {
        match self.resolve() {
            Some(path) => Ok(Box::new(File::open(path)?)),
            None => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("\"{}\" not found on the search path", self.name),
            ))),
        }
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>> {
        Err(Error::unsupported(format!(
            "search-path resource \"{}\" is read-only",
            self.name
        )))
    }

    fn key(&self) -> ResourceKey {
        ResourceKey::Search {
            name: self.name.clone(),
            roots: self.roots.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;
    use tempfile::TempDir;

    #[test]
    fn test_first_root_wins() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        fs::write(a.path().join("conf.toml"), "from-a").unwrap();
        fs::write(b.path().join("conf.toml"), "from-b").unwrap();

        let r = SearchPathResource::new("conf.toml", [a.path(), b.path()]);
        assert!(r.exists());
        let mut s = String::new();
        r.open_read().unwrap().read_to_string(&mut s).unwrap();
        assert_eq!(s, "from-a");
    }

    #[test]
    fn test_missing_everywhere() {
        let a = TempDir::new().unwrap();
        let r = SearchPathResource::new("nope", [a.path()]);
        assert!(!r.exists());
        assert_eq!(r.size(), 0);
        assert!(r.open_read().is_err());
    }

    #[test]
    fn test_identity_includes_roots() {
        let r1 = SearchPathResource::new("x", ["/a", "/b"]);
        let r2 = SearchPathResource::new("x", ["/b", "/a"]);
        assert_ne!(r1.key(), r2.key());
    }

    #[test]
    fn test_read_only() {
        let r = SearchPathResource::new("x", ["/a"]);
        assert!(matches!(r.open_write(), Err(Error::Unsupported(_))));
    }
}
