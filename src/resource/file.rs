//! Filesystem-backed resources.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::Result;
use crate::resource::{to_epoch_millis, Appendable, FileBacked, Resource, ResourceKey};

/// A [`Resource`] representation of a file.
///
/// The name is relative to the base directory when one is set, otherwise the
/// bare file name is used. Identity is (absolute path, name).
///
/// # Example
///
/// ```ignore
/// use rescollect::FileResource;
///
/// let r = FileResource::with_base("/project", "src/main.rs");
/// assert_eq!(r.name().as_deref(), Some("src/main.rs"));
/// ```
#[derive(Debug, Clone)]
pub struct FileResource {
    path: PathBuf,
    abs: PathBuf,
    base_dir: Option<PathBuf>,
}

impl FileResource {
    /// Create a resource for the given path, without a base directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let abs = std::path::absolute(&path).unwrap_or_else(|_| path.clone());
        Self {
            path,
            abs,
            base_dir: None,
        }
    }

    /// Create a resource for `name` resolved against the base directory.
    ///
    /// The resource name stays relative to the base.
    pub fn with_base(base: impl Into<PathBuf>, name: impl AsRef<Path>) -> Self {
        let base = base.into();
        let mut r = Self::new(base.join(name.as_ref()));
        r.base_dir = Some(base);
        r
    }

    /// The path this resource was created with.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The base directory the name is relative to, if any.
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Set the file's modification time to the given epoch milliseconds,
    /// creating the file if it does not exist.
    ///
    /// A failure to change the timestamp of an existing file is logged as a
    /// warning rather than raised; failure to open or create the file is an
    /// error.
    pub fn touch(&self, millis: i64) -> Result<()> {
        let t = SystemTime::UNIX_EPOCH + Duration::from_millis(millis.max(0) as u64);
        let f = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        if let Err(e) = f.set_modified(t) {
            log::warn!(
                "failed to change modification time of {}: {e}",
                self.path.display()
            );
        }
        Ok(())
    }

    fn open_output(&self, append: bool) -> Result<Box<dyn Write + Send>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let f = OpenOptions::new()
            .write(true)
            .create(true)
            .append(append)
            .truncate(!append)
            .open(&self.path)?;
        Ok(Box::new(f))
    }
}

impl Resource for FileResource {
    fn name(&self) -> Option<String> {
        match &self.base_dir {
            Some(base) => match self.path.strip_prefix(base) {
                Ok(rel) => Some(rel.to_string_lossy().into_owned()),
                Err(_) => self
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned()),
            },
            None => self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
        }
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn is_directory(&self) -> bool {
        self.path.is_dir()
    }

    fn size(&self) -> i64 {
        fs::metadata(&self.path).map_or(0, |m| m.len() as i64)
    }

    fn last_modified(&self) -> i64 {
        fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map_or(0, to_epoch_millis)
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(&self.path)?))
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>> {
        self.open_output(false)
    }

    fn key(&self) -> ResourceKey {
        ResourceKey::File {
            path: self.abs.clone(),
            name: self.name().unwrap_or_default(),
        }
    }

    fn as_file_backed(&self) -> Option<&dyn FileBacked> {
        Some(self)
    }

    fn as_appendable(&self) -> Option<&dyn Appendable> {
        Some(self)
    }
}

impl FileBacked for FileResource {
    fn file_path(&self) -> &Path {
        &self.path
    }
}

impl Appendable for FileResource {
    fn open_append(&self) -> Result<Box<dyn Write + Send>> {
        self.open_output(true)
    }
}
