//! URL-addressed resources.
//!
//! Supports `http(s)` URLs through a blocking HTTP client and `file://` URLs
//! through the local filesystem. Metadata is fetched at most once per
//! instance; content reads issue a fresh request each time. There is no
//! retry or timeout layer here — callers needing either wrap the transport
//! externally.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use parking_lot::Mutex;

use crate::config;
use crate::error::{Error, Result};
use crate::resource::{
    to_epoch_millis, Resource, ResourceKey, UrlBacked, UNKNOWN_DATETIME, UNKNOWN_SIZE,
};

/// A [`Resource`] addressed by URL.
///
/// Identity is the URL string. Existence of an `http(s)` resource means the
/// server answered a metadata request with a success status; connection
/// failures read as nonexistent, while failures during [`Resource::open_read`]
/// surface as errors.
pub struct UrlResource {
    url: String,
    meta: Mutex<Option<UrlMeta>>,
}

#[derive(Debug, Clone, Copy)]
struct UrlMeta {
    exists: bool,
    directory: bool,
    size: i64,
    last_modified: i64,
}

impl UrlResource {
    /// Create a resource for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            meta: Mutex::new(None),
        }
    }

    /// The local path for `file://` URLs.
    fn file_path(&self) -> Option<PathBuf> {
        self.url.strip_prefix("file://").map(PathBuf::from)
    }

    fn client() -> Result<reqwest::blocking::Client> {
        Ok(reqwest::blocking::Client::builder()
            .user_agent(config::get().user_agent.clone())
            .build()?)
    }

    /// Fetch metadata, at most once per instance.
    fn fetch(&self) -> UrlMeta {
        let mut slot = self.meta.lock();
        if let Some(meta) = *slot {
            return meta;
        }
        let meta = match self.file_path() {
            Some(path) => match fs::metadata(&path) {
                Ok(m) => UrlMeta {
                    exists: true,
                    directory: m.is_dir(),
                    size: m.len() as i64,
                    last_modified: m.modified().map_or(UNKNOWN_DATETIME, to_epoch_millis),
                },
                Err(_) => ABSENT,
            },
            None => self.fetch_remote().unwrap_or(ABSENT),
        };
        *slot = Some(meta);
        meta
    }

    fn fetch_remote(&self) -> Result<UrlMeta> {
        let response = Self::client()?.head(&self.url).send()?;
        if !response.status().is_success() {
            return Ok(ABSENT);
        }
        let size = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(UNKNOWN_SIZE);
        let last_modified = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| chrono::DateTime::parse_from_rfc2822(v).ok())
            .map_or(UNKNOWN_DATETIME, |t| t.timestamp_millis());
        Ok(UrlMeta {
            exists: true,
            directory: false,
            size,
            last_modified,
        })
    }
}

const ABSENT: UrlMeta = UrlMeta {
    exists: false,
    directory: false,
    size: 0,
    last_modified: 0,
};

impl Resource for UrlResource {
    fn name(&self) -> Option<String> {
        self.url.rsplit('/').next().map(str::to_string)
    }

    fn exists(&self) -> bool {
        self.fetch().exists
    }

    fn is_directory(&self) -> bool {
        self.fetch().directory
    }

    fn size(&self) -> i64 {
        self.fetch().size
    }

    fn last_modified(&self) -> i64 {
        self.fetch().last_modified
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>> {
        match self.file_path() {
            Some(path) => Ok(Box::new(File::open(path)?)),
            None => {
                let response = Self::client()?.get(&self.url).send()?.error_for_status()?;
                Ok(Box::new(response))
            }
        }
    }

    fn open_write(&self) -> Result<Box<dyn Write + Send>> {
        match self.file_path() {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        fs::create_dir_all(parent)?;
                    }
                }
                Ok(Box::new(File::create(path)?))
            }
            None => Err(Error::unsupported(format!(
                "cannot write to remote URL {}",
                self.url
            ))),
        }
    }

    fn key(&self) -> ResourceKey {
        ResourceKey::Url(self.url.clone())
    }

    fn as_url_backed(&self) -> Option<&dyn UrlBacked> {
        Some(self)
    }
}

impl UrlBacked for UrlResource {
    fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;
    use tempfile::TempDir;

    #[test]
    fn test_file_url_metadata_and_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.txt");
        fs::write(&path, "payload").unwrap();

        let r = UrlResource::new(format!("file://{}", path.display()));
        assert!(r.exists());
        assert_eq!(r.size(), 7);
        assert!(r.last_modified() > 0);

        let mut s = String::new();
        r.open_read().unwrap().read_to_string(&mut s).unwrap();
        assert_eq!(s, "payload");
    }

    #[test]
    fn test_missing_file_url_reads_as_nonexistent() {
        let dir = TempDir::new().unwrap();
        let r = UrlResource::new(format!("file://{}/nope", dir.path().display()));
        assert!(!r.exists());
        assert_eq!(r.size(), 0);
        assert_eq!(r.last_modified(), 0);
    }

    #[test]
    fn test_remote_write_unsupported() {
        let r = UrlResource::new("https://example.com/artifact.tar.gz");
        assert!(matches!(r.open_write(), Err(Error::Unsupported(_))));
        assert_eq!(r.name().as_deref(), Some("artifact.tar.gz"));
        assert_eq!(r.as_url_backed().unwrap().url(), "https://example.com/artifact.tar.gz");
    }

    #[test]
    fn test_metadata_fetched_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("once.txt");
        fs::write(&path, "1234").unwrap();
        let r = UrlResource::new(format!("file://{}", path.display()));
        assert_eq!(r.size(), 4);
        // Deleting the backing file after the first fetch must not change
        // the captured metadata.
        fs::remove_file(&path).unwrap();
        assert_eq!(r.size(), 4);
        assert!(r.exists());
    }
}
