//! Read-only access to the crawled content of one archival unit.
//!
//! The resolver never fetches or writes anything itself; everything it knows
//! about an AU comes through a [`ContentSource`].

use crate::error::ContentError;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use walkdir::WalkDir;

/// The crawled URL set of one archival unit
pub trait ContentSource {
    /// Every URL stored for the AU
    fn urls(&self) -> Result<Vec<String>, ContentError>;

    /// Whether the URL was collected at all
    fn exists(&self, url: &str) -> bool;

    /// Whether the URL has a non-empty body
    fn has_content(&self, url: &str) -> bool;

    /// Open the stored body; dropping the reader releases the handle
    fn open_for_reading(&self, url: &str) -> Result<Box<dyn Read + '_>, ContentError>;

    /// Stored content type, if known
    fn content_type(&self, url: &str) -> Option<String>;
}

/// Read a whole body, releasing the handle before returning
pub fn read_to_string(source: &dyn ContentSource, url: &str) -> Result<String, ContentError> {
    let mut bytes = Vec::new();
    {
        let mut reader = source.open_for_reading(url)?;
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| ContentError::Io { url: url.to_string(), source })?;
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Guess a content type from the file extension of a URL or path
pub fn content_type_for(path: &str) -> Option<&'static str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = name.rsplit_once('.')?;

    let content_type = match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "epub" => "application/epub+zip",
        "ris" => "application/x-research-info-systems",
        "bib" => "application/x-bibtex",
        "enw" => "application/x-endnote-refer",
        "txt" => "text/plain",
        "json" => "application/json",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => return None,
    };

    Some(content_type)
}

/// Failure to inject for a URL of a [`MemoryContentSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    Cancelled,
    Io,
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    body: Vec<u8>,
    content_type: Option<String>,
    failure: Option<InjectedFailure>,
}

/// In-memory content source for tests and benchmarks.
///
/// Tracks how many readers are currently open so callers can verify that
/// handles are released on every path.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentSource {
    entries: BTreeMap<String, MemoryEntry>,
    open_handles: Arc<AtomicUsize>,
}

impl MemoryContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a body; the content type is guessed from the extension
    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> &mut Self {
        let url = url.into();
        let content_type = content_type_for(&url).map(str::to_string);
        self.entries
            .insert(url, MemoryEntry { body: body.into(), content_type, failure: None });
        self
    }

    /// Store a body with an explicit content type
    pub fn insert_typed(
        &mut self, url: impl Into<String>, content_type: impl Into<String>, body: impl Into<Vec<u8>>,
    ) -> &mut Self {
        self.entries.insert(
            url.into(),
            MemoryEntry { body: body.into(), content_type: Some(content_type.into()), failure: None },
        );
        self
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.insert(url, body);
        self
    }

    /// Make reads of an existing URL fail
    pub fn fail_reads(&mut self, url: &str, failure: InjectedFailure) -> &mut Self {
        if let Some(entry) = self.entries.get_mut(url) {
            entry.failure = Some(failure);
        }
        self
    }

    pub fn remove(&mut self, url: &str) -> bool {
        self.entries.remove(url).is_some()
    }

    /// Number of readers not yet dropped
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }
}

struct TrackedReader {
    inner: Cursor<Vec<u8>>,
    open: Arc<AtomicUsize>,
}

impl Read for TrackedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Drop for TrackedReader {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ContentSource for MemoryContentSource {
    fn urls(&self) -> Result<Vec<String>, ContentError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn exists(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    fn has_content(&self, url: &str) -> bool {
        self.entries.get(url).is_some_and(|e| !e.body.is_empty())
    }

    fn open_for_reading(&self, url: &str) -> Result<Box<dyn Read + '_>, ContentError> {
        let entry = self
            .entries
            .get(url)
            .ok_or_else(|| ContentError::NotFound(url.to_string()))?;

        match entry.failure {
            Some(InjectedFailure::Cancelled) => Err(ContentError::Cancelled(url.to_string())),
            Some(InjectedFailure::Io) => Err(ContentError::Io {
                url: url.to_string(),
                source: std::io::Error::other("injected read failure"),
            }),
            None => {
                self.open_handles.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(TrackedReader {
                    inner: Cursor::new(entry.body.clone()),
                    open: Arc::clone(&self.open_handles),
                }))
            }
        }
    }

    fn content_type(&self, url: &str) -> Option<String> {
        self.entries.get(url).and_then(|e| e.content_type.clone())
    }
}

/// Content source backed by a directory tree.
///
/// `base_url` + the relative path of each file is its URL, so a tree
/// `root/8/1/2012/a.pdf` with base `http://x.org/` serves
/// `http://x.org/8/1/2012/a.pdf`.
#[derive(Debug, Clone)]
pub struct DirectoryContentSource {
    root: PathBuf,
    base_url: String,
}

impl DirectoryContentSource {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Result<Self, ContentError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ContentError::NotFound(root.display().to_string()));
        }

        let base_url = if base_url.ends_with('/') { base_url.to_string() } else { format!("{}/", base_url) };
        Ok(Self { root, base_url })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn path_for(&self, url: &str) -> Option<PathBuf> {
        let relative = url.strip_prefix(&self.base_url)?;
        let relative = Path::new(relative);

        if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return None;
        }

        Some(self.root.join(relative))
    }
}

impl ContentSource for DirectoryContentSource {
    fn urls(&self) -> Result<Vec<String>, ContentError> {
        let mut urls = Vec::new();

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| ContentError::Io {
                url: self.root.display().to_string(),
                source: std::io::Error::from(e),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let segments: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            urls.push(format!("{}{}", self.base_url, segments.join("/")));
        }

        Ok(urls)
    }

    fn exists(&self, url: &str) -> bool {
        self.path_for(url).is_some_and(|p| p.is_file())
    }

    fn has_content(&self, url: &str) -> bool {
        self.path_for(url)
            .and_then(|p| std::fs::metadata(p).ok())
            .is_some_and(|m| m.is_file() && m.len() > 0)
    }

    fn open_for_reading(&self, url: &str) -> Result<Box<dyn Read + '_>, ContentError> {
        let path = self.path_for(url).ok_or_else(|| ContentError::NotFound(url.to_string()))?;
        let file = File::open(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ContentError::NotFound(url.to_string())
            } else {
                ContentError::Io { url: url.to_string(), source }
            }
        })?;

        Ok(Box::new(file))
    }

    fn content_type(&self, url: &str) -> Option<String> {
        if !self.exists(url) {
            return None;
        }
        content_type_for(url).map(str::to_string)
    }
}
