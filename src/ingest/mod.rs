//! Package ingestion: where the files of a package come from
//!
//! The processor never touches the file system directly. It enumerates
//! and reads files through a [`PackageSource`]:
//!
//! - [`DirectoryPackage`]: a directory tree on disk, walked with `walkdir`
//! - [`MemoryPackage`]: files held in memory, for embedding and tests
//!
//! File identities are package-relative and always use `/`.

use crate::source::FileId;
use crate::{LictraceError, LictraceResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

pub trait PackageSource: Send + Sync {
    /// Human-readable package name for logs
    fn name(&self) -> String;

    /// Enumerate every file of the package. Enumeration is lazy so a
    /// cancelled run stops walking.
    fn files(&self) -> Box<dyn Iterator<Item = FileId> + '_>;

    /// Read a file as lines without terminators
    fn read_lines(&self, file: &FileId) -> LictraceResult<Vec<String>>;
}

/// Split text into lines, accepting `\n` and `\r\n`
fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

// ─── Directory ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DirectoryPackage {
    root: PathBuf,
}

impl DirectoryPackage {
    pub fn new(root: impl Into<PathBuf>) -> LictraceResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(LictraceError::PackageError(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn relative_id(&self, path: &Path) -> Option<FileId> {
        let rel = path.strip_prefix(&self.root).ok()?;
        Some(FileId::parse(&rel.to_string_lossy()))
    }
}

impl PackageSource for DirectoryPackage {
    fn name(&self) -> String {
        self.root.display().to_string()
    }

    fn files(&self) -> Box<dyn Iterator<Item = FileId> + '_> {
        Box::new(
            WalkDir::new(&self.root)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!("Skipping unreadable entry: {}", e);
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file())
                .filter_map(move |entry| self.relative_id(entry.path())),
        )
    }

    fn read_lines(&self, file: &FileId) -> LictraceResult<Vec<String>> {
        let bytes = std::fs::read(self.root.join(file.to_string()))?;
        // Older sources are often Latin-1; keep going rather than fail
        Ok(split_lines(&String::from_utf8_lossy(&bytes)))
    }
}

// ─── Memory ─────────────────────────────────────────────────────────

/// In-memory package; files enumerate in path order
#[derive(Debug, Clone, Default)]
pub struct MemoryPackage {
    name: String,
    files: BTreeMap<FileId, Vec<String>>,
}

impl MemoryPackage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: BTreeMap::new(),
        }
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.add_file(path, content);
        self
    }

    pub fn add_file(&mut self, path: &str, content: &str) {
        self.files.insert(FileId::parse(path), split_lines(content));
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl PackageSource for MemoryPackage {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn files(&self) -> Box<dyn Iterator<Item = FileId> + '_> {
        Box::new(self.files.keys().cloned())
    }

    fn read_lines(&self, file: &FileId) -> LictraceResult<Vec<String>> {
        self.files
            .get(file)
            .cloned()
            .ok_or_else(|| LictraceError::PackageError(format!("no such file: {}", file)))
    }
}
