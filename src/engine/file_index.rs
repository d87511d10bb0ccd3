//! Package file index: classify every enumerated file once
//!
//! Source files are recognized by extension, license files by base name.
//! Everything else is recorded as unknown and not analyzed.

use super::ProcessorConfig;
use crate::source::{self, FileId};
use serde::{Deserialize, Serialize};

/// File classification for analysis dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileCategory {
    SourceCode,
    LicenseFile,
    Unknown,
}

pub fn classify(file: &FileId, config: &ProcessorConfig) -> FileCategory {
    if source::is_source_file(file) {
        FileCategory::SourceCode
    } else if config.is_license_file(file) {
        FileCategory::LicenseFile
    } else {
        FileCategory::Unknown
    }
}

/// Classified file lists in enumeration order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileIndex {
    pub source_files: Vec<FileId>,
    pub license_files: Vec<FileId>,
    pub unknown_files: Vec<FileId>,
}

impl FileIndex {
    pub fn push(&mut self, file: FileId, category: FileCategory) {
        match category {
            FileCategory::SourceCode => self.source_files.push(file),
            FileCategory::LicenseFile => self.license_files.push(file),
            FileCategory::Unknown => self.unknown_files.push(file),
        }
    }

    pub fn len(&self) -> usize {
        self.source_files.len() + self.license_files.len() + self.unknown_files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let config = ProcessorConfig::default();
        assert_eq!(classify(&FileId::root("main.c"), &config), FileCategory::SourceCode);
        assert_eq!(classify(&FileId::root("LICENSE"), &config), FileCategory::LicenseFile);
        assert_eq!(classify(&FileId::new(Some("doc"), "copying.txt"), &config), FileCategory::LicenseFile);
        assert_eq!(classify(&FileId::root("README.md"), &config), FileCategory::Unknown);
    }

    #[test]
    fn test_index_lists() {
        let mut index = FileIndex::default();
        index.push(FileId::root("a.java"), FileCategory::SourceCode);
        index.push(FileId::root("COPYING"), FileCategory::LicenseFile);
        index.push(FileId::root("b.png"), FileCategory::Unknown);
        index.push(FileId::root("c.php"), FileCategory::SourceCode);
        assert_eq!(index.len(), 4);
        assert_eq!(index.source_files, vec![FileId::root("a.java"), FileId::root("c.php")]);
    }
}
