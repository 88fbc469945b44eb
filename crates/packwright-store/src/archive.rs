//! Read access to published package archives.

use crate::StoreError;
use packwright_schema::ArchivePath;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use zip::result::ZipError;
use zip::ZipArchive;

/// Archive entry holding the control record.
pub const CONTROL_ENTRY: &str = "RiscPkg/Control";
/// Archive entry holding the copyright text.
pub const COPYRIGHT_ENTRY: &str = "RiscPkg/Copyright";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: ArchivePath,
    pub size: u64,
}

/// A previously published archive: its file entries with their uncompressed
/// sizes, and streaming access to an entry's bytes.
pub trait PublishedArchive {
    /// File entries in archive order. Directory entries are not listed.
    fn entries(&self) -> &[ArchiveEntry];

    fn open_entry(&mut self, path: &str) -> Result<Box<dyn Read + '_>, StoreError>;

    fn read_entry(&mut self, path: &str) -> Result<Vec<u8>, StoreError> {
        let mut buf = Vec::new();
        self.open_entry(path)?.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// A zip archive on disc.
pub struct ZipPackage {
    path: PathBuf,
    archive: ZipArchive<File>,
    entries: Vec<ArchiveEntry>,
}

impl ZipPackage {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(file)?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            entries.push(ArchiveEntry {
                path: ArchivePath::new(entry.name()),
                size: entry.size(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            archive,
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PublishedArchive for ZipPackage {
    fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    fn open_entry(&mut self, path: &str) -> Result<Box<dyn Read + '_>, StoreError> {
        match self.archive.by_name(path) {
            Ok(file) => Ok(Box::new(file)),
            Err(ZipError::FileNotFound) => Err(StoreError::EntryNotFound(path.to_owned())),
            Err(e) => Err(e.into()),
        }
    }
}

/// An archive held in memory, for building expectations in tests and for
/// callers that already have the entry bytes.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    files: BTreeMap<String, Vec<u8>>,
    entries: Vec<ArchiveEntry>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, path: &str, bytes: impl Into<Vec<u8>>) {
        let bytes = bytes.into();
        let size = bytes.len() as u64;
        match self.entries.iter_mut().find(|e| e.path == path) {
            Some(entry) => entry.size = size,
            None => self.entries.push(ArchiveEntry {
                path: ArchivePath::new(path),
                size,
            }),
        }
        self.files.insert(path.to_owned(), bytes);
    }
}

impl PublishedArchive for MemoryArchive {
    fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    fn open_entry(&mut self, path: &str) -> Result<Box<dyn Read + '_>, StoreError> {
        self.files
            .get(path)
            .map(|bytes| Box::new(Cursor::new(bytes.as_slice())) as Box<dyn Read + '_>)
            .ok_or_else(|| StoreError::EntryNotFound(path.to_owned()))
    }
}
