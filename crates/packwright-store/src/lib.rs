//! Published package storage for packwright.
//!
//! This crate provides the storage layer: `PackageLayout` for the release and
//! beta archive directories and archive naming, the `PublishedArchive` read
//! capability with zip-backed and in-memory implementations, the atomic zip
//! writer `write_package`, the `PublishedIndex` of highest published versions,
//! and `StoreLock` guarding a packages directory for the length of a run.

pub mod archive;
pub mod index;
pub mod layout;
pub mod lock;
pub mod payload;
pub mod writer;

pub use archive::{ArchiveEntry, MemoryArchive, PublishedArchive, ZipPackage, COPYRIGHT_ENTRY, CONTROL_ENTRY};
pub use index::{PublishedIndex, PublishedPackages};
pub use layout::{host_leafname, parse_host_leafname, standard_leafname, Category, PackageLayout};
pub use lock::StoreLock;
pub use payload::{item_archive_root, item_files, PayloadFile};
pub use writer::write_package;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fsync a directory so a preceding `rename()` is durable.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("failed to walk package source: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("entry not found in archive: {0}")]
    EntryNotFound(String),
    #[error("no published archive for {package} {version}")]
    ArchiveNotFound { package: String, version: String },
    #[error("unable to read file/directory {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("lock acquisition failed: {0}")]
    LockFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display_archive_not_found() {
        let e = StoreError::ArchiveNotFound {
            package: "Foo".to_owned(),
            version: "1.0-2".to_owned(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Foo"));
        assert!(msg.contains("1.0-2"));
    }

    #[test]
    fn store_error_display_entry_not_found() {
        let e = StoreError::EntryNotFound("RiscPkg/Control".to_owned());
        assert!(e.to_string().contains("RiscPkg/Control"));
    }

    #[test]
    fn store_error_display_source_not_found() {
        let e = StoreError::SourceNotFound(PathBuf::from("/src/!Foo"));
        assert!(e.to_string().contains("/src/!Foo"));
    }

    #[test]
    fn store_error_display_lock_failed() {
        let e = StoreError::LockFailed("reason".to_owned());
        assert!(e.to_string().contains("reason"));
    }
}
