//! Expanding install items into the files they contribute to an archive.

use crate::StoreError;
use packwright_schema::{install_path_to_dir, ArchivePath, InstallItem};
use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A file on disc and the archive entry it is stored as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadFile {
    pub disc_path: PathBuf,
    pub archive_path: ArchivePath,
    pub size: u64,
}

/// Archive directory an item's contents are placed in: the install root
/// with `.` separators turned into `/`, followed by the item's leaf name.
pub fn item_archive_root(item: &InstallItem) -> String {
    format!("{}/{}", install_path_to_dir(&item.install_root), item.leaf_name())
}

// Files sort before directories so every directory's own files are visited
// before anything below it.
fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn archive_relative(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Every file an item contributes, in archive order. A single-file source
/// maps to `<root>/<leaf>`; a directory is walked recursively.
pub fn item_files(item: &InstallItem) -> Result<Vec<PayloadFile>, StoreError> {
    let root = item_archive_root(item);
    let meta = std::fs::metadata(&item.source).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreError::SourceNotFound(item.source.clone())
        } else {
            StoreError::Io(e)
        }
    })?;

    if !meta.is_dir() {
        return Ok(vec![PayloadFile {
            disc_path: item.source.clone(),
            archive_path: ArchivePath::new(root),
            size: meta.len(),
        }]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(&item.source).min_depth(1).sort_by(files_first) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(&item.source)
            .unwrap_or(entry.path());
        files.push(PayloadFile {
            disc_path: entry.path().to_path_buf(),
            archive_path: ArchivePath::new(format!("{root}/{}", archive_relative(relative))),
            size: entry.metadata()?.len(),
        });
    }
    Ok(files)
}
