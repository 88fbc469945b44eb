//! Comparing a candidate package with a previously published archive.
//!
//! The checks run cheapest first and stop at the first difference: sizes of
//! the control record and copyright text, their contents, the set of payload
//! files and their sizes, and only then the payload bytes themselves.

use crate::CoreError;
use packwright_schema::{InstallItem, MetadataRecord};
use packwright_store::{item_files, PublishedArchive, CONTROL_ENTRY, COPYRIGHT_ENTRY};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

const COMPARE_BUFFER_SIZE: usize = 16 * 1024;

/// The first way a candidate differs from a published archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Difference {
    MissingEntry { entry: String },
    EntrySizeChanged { entry: String },
    EntryContentsChanged { entry: String },
    NewFile { path: PathBuf },
    FileSizeChanged { path: PathBuf },
    FilesRemoved { count: usize, first: String },
    FileContentsChanged { path: PathBuf },
    ShortRead { path: PathBuf },
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEntry { entry } => write!(f, "{entry} does not exist"),
            Self::EntrySizeChanged { entry } => write!(f, "{entry} size changed"),
            Self::EntryContentsChanged { entry } => write!(f, "{entry} contents changed"),
            Self::NewFile { path } => write!(f, "new file {}", path.display()),
            Self::FileSizeChanged { path } => write!(f, "file size changed {}", path.display()),
            Self::FilesRemoved { count, first } => {
                write!(f, "{count} files removed, first is {first}")
            }
            Self::FileContentsChanged { path } => write!(f, "{} contents changed", path.display()),
            Self::ShortRead { path } => write!(f, "{} read bytes size mismatch", path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    Unchanged,
    Changed(Difference),
}

impl DiffOutcome {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    pub fn difference(&self) -> Option<&Difference> {
        match self {
            Self::Unchanged => None,
            Self::Changed(d) => Some(d),
        }
    }
}

/// Compare a record's serialized form and payload with `archive`.
pub fn compare_record<A: PublishedArchive + ?Sized>(
    record: &MetadataRecord,
    archive: &mut A,
) -> Result<DiffOutcome, CoreError> {
    compare_with_archive(
        &record.control_text(),
        record.copyright(),
        record.items(),
        archive,
    )
}

/// Compare control text, copyright text and the files of `items` with the
/// contents of `archive`, reporting the first difference found.
pub fn compare_with_archive<A: PublishedArchive + ?Sized>(
    control: &str,
    copyright: &str,
    items: &[InstallItem],
    archive: &mut A,
) -> Result<DiffOutcome, CoreError> {
    let reserved = [(CONTROL_ENTRY, control), (COPYRIGHT_ENTRY, copyright)];

    for (entry, text) in reserved {
        let Some(published) = archive.entries().iter().find(|e| e.path == entry) else {
            return Ok(changed(Difference::MissingEntry {
                entry: entry.to_owned(),
            }));
        };
        if published.size != text.len() as u64 {
            return Ok(changed(Difference::EntrySizeChanged {
                entry: entry.to_owned(),
            }));
        }
    }

    for (entry, text) in reserved {
        if archive.read_entry(entry)? != text.as_bytes() {
            return Ok(changed(Difference::EntryContentsChanged {
                entry: entry.to_owned(),
            }));
        }
    }

    let mut remaining: BTreeMap<String, u64> = archive
        .entries()
        .iter()
        .filter(|e| e.path != CONTROL_ENTRY && e.path != COPYRIGHT_ENTRY)
        .map(|e| (e.path.as_str().to_owned(), e.size))
        .collect();

    let mut pairs = Vec::new();
    for item in items {
        for file in item_files(item)? {
            match remaining.get(file.archive_path.as_str()).copied() {
                None => {
                    return Ok(changed(Difference::NewFile {
                        path: file.disc_path,
                    }))
                }
                Some(size) if size != file.size => {
                    return Ok(changed(Difference::FileSizeChanged {
                        path: file.disc_path,
                    }))
                }
                Some(_) => {
                    remaining.remove(file.archive_path.as_str());
                    pairs.push(file);
                }
            }
        }
    }

    if let Some(first) = remaining.keys().next() {
        return Ok(changed(Difference::FilesRemoved {
            count: remaining.len(),
            first: first.clone(),
        }));
    }

    for file in &pairs {
        let mut disc = File::open(&file.disc_path)?;
        let mut published = archive.open_entry(file.archive_path.as_str())?;
        if let Some(difference) = compare_streams(&mut disc, &mut published, &file.disc_path)? {
            return Ok(changed(difference));
        }
    }

    debug!(files = pairs.len(), "candidate matches published archive");
    Ok(DiffOutcome::Unchanged)
}

fn changed(difference: Difference) -> DiffOutcome {
    debug!("difference found: {difference}");
    DiffOutcome::Changed(difference)
}

fn compare_streams(
    disc: &mut dyn Read,
    published: &mut dyn Read,
    path: &Path,
) -> Result<Option<Difference>, CoreError> {
    let mut disc_buf = vec![0u8; COMPARE_BUFFER_SIZE];
    let mut published_buf = vec![0u8; COMPARE_BUFFER_SIZE];
    loop {
        let disc_len = fill(disc, &mut disc_buf)?;
        let published_len = fill(published, &mut published_buf)?;
        if disc_len != published_len {
            return Ok(Some(Difference::ShortRead {
                path: path.to_path_buf(),
            }));
        }
        if disc_buf[..disc_len] != published_buf[..published_len] {
            return Ok(Some(Difference::FileContentsChanged {
                path: path.to_path_buf(),
            }));
        }
        if disc_len < COMPARE_BUFFER_SIZE {
            return Ok(None);
        }
    }
}

// Read until `buf` is full or the reader is exhausted.
fn fill(reader: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
