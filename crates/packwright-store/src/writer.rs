use crate::archive::{CONTROL_ENTRY, COPYRIGHT_ENTRY};
use crate::payload::item_files;
use crate::{fsync_dir, StoreError};
use chrono::{Datelike, Local, Timelike};
use packwright_schema::InstallItem;
use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::Path;
use std::time::SystemTime;
use tempfile::NamedTempFile;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

fn zip_time(time: SystemTime) -> DateTime {
    let local: chrono::DateTime<Local> = time.into();
    let Ok(year) = u16::try_from(local.year()) else {
        return DateTime::default();
    };
    DateTime::from_date_and_time(
        year,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .unwrap_or_default()
}

fn entry_options(modified: DateTime) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(modified)
}

fn write_entries<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    control: &str,
    copyright: &str,
    items: &[InstallItem],
) -> Result<usize, StoreError> {
    let now = zip_time(SystemTime::now());
    zip.start_file(CONTROL_ENTRY, entry_options(now))?;
    zip.write_all(control.as_bytes())?;
    zip.start_file(COPYRIGHT_ENTRY, entry_options(now))?;
    zip.write_all(copyright.as_bytes())?;

    let mut count = 0;
    for item in items {
        for file in item_files(item)? {
            let modified = fs::metadata(&file.disc_path)?
                .modified()
                .map_or(now, zip_time);
            zip.start_file(file.archive_path.as_str(), entry_options(modified))?;
            let mut source = File::open(&file.disc_path)?;
            io::copy(&mut source, zip)?;
            count += 1;
        }
    }
    Ok(count)
}

/// Write a package archive holding the control record, the copyright text
/// and every file of `items`.
///
/// The archive is assembled in a temporary file next to `path` and renamed
/// into place only once complete, so a failure leaves no archive behind.
pub fn write_package(
    path: &Path,
    control: &str,
    copyright: &str,
    items: &[InstallItem],
) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    let mut zip = ZipWriter::new(tmp.as_file_mut());
    let count = write_entries(&mut zip, control, copyright, items)?;
    zip.finish()?;

    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    fsync_dir(dir)?;

    debug!(path = %path.display(), files = count, "package archive written");
    Ok(())
}
