use super::{json_pretty, source_defaults, EXIT_SUCCESS};
use packwright_core::{compare_record, extras_source, NameRegistry};
use packwright_schema::{DebianVersionScheme, MetadataRecord, VersionScheme};
use packwright_store::{parse_host_leafname, ZipPackage};
use std::cmp::Ordering;
use std::path::Path;

pub fn run(config_path: &Path, source_dir: &Path, archive: &Path, json: bool) -> Result<u8, String> {
    let defaults = source_defaults(config_path)?;

    let mut source = extras_source(source_dir, &defaults, &mut NameRegistry::new())
        .map_err(|e| e.to_string())?
        .ok_or_else(|| {
            format!(
                "control record error: no Control file in {}",
                source_dir.display()
            )
        })?;
    adopt_archive_version(&mut source.record, archive);

    let mut package = ZipPackage::open(archive).map_err(|e| format!("store error: {e}"))?;
    let outcome = compare_record(&source.record, &mut package).map_err(|e| e.to_string())?;

    if json {
        let payload = serde_json::json!({
            "package": source.name,
            "version": source.record.version(),
            "archive": archive,
            "unchanged": outcome.is_unchanged(),
            "difference": outcome.difference(),
        });
        println!("{}", json_pretty(&payload)?);
    } else if let Some(difference) = outcome.difference() {
        println!("{} differs from {}: {difference}", source.name, archive.display());
    } else {
        println!("{} matches {}", source.name, archive.display());
    }
    Ok(EXIT_SUCCESS)
}

// Publishing compares against the published version when the candidate is
// not newer, so the diff does the same with the version in the archive name.
fn adopt_archive_version(record: &mut MetadataRecord, archive: &Path) {
    let scheme = DebianVersionScheme;
    let Some((_, version)) = archive
        .file_name()
        .and_then(|n| parse_host_leafname(&n.to_string_lossy()))
    else {
        return;
    };
    let (Ok(published), Ok(candidate)) = (scheme.parse(&version), scheme.parse(&record.version()))
    else {
        return;
    };
    if scheme.compare(&candidate, &published) != Ordering::Greater {
        record.set_upstream_version(published.upstream_with_epoch());
        record.set_package_revision(published.revision);
    }
}
