//! Building candidate records from package sources on disc.
//!
//! Two kinds of source feed a run: extras directories, each holding its own
//! `Control` record, and catalogue rows naming a directory under the sources
//! root. Either way every directory entry becomes an install item: the
//! children of `!Boot` and `Boot` install under that root, everything else
//! installs under the configured base location as a movable component.

use crate::catalogue::CatalogueRow;
use crate::CoreError;
use packwright_schema::{ComponentFlag, InstallItem, MetadataRecord};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const MAX_PACKAGE_NAME_LEN: usize = 31;
const INVALID_NAME_CHARS: [char; 7] = [' ', ':', '\'', '<', '>', '*', '?'];

const CONTROL_FILE: &str = "Control";
const COPYRIGHT_FILE: &str = "Copyright";
const BOOT_DIRS: [&str; 2] = ["!Boot", "Boot"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("No package name")]
    Empty,
    #[error("Package name is longer than 31 chars")]
    TooLong,
    #[error("Package name contains invalid characters ( :'<>*?)")]
    InvalidCharacters,
    #[error("Package name has already been used")]
    AlreadyUsed,
}

pub fn validate_package_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.len() > MAX_PACKAGE_NAME_LEN {
        return Err(NameError::TooLong);
    }
    if name.contains(INVALID_NAME_CHARS) {
        return Err(NameError::InvalidCharacters);
    }
    Ok(())
}

/// Package names and default install locations claimed so far in a run.
#[derive(Debug, Default)]
pub struct NameRegistry {
    names: HashSet<String>,
    components: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `name` and reserve it for the rest of the run.
    pub fn claim_name(&mut self, name: &str) -> Result<(), NameError> {
        validate_package_name(name)?;
        if !self.names.insert(name.to_owned()) {
            return Err(NameError::AlreadyUsed);
        }
        Ok(())
    }

    /// Reserve the item's install location. When another package already
    /// installs there the item is moved to `<base_install>.<disambiguator>`.
    pub fn place_component(
        &mut self,
        mut item: InstallItem,
        base_install: &str,
        disambiguator: &str,
    ) -> InstallItem {
        if self.components.insert(item.component()) {
            return item;
        }
        info!(
            component = %item.component(),
            "default install location already used, using {disambiguator} to disambiguate"
        );
        item.install_root = format!("{base_install}.{disambiguator}");
        item
    }

    pub fn names(&self) -> usize {
        self.names.len()
    }
}

/// Values a source falls back to when its own metadata leaves them empty.
#[derive(Debug, Clone)]
pub struct SourceDefaults {
    pub maintainer: String,
    pub base_install: String,
    pub section: String,
    pub licence: String,
    /// Copyright text shared by every catalogue package.
    pub standard_copyright: Option<String>,
}

/// A candidate record and the category it is published into.
#[derive(Debug, Clone)]
pub struct PackageSource {
    pub name: String,
    pub directory: PathBuf,
    pub record: MetadataRecord,
    pub released: bool,
}

fn sorted_entries(dir: &Path) -> Result<Vec<String>, CoreError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

fn add_items(
    record: &mut MetadataRecord,
    dir: &Path,
    entries: &[String],
    defaults: &SourceDefaults,
    registry: &mut NameRegistry,
) -> Result<(), CoreError> {
    let mut boot_dirs = Vec::new();
    for entry in entries {
        if entry == CONTROL_FILE || entry == COPYRIGHT_FILE {
            continue;
        }
        if BOOT_DIRS.contains(&entry.as_str()) {
            boot_dirs.push(entry);
            continue;
        }
        let item = InstallItem::new(dir.join(entry), &defaults.base_install, ComponentFlag::Movable);
        let item = registry.place_component(item, &defaults.base_install, record.package_name());
        record.set_item(item);
    }
    for boot in boot_dirs {
        let boot_dir = dir.join(boot);
        for child in sorted_entries(&boot_dir)? {
            record.set_item(InstallItem::new(boot_dir.join(child), boot.as_str(), ComponentFlag::None));
        }
    }
    Ok(())
}

fn fill_defaults(record: &mut MetadataRecord, defaults: &SourceDefaults) {
    if record.section().is_empty() {
        record.set_section(defaults.section.as_str());
    }
    if record.maintainer().is_empty() {
        record.set_maintainer(defaults.maintainer.as_str());
    }
    if record.licence().is_empty() {
        record.set_licence(defaults.licence.as_str());
    }
}

fn leaf_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Build a candidate from an extras directory. Returns `None` when `dir` has
/// no `Control` file and so is not a package source. Extras always publish
/// into the beta category.
pub fn extras_source(
    dir: &Path,
    defaults: &SourceDefaults,
    registry: &mut NameRegistry,
) -> Result<Option<PackageSource>, CoreError> {
    let control = dir.join(CONTROL_FILE);
    if !control.is_file() {
        debug!(dir = %dir.display(), "no Control file, not a package source");
        return Ok(None);
    }

    let copyright = match fs::read_to_string(dir.join(COPYRIGHT_FILE)) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => defaults
            .standard_copyright
            .clone()
            .ok_or_else(|| CoreError::Source("Missing 'Copyright' file".to_owned()))?,
        Err(e) => return Err(e.into()),
    };

    let mut record = MetadataRecord::new();
    record.set_package_name(leaf_name(dir));
    record
        .read_control_file(&control)
        .map_err(|e| CoreError::Source(format!("Error reading Control file {e}")))?;
    registry.claim_name(record.package_name())?;
    record.set_copyright(copyright);

    let mut version = record.upstream_version().to_owned();
    if version.starts_with('{') {
        version = calc_version(dir, &version)
            .map_err(|e| CoreError::Source(format!("Invalid version in Control {e}")))?;
    }
    if version.is_empty() {
        version = "0".to_owned();
    }
    record.set_upstream_version(version);
    if record.package_revision().is_empty() {
        record.set_package_revision("1");
    }
    fill_defaults(&mut record, defaults);

    let entries = sorted_entries(dir)?;
    add_items(&mut record, dir, &entries, defaults, registry)?;

    Ok(Some(PackageSource {
        name: record.package_name().to_owned(),
        directory: dir.to_path_buf(),
        record,
        released: false,
    }))
}

/// Build a candidate from a catalogue row. Returns `None` for rows without a
/// package name, which are not packaged.
///
/// The row's version always applies with revision 1, and its summary
/// replaces the control record's. Description and depends only fill fields
/// the control record leaves empty. The copyright text is the summary
/// followed by the standard copyright.
pub fn catalogue_source(
    row: &CatalogueRow,
    sources_dir: &Path,
    defaults: &SourceDefaults,
    registry: &mut NameRegistry,
) -> Result<Option<PackageSource>, CoreError> {
    let name = row.get("Package").trim();
    if name.is_empty() {
        return Ok(None);
    }
    registry.claim_name(name)?;

    let directory = match row.get("Directory").trim() {
        "" => name,
        d => d,
    };
    let dir = sources_dir.join(directory);
    if !dir.is_dir() {
        return Err(CoreError::Source(format!(
            "Unable to find package directory {}",
            dir.display()
        )));
    }
    let entries = sorted_entries(&dir)?;

    let mut record = MetadataRecord::new();
    if entries.iter().any(|e| e == CONTROL_FILE) {
        record.read_control_file(&dir.join(CONTROL_FILE))?;
    }
    if record.package_name().is_empty() {
        record.set_package_name(name);
    }

    let version = match row.get("Version").trim() {
        "" => "0",
        v => v,
    };
    record.set_upstream_version(version);
    record.set_package_revision("1");

    // quoted catalogue cells may hold line breaks
    let summary = row.get("Summary").lines().map(str::trim).collect::<Vec<_>>().join(" ");
    if !summary.is_empty() {
        record.set_summary(summary);
    }
    if record.description().is_empty() {
        record.set_description(row.get("Description"));
    }
    if record.depends().is_empty() {
        record.set_depends(row.get("Depends"));
    }
    fill_defaults(&mut record, defaults);

    let copyright = match &defaults.standard_copyright {
        Some(standard) => Some(format!("{}\n\n{standard}", record.summary())),
        None => match fs::read_to_string(dir.join(COPYRIGHT_FILE)) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        },
    };
    if let Some(copyright) = copyright {
        record.set_copyright(copyright);
    }

    add_items(&mut record, &dir, &entries, defaults, registry)?;

    Ok(Some(PackageSource {
        name: name.to_owned(),
        directory: dir,
        record,
        released: row.get("Released").trim() == "Y",
    }))
}

/// Evaluate a computed version of the form
/// `{FromFile(<file>,<prefix>(<version>)<suffix>)}<tail>`: the version is the
/// text between `prefix` and `suffix` on the first line of `<file>` that
/// holds both, followed by `<tail>`. An empty suffix takes the rest of the
/// line.
pub fn calc_version(dir: &Path, expression: &str) -> Result<String, String> {
    let fail = |reason: String| format!("'{expression}' {reason}");

    let close = expression
        .rfind('}')
        .ok_or_else(|| fail("missing closing '}'".to_owned()))?;
    let tail = &expression[close + 1..];
    let body = &expression[1..close];

    let (Some(open_paren), Some(close_paren)) = (body.find('('), body.rfind(')')) else {
        return Err(fail("missing bracket '(' and/or ')'".to_owned()));
    };
    let function = &body[..open_paren];
    if function != "FromFile" {
        return Err(fail(format!("invalid function '{function}'")));
    }
    let args = &body[open_paren + 1..close_paren];
    let (file_name, pattern) = args
        .split_once(',')
        .ok_or_else(|| fail("missing comma".to_owned()))?;

    let capture_start = pattern
        .find('(')
        .ok_or_else(|| fail(format!("missing left bracket in '{pattern}'")))?;
    let capture_end = pattern[capture_start + 1..]
        .find(')')
        .map(|i| i + capture_start + 1)
        .ok_or_else(|| fail(format!("missing right bracket in '{pattern}'")))?;
    let prefix = &pattern[..capture_start];
    let suffix = &pattern[capture_end + 1..];

    let path = dir.join(file_name);
    let text = fs::read_to_string(&path)
        .map_err(|_| fail(format!("could not open file '{}'", path.display())))?;

    for line in text.lines() {
        let Some(pos) = line.find(prefix) else {
            continue;
        };
        let rest = &line[pos + prefix.len()..];
        let found = if suffix.is_empty() {
            Some(rest.trim_end())
        } else {
            rest.find(suffix).map(|end| &rest[..end])
        };
        if let Some(version) = found.filter(|v| !v.is_empty()) {
            return Ok(format!("{version}{tail}"));
        }
    }
    Err(fail(format!("pattern '{pattern}' not found in '{file_name}'")))
}
