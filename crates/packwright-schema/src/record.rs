//! The package description that is validated, serialized and published.

use crate::depends::check_dependencies;
use crate::field::{Field, FieldErrors};
use crate::install_path::{validate_install_path, InstallPathError};
use crate::standards::{validate_standards_version, STANDARDS_BASELINE};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const MUST_BE_ENTERED: &str = "must be entered";
const NO_ITEMS: &str = "You must have a least one item to package";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MaintainerError {
    #[error("must be entered")]
    Empty,
    #[error("Email address must be included and enclosed in '<' and '>'")]
    MissingEmail,
    #[error("The '<' must appear before the '>' surrounding the email address")]
    Reversed,
}

pub fn validate_maintainer(value: &str) -> Result<(), MaintainerError> {
    if value.is_empty() {
        return Err(MaintainerError::Empty);
    }
    match (value.find('<'), value.find('>')) {
        (Some(lt), Some(gt)) if lt < gt => Ok(()),
        (Some(_), Some(_)) => Err(MaintainerError::Reversed),
        _ => Err(MaintainerError::MissingEmail),
    }
}

fn required(value: &str) -> Result<(), &'static str> {
    if value.is_empty() {
        Err(MUST_BE_ENTERED)
    } else {
        Ok(())
    }
}

// The summary shares the `Description:` line, so it cannot span lines.
fn single_line(value: &str) -> Result<(), &'static str> {
    required(value)?;
    if value.contains(['\n', '\r']) {
        return Err("must be a single line");
    }
    Ok(())
}

/// Whether an installed item may be relocated by the package manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentFlag {
    #[default]
    None,
    Movable,
}

/// One file or directory tree to package and where it is installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallItem {
    pub source: PathBuf,
    pub install_root: String,
    pub flag: ComponentFlag,
}

impl InstallItem {
    pub fn new(source: impl Into<PathBuf>, install_root: impl Into<String>, flag: ComponentFlag) -> Self {
        Self {
            source: source.into(),
            install_root: install_root.into(),
            flag,
        }
    }

    pub fn leaf_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Install location of the item itself, e.g. `Apps.Games.!Foo`.
    pub fn component(&self) -> String {
        format!("{}.{}", self.install_root, self.leaf_name())
    }
}

/// Mutable package description with per-field validation state.
///
/// Every setter re-validates only its own field and marks the record
/// modified. A record may be published only when [`error_count`] is zero.
///
/// [`error_count`]: MetadataRecord::error_count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    package_name: String,
    upstream_version: String,
    package_revision: String,
    section: String,
    priority: String,
    maintainer: String,
    standards_version: String,
    summary: String,
    description: String,
    licence: String,
    copyright: String,
    depends: String,
    recommends: String,
    suggests: String,
    conflicts: String,
    items: Vec<InstallItem>,
    declared_components: Vec<String>,
    modified: bool,
    errors: FieldErrors,
}

impl Default for MetadataRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataRecord {
    pub fn new() -> Self {
        let mut record = Self {
            package_name: String::new(),
            upstream_version: String::new(),
            package_revision: String::new(),
            section: String::new(),
            priority: String::new(),
            maintainer: String::new(),
            standards_version: String::new(),
            summary: String::new(),
            description: String::new(),
            licence: String::new(),
            copyright: String::new(),
            depends: String::new(),
            recommends: String::new(),
            suggests: String::new(),
            conflicts: String::new(),
            items: Vec::new(),
            declared_components: Vec::new(),
            modified: false,
            errors: FieldErrors::default(),
        };
        record.set_package_name("");
        record.set_upstream_version("");
        record.set_package_revision("1");
        record.set_section("");
        record.set_priority("Optional");
        record.set_maintainer("");
        record.set_standards_version(STANDARDS_BASELINE);
        record.set_summary("");
        record.set_licence("");
        record.set_copyright("");
        record.errors.set(Field::ItemToPackage, MUST_BE_ENTERED);
        record.modified = false;
        record
    }

    // --- accessors ---

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn upstream_version(&self) -> &str {
        &self.upstream_version
    }

    pub fn package_revision(&self) -> &str {
        &self.package_revision
    }

    /// `upstream-revision`, as written to the `Version` field.
    pub fn version(&self) -> String {
        format!("{}-{}", self.upstream_version, self.package_revision)
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn priority(&self) -> &str {
        &self.priority
    }

    pub fn maintainer(&self) -> &str {
        &self.maintainer
    }

    pub fn standards_version(&self) -> &str {
        &self.standards_version
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn licence(&self) -> &str {
        &self.licence
    }

    pub fn copyright(&self) -> &str {
        &self.copyright
    }

    pub fn depends(&self) -> &str {
        &self.depends
    }

    pub fn recommends(&self) -> &str {
        &self.recommends
    }

    pub fn suggests(&self) -> &str {
        &self.suggests
    }

    pub fn conflicts(&self) -> &str {
        &self.conflicts
    }

    pub fn items(&self) -> &[InstallItem] {
        &self.items
    }

    /// `Components` entries read from a control record. Serialization
    /// derives the field from the movable items instead.
    pub fn declared_components(&self) -> &[String] {
        &self.declared_components
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn clear_modified(&mut self) {
        self.modified = false;
    }

    // --- setters ---

    pub fn set_package_name(&mut self, value: impl Into<String>) {
        self.package_name = value.into();
        self.errors
            .apply(Field::PackageName, required(&self.package_name));
        self.modified = true;
    }

    pub fn set_upstream_version(&mut self, value: impl Into<String>) {
        self.upstream_version = value.into();
        self.errors
            .apply(Field::Version, required(&self.upstream_version));
        self.modified = true;
    }

    pub fn set_package_revision(&mut self, value: impl Into<String>) {
        self.package_revision = value.into();
        self.errors
            .apply(Field::PackageRevision, required(&self.package_revision));
        self.modified = true;
    }

    pub fn set_section(&mut self, value: impl Into<String>) {
        self.section = value.into();
        self.errors.apply(Field::Section, required(&self.section));
        self.modified = true;
    }

    pub fn set_priority(&mut self, value: impl Into<String>) {
        self.priority = value.into();
        self.errors.apply(Field::Priority, required(&self.priority));
        self.modified = true;
    }

    pub fn set_maintainer(&mut self, value: impl Into<String>) {
        self.maintainer = value.into();
        self.errors
            .apply(Field::Maintainer, validate_maintainer(&self.maintainer));
        self.modified = true;
    }

    pub fn set_standards_version(&mut self, value: impl Into<String>) {
        self.standards_version = value.into();
        self.errors.apply(
            Field::StandardsVersion,
            validate_standards_version(&self.standards_version),
        );
        self.modified = true;
    }

    pub fn set_summary(&mut self, value: impl Into<String>) {
        self.summary = value.into();
        self.errors.apply(Field::Summary, single_line(&self.summary));
        self.modified = true;
    }

    /// Description is optional and never carries an error.
    pub fn set_description(&mut self, value: impl Into<String>) {
        self.description = value.into();
        self.modified = true;
    }

    pub fn set_licence(&mut self, value: impl Into<String>) {
        self.licence = value.into();
        self.errors.apply(Field::Licence, required(&self.licence));
        self.modified = true;
    }

    pub fn set_copyright(&mut self, value: impl Into<String>) {
        self.copyright = value.into();
        self.errors.apply(Field::Copyright, required(&self.copyright));
        self.modified = true;
    }

    pub fn set_depends(&mut self, value: impl Into<String>) {
        self.depends = value.into();
        self.errors
            .apply(Field::Depends, check_dependencies(&self.depends));
        self.modified = true;
    }

    pub fn set_recommends(&mut self, value: impl Into<String>) {
        self.recommends = value.into();
        self.errors
            .apply(Field::Recommends, check_dependencies(&self.recommends));
        self.modified = true;
    }

    pub fn set_suggests(&mut self, value: impl Into<String>) {
        self.suggests = value.into();
        self.errors
            .apply(Field::Suggests, check_dependencies(&self.suggests));
        self.modified = true;
    }

    pub fn set_conflicts(&mut self, value: impl Into<String>) {
        self.conflicts = value.into();
        self.errors
            .apply(Field::Conflicts, check_dependencies(&self.conflicts));
        self.modified = true;
    }

    /// Record the `Components` entries of a parsed control record. Each entry
    /// is `<install path> [(flags)]` and its path must be a valid install path.
    pub fn set_declared_components(&mut self, components: Vec<String>) {
        let result = components.iter().try_for_each(|entry| {
            let path = entry.split('(').next().unwrap_or(entry).trim();
            validate_install_path(path).map_err(|e| format!("'{path}' {e}"))
        });
        self.declared_components = components;
        self.errors.apply(Field::Components, result);
        self.modified = true;
    }

    /// Add an item, replacing any existing item with the same source in place.
    pub fn set_item(&mut self, item: InstallItem) {
        self.errors.clear(Field::ItemToPackage);
        match self.items.iter_mut().find(|i| i.source == item.source) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
        self.revalidate_install_roots();
        self.modified = true;
    }

    /// Remove the item packaged from `source`. Returns whether one was found.
    pub fn remove_item(&mut self, source: &Path) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.source != source);
        if self.items.is_empty() {
            self.errors.set(Field::ItemToPackage, NO_ITEMS);
        }
        self.revalidate_install_roots();
        self.modified = true;
        before != self.items.len()
    }

    fn revalidate_install_roots(&mut self) {
        let result: Result<(), InstallPathError> = self
            .items
            .iter()
            .try_for_each(|i| validate_install_path(&i.install_root));
        self.errors.apply(Field::InstallTo, result);
    }

    // --- validation state ---

    pub fn error_count(&self) -> usize {
        self.errors.count()
    }

    pub fn is_publishable(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_text(&self, field: Field) -> Option<&str> {
        self.errors.get(field)
    }

    pub fn first_error(&self) -> Option<Field> {
        self.errors.first()
    }

    pub fn next_error(&self, current: Field) -> Option<Field> {
        self.errors.next(current)
    }

    /// Every field in error with its message, in field order.
    pub fn errors(&self) -> impl Iterator<Item = (Field, &str)> + '_ {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_record() -> MetadataRecord {
        let mut r = MetadataRecord::new();
        r.set_package_name("Foo");
        r.set_upstream_version("1.0");
        r.set_section("Games");
        r.set_maintainer("A Person <a@example.org>");
        r.set_summary("A game");
        r.set_licence("Free");
        r.set_copyright("Copyright A Person");
        r.set_item(InstallItem::new("/src/!Foo", "Apps.Games", ComponentFlag::Movable));
        r
    }

    #[test]
    fn new_record_has_defaults_and_mandatory_errors() {
        let r = MetadataRecord::new();
        assert_eq!(r.priority(), "Optional");
        assert_eq!(r.package_revision(), "1");
        assert_eq!(r.standards_version(), "0.4.0");
        assert!(!r.is_modified());
        for field in [
            Field::PackageName,
            Field::Version,
            Field::Section,
            Field::Maintainer,
            Field::Summary,
            Field::Licence,
            Field::Copyright,
            Field::ItemToPackage,
        ] {
            assert_eq!(r.error_text(field), Some("must be entered"), "{field}");
        }
        assert_eq!(r.error_count(), 8);
    }

    #[test]
    fn fully_populated_record_is_publishable() {
        let r = valid_record();
        assert_eq!(r.error_count(), 0, "{:?}", r.errors().collect::<Vec<_>>());
        assert!(r.is_publishable());
        assert!(r.is_modified());
        assert_eq!(r.first_error(), None);
    }

    #[test]
    fn setter_only_touches_its_own_field() {
        let mut r = valid_record();
        r.set_summary("");
        assert_eq!(r.error_count(), 1);
        assert_eq!(r.first_error(), Some(Field::Summary));
        r.set_summary("Back again");
        assert_eq!(r.error_count(), 0);
    }

    #[test]
    fn multi_line_summary_is_rejected() {
        let mut r = valid_record();
        r.set_summary("Two\nlines");
        assert_eq!(r.error_text(Field::Summary), Some("must be a single line"));
        assert!(!r.is_publishable());
        r.set_summary("Two lines");
        assert!(r.is_publishable());
    }

    #[test]
    fn maintainer_needs_bracketed_email() {
        assert_eq!(validate_maintainer("Me <me@x>"), Ok(()));
        assert_eq!(validate_maintainer("Me me@x"), Err(MaintainerError::MissingEmail));
        assert_eq!(validate_maintainer("Me <me@x"), Err(MaintainerError::MissingEmail));
        assert_eq!(validate_maintainer("Me >me@x<"), Err(MaintainerError::Reversed));
        assert_eq!(validate_maintainer(""), Err(MaintainerError::Empty));
    }

    #[test]
    fn empty_name_and_summary_navigate_cyclically() {
        let mut r = valid_record();
        r.set_package_name("");
        r.set_summary("");
        assert!(r.error_count() >= 2);

        let first = r.first_error().unwrap();
        assert_eq!(first, Field::PackageName);
        let second = r.next_error(first).unwrap();
        assert_eq!(second, Field::Summary);
        assert_eq!(r.next_error(second), Some(first));
    }

    #[test]
    fn set_item_replaces_same_source_in_place() {
        let mut r = valid_record();
        r.set_item(InstallItem::new("/src/!Bar", "Apps.Games", ComponentFlag::Movable));
        r.set_item(InstallItem::new("/src/!Foo", "Apps.Utilities", ComponentFlag::None));
        assert_eq!(r.items().len(), 2);
        assert_eq!(r.items()[0].install_root, "Apps.Utilities");
        assert_eq!(r.items()[1].component(), "Apps.Games.!Bar");
    }

    #[test]
    fn removing_last_item_invalidates_record() {
        let mut r = valid_record();
        assert!(r.remove_item(Path::new("/src/!Foo")));
        assert_eq!(
            r.error_text(Field::ItemToPackage),
            Some("You must have a least one item to package")
        );
        r.set_item(InstallItem::new("/src/!Foo", "Apps.Games", ComponentFlag::Movable));
        assert!(r.is_publishable());
    }

    #[test]
    fn bad_install_root_is_reported() {
        let mut r = valid_record();
        r.set_item(InstallItem::new("/src/!Bad", "Games", ComponentFlag::None));
        assert_eq!(
            r.error_text(Field::InstallTo),
            Some("must start with one of Apps, Manuals, Resources, Boot, !Boot, System")
        );
        assert!(r.remove_item(Path::new("/src/!Bad")));
        assert_eq!(r.error_text(Field::InstallTo), None);
    }

    #[test]
    fn dependency_fields_validate_syntax() {
        let mut r = valid_record();
        r.set_depends("PkgA (>1.2)");
        assert_eq!(
            r.error_text(Field::Depends),
            Some("'>' must be followed by another '>' or an '='")
        );
        r.set_depends("PkgA (>= 1.2), PkgB");
        assert_eq!(r.error_text(Field::Depends), None);
        r.set_conflicts("Old, , Older");
        assert_eq!(r.first_error(), Some(Field::Conflicts));
    }

    #[test]
    fn declared_components_must_use_install_categories() {
        let mut r = valid_record();
        r.set_declared_components(vec!["Apps.Games.!Foo (Movable)".to_owned()]);
        assert_eq!(r.error_text(Field::Components), None);
        r.set_declared_components(vec!["Nowhere.!Foo".to_owned()]);
        assert!(r
            .error_text(Field::Components)
            .unwrap()
            .starts_with("'Nowhere.!Foo' must start with one of"));
    }

    #[test]
    fn version_joins_upstream_and_revision() {
        let mut r = valid_record();
        r.set_package_revision("3");
        assert_eq!(r.version(), "1.0-3");
    }
}
