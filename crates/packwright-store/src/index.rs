use crate::archive::{PublishedArchive, ZipPackage};
use crate::layout::{parse_host_leafname, Category, PackageLayout};
use crate::StoreError;
use packwright_schema::{ParsedVersion, VersionScheme};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use tracing::{debug, warn};

/// Lookup of what has already been published.
pub trait PublishedPackages {
    type Archive: PublishedArchive;

    /// Highest version of `package` across every category.
    fn latest(&self, package: &str) -> Option<&ParsedVersion>;

    /// Category holding the archive for `package` at `version`. The release
    /// category is checked before beta.
    fn locate(&self, package: &str, version: &ParsedVersion) -> Option<Category>;

    fn open(
        &self,
        package: &str,
        version: &ParsedVersion,
        category: Category,
    ) -> Result<Self::Archive, StoreError>;
}

/// Highest published version of every package under a [`PackageLayout`].
#[derive(Debug, Clone)]
pub struct PublishedIndex {
    layout: PackageLayout,
    latest: BTreeMap<String, ParsedVersion>,
}

impl PublishedIndex {
    pub fn empty(layout: PackageLayout) -> Self {
        Self {
            layout,
            latest: BTreeMap::new(),
        }
    }

    /// Scan the release and beta directories. Missing directories count as
    /// empty; file names whose version does not parse are skipped.
    pub fn scan<S: VersionScheme + ?Sized>(
        layout: &PackageLayout,
        scheme: &S,
    ) -> Result<Self, StoreError> {
        let mut index = Self::empty(layout.clone());

        for category in [Category::Release, Category::Beta] {
            let dir = layout.category_dir(category);
            if !dir.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                if !entry.file_type()?.is_file() {
                    continue;
                }
                let file_name = entry.file_name().to_string_lossy().into_owned();
                let Some((package, version_text)) = parse_host_leafname(&file_name) else {
                    continue;
                };
                match scheme.parse(&version_text) {
                    Ok(version) => index.record(&package, version, scheme),
                    Err(e) => {
                        warn!(file = %file_name, category = %category, "skipping published archive: {e}");
                    }
                }
            }
        }

        debug!(packages = index.len(), "published index built");
        Ok(index)
    }

    /// Note `version` of `package` as published, keeping the higher of it
    /// and any version already known.
    pub fn record<S: VersionScheme + ?Sized>(
        &mut self,
        package: &str,
        version: ParsedVersion,
        scheme: &S,
    ) {
        match self.latest.get_mut(package) {
            Some(current) => {
                if scheme.compare(&version, current) == Ordering::Greater {
                    *current = version;
                }
            }
            None => {
                self.latest.insert(package.to_owned(), version);
            }
        }
    }

    pub fn layout(&self) -> &PackageLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParsedVersion)> + '_ {
        self.latest.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl PublishedPackages for PublishedIndex {
    type Archive = ZipPackage;

    fn latest(&self, package: &str) -> Option<&ParsedVersion> {
        self.latest.get(package)
    }

    fn locate(&self, package: &str, version: &ParsedVersion) -> Option<Category> {
        let version = version.to_string();
        [Category::Release, Category::Beta]
            .into_iter()
            .find(|&c| self.layout.archive_path(c, package, &version).is_file())
    }

    fn open(
        &self,
        package: &str,
        version: &ParsedVersion,
        category: Category,
    ) -> Result<ZipPackage, StoreError> {
        let path = self
            .layout
            .archive_path(category, package, &version.to_string());
        if !path.is_file() {
            return Err(StoreError::ArchiveNotFound {
                package: package.to_owned(),
                version: version.to_string(),
            });
        }
        ZipPackage::open(&path)
    }
}
