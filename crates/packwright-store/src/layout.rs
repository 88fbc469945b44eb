use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = ".lock";

/// Publication bucket an archive is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Release,
    Beta,
}

impl Category {
    pub fn from_released(released: bool) -> Self {
        if released {
            Category::Release
        } else {
            Category::Beta
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            Category::Release => "release",
            Category::Beta => "beta",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Directory layout of a packages root.
///
/// ```text
/// <root>/release/<archives>
/// <root>/beta/<archives>
/// <root>/.lock
/// ```
#[derive(Debug, Clone)]
pub struct PackageLayout {
    root: PathBuf,
}

impl PackageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.root.join(category.dir_name())
    }

    #[inline]
    pub fn release_dir(&self) -> PathBuf {
        self.category_dir(Category::Release)
    }

    #[inline]
    pub fn beta_dir(&self) -> PathBuf {
        self.category_dir(Category::Beta)
    }

    #[inline]
    pub fn lock_file(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// Host path of the archive for `package` at `version` (`upstream-revision`).
    pub fn archive_path(&self, category: Category, package: &str, version: &str) -> PathBuf {
        self.category_dir(category)
            .join(host_leafname(&standard_leafname(package, version)))
    }

    pub fn initialize(&self) -> Result<(), StoreError> {
        fs::create_dir_all(self.release_dir())?;
        fs::create_dir_all(self.beta_dir())?;
        Ok(())
    }
}

/// `<package>_<version>` with every `.` turned into `/`, the form archive
/// names take on the target platform.
pub fn standard_leafname(package: &str, version: &str) -> String {
    format!("{package}_{version}").replace('.', "/")
}

/// Host file name for a standard leaf name.
pub fn host_leafname(leafname: &str) -> String {
    leafname.replace('/', ".")
}

/// Split an archive file name into package name and version text. The split
/// is at the last `_`; names without one are not archives.
pub fn parse_host_leafname(file_name: &str) -> Option<(String, String)> {
    let (package, version) = file_name.rsplit_once('_')?;
    if package.is_empty() || version.is_empty() {
        return None;
    }
    Some((package.to_owned(), version.replace('/', ".")))
}
