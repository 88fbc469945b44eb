//! Package metadata, validation rules and the control record format for packwright.
//!
//! This crate defines the schema layer: the mutable [`MetadataRecord`] with
//! per-field validation state, the dependency grammar, install path and
//! `Standards-Version` rules, the `RiscPkg/Control` codec, and version ordering
//! behind the [`VersionScheme`] trait.

pub mod control;
pub mod depends;
pub mod field;
pub mod install_path;
pub mod record;
pub mod standards;
pub mod types;
pub mod version;

pub use control::{parse_control, ControlError};
pub use depends::{check_dependencies, parse_dependencies, Dependency, DependencyError, Relation};
pub use field::{Field, FieldErrors};
pub use install_path::{
    install_path_to_dir, validate_install_path, InstallPathError, INSTALL_CATEGORIES,
};
pub use record::{validate_maintainer, ComponentFlag, InstallItem, MaintainerError, MetadataRecord};
pub use standards::{
    compare_dotted, validate_standards_version, StandardsVersionError, STANDARDS_BASELINE,
};
pub use types::ArchivePath;
pub use version::{next_revision, DebianVersionScheme, ParsedVersion, VersionError, VersionScheme};
