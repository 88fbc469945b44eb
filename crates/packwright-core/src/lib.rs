//! Publishing engine for packwright.
//!
//! This crate ties the schema and store layers together: the archive diff
//! that decides whether a candidate matches what was published before, the
//! publish decision state machine, package sources (extras directories and
//! catalogue rows), the batch `Publisher` with its run summary, and the TOML
//! configuration a run is driven from.

pub mod catalogue;
pub mod concurrency;
pub mod config;
pub mod diff;
pub mod policy;
pub mod publisher;
pub mod source;
pub mod summary;

pub use catalogue::{Catalogue, CatalogueError, CatalogueRow};
pub use concurrency::{install_signal_handler, shutdown_requested};
pub use config::{PublisherConfig, DEFAULT_CONFIG_FILE};
pub use diff::{compare_record, compare_with_archive, DiffOutcome, Difference};
pub use policy::{evaluate_publish, PublishDecision};
pub use publisher::{PackageOutcome, Publisher};
pub use source::{
    calc_version, catalogue_source, extras_source, validate_package_name, NameError,
    NameRegistry, PackageSource, SourceDefaults, MAX_PACKAGE_NAME_LEN,
};
pub use summary::{PackageReport, PackageStatus, RunSummary, SummaryCounts};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("control record error: {0}")]
    Control(#[from] packwright_schema::ControlError),
    #[error("invalid package version format: {0}")]
    Version(#[from] packwright_schema::VersionError),
    #[error("store error: {0}")]
    Store(#[from] packwright_store::StoreError),
    #[error("catalogue error: {0}")]
    Catalogue(#[from] CatalogueError),
    #[error("invalid package name: {0}")]
    Name(#[from] NameError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("package source error: {0}")]
    Source(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
