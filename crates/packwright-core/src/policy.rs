//! Deciding whether, and how, a candidate package is published.

use crate::diff::{compare_record, DiffOutcome, Difference};
use crate::CoreError;
use packwright_schema::{next_revision, Field, MetadataRecord, ParsedVersion, VersionScheme};
use packwright_store::{Category, PublishedPackages, StoreError};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use tracing::debug;

/// Outcome of [`evaluate_publish`] for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum PublishDecision {
    /// The record has validation errors and is not published.
    Invalid { errors: Vec<(Field, String)> },
    /// Nothing has been published under this name before.
    NewPackage { category: Category },
    /// The published archive matches the candidate.
    UpToDate { category: Category },
    /// The candidate version is higher than anything published.
    UpgradeNewVersion {
        category: Category,
        previous: ParsedVersion,
    },
    /// Same version as published but the contents differ; the revision has
    /// been incremented.
    UpgradeContentChanged {
        category: Category,
        difference: Difference,
    },
    /// Only a beta archive exists and this run publishes releases.
    UpgradeBetaToRelease,
}

impl PublishDecision {
    /// Category to write the archive into, or `None` when nothing is written.
    pub fn publish_category(&self) -> Option<Category> {
        match self {
            Self::Invalid { .. } | Self::UpToDate { .. } => None,
            Self::NewPackage { category }
            | Self::UpgradeNewVersion { category, .. }
            | Self::UpgradeContentChanged { category, .. } => Some(*category),
            Self::UpgradeBetaToRelease => Some(Category::Release),
        }
    }

    pub fn is_upgrade(&self) -> bool {
        matches!(
            self,
            Self::UpgradeNewVersion { .. }
                | Self::UpgradeContentChanged { .. }
                | Self::UpgradeBetaToRelease
        )
    }

    /// The validation errors as `Label message` pairs joined by `, `.
    pub fn error_summary(&self) -> Option<String> {
        match self {
            Self::Invalid { errors } => Some(
                errors
                    .iter()
                    .map(|(field, msg)| format!("{} {msg}", field.label()))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            _ => None,
        }
    }
}

impl fmt::Display for PublishDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { .. } => {
                let errors = self.error_summary().unwrap_or_default();
                write!(f, "invalid package - {errors}")
            }
            Self::NewPackage { category } => write!(f, "new {category} package"),
            Self::UpToDate { .. } => f.write_str("is up to date"),
            Self::UpgradeNewVersion { previous, .. } => {
                write!(f, "upgrade (new version, was {previous})")
            }
            Self::UpgradeContentChanged { difference, .. } => write!(f, "upgrade ({difference})"),
            Self::UpgradeBetaToRelease => f.write_str("upgrade (beta to release)"),
        }
    }
}

/// Decide what to do with `record` given what has been published.
///
/// When the candidate is not newer than the latest published version the
/// record takes over the published version before it is compared, so a
/// content change republishes it one revision above the previous archive.
pub fn evaluate_publish<P, S>(
    record: &mut MetadataRecord,
    published: &P,
    scheme: &S,
    released: bool,
) -> Result<PublishDecision, CoreError>
where
    P: PublishedPackages + ?Sized,
    S: VersionScheme + ?Sized,
{
    if !record.is_publishable() {
        let errors = record
            .errors()
            .map(|(field, msg)| (field, msg.to_owned()))
            .collect();
        return Ok(PublishDecision::Invalid { errors });
    }

    let target = Category::from_released(released);
    let name = record.package_name().to_owned();

    let Some(previous) = published.latest(&name).cloned() else {
        return Ok(PublishDecision::NewPackage { category: target });
    };

    let candidate = scheme.parse(&record.version())?;
    if scheme.compare(&candidate, &previous) == Ordering::Greater {
        return Ok(PublishDecision::UpgradeNewVersion {
            category: target,
            previous,
        });
    }

    debug!(package = %name, candidate = %candidate, previous = %previous, "adopting published version");
    record.set_upstream_version(previous.upstream_with_epoch());
    record.set_package_revision(previous.revision.clone());

    let located = published
        .locate(&name, &previous)
        .ok_or_else(|| StoreError::ArchiveNotFound {
            package: name.clone(),
            version: previous.to_string(),
        })?;

    if located == Category::Beta && released {
        return Ok(PublishDecision::UpgradeBetaToRelease);
    }

    let mut archive = published.open(&name, &previous, located)?;
    match compare_record(record, &mut archive)? {
        DiffOutcome::Unchanged => Ok(PublishDecision::UpToDate { category: located }),
        DiffOutcome::Changed(difference) => {
            let revision = next_revision(&previous.revision)?;
            record.set_package_revision(revision);
            Ok(PublishDecision::UpgradeContentChanged {
                category: target,
                difference,
            })
        }
    }
}
