//! Publishing candidates one at a time and running a whole batch.

use crate::catalogue::Catalogue;
use crate::config::PublisherConfig;
use crate::policy::{evaluate_publish, PublishDecision};
use crate::source::{catalogue_source, extras_source, NameRegistry, PackageSource};
use crate::summary::{PackageStatus, RunSummary};
use crate::CoreError;
use packwright_schema::{DebianVersionScheme, MetadataRecord, VersionScheme};
use packwright_store::{write_package, PackageLayout, PublishedIndex, StoreLock};
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// What happened to one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOutcome {
    pub decision: PublishDecision,
    /// Archive written, or that would have been written on a dry run.
    pub archive: Option<PathBuf>,
}

impl PackageOutcome {
    pub fn status(&self) -> PackageStatus {
        match &self.decision {
            PublishDecision::Invalid { .. } => PackageStatus::Error,
            PublishDecision::NewPackage { .. } => PackageStatus::New,
            PublishDecision::UpToDate { .. } => PackageStatus::Unchanged,
            PublishDecision::UpgradeNewVersion { .. }
            | PublishDecision::UpgradeContentChanged { .. }
            | PublishDecision::UpgradeBetaToRelease => PackageStatus::Upgraded,
        }
    }
}

/// Publishes candidates into a packages root, keeping its index of
/// published versions current as archives are written.
pub struct Publisher<S: VersionScheme = DebianVersionScheme> {
    index: PublishedIndex,
    scheme: S,
    dry_run: bool,
}

impl Publisher<DebianVersionScheme> {
    pub fn open(layout: &PackageLayout) -> Result<Self, CoreError> {
        Self::with_scheme(layout, DebianVersionScheme)
    }
}

impl<S: VersionScheme> Publisher<S> {
    /// Scan `layout` for published archives and order versions with `scheme`.
    pub fn with_scheme(layout: &PackageLayout, scheme: S) -> Result<Self, CoreError> {
        let index = PublishedIndex::scan(layout, &scheme)?;
        info!("{} current packages found", index.len());
        Ok(Self {
            index,
            scheme,
            dry_run: false,
        })
    }

    /// Decide every candidate but write nothing.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn index(&self) -> &PublishedIndex {
        &self.index
    }

    pub fn layout(&self) -> &PackageLayout {
        self.index.layout()
    }

    /// Decide what to do with `record` and write its archive when the
    /// decision calls for one. The record may come back with the published
    /// version adopted or its revision incremented.
    pub fn publish(
        &mut self,
        record: &mut MetadataRecord,
        released: bool,
    ) -> Result<PackageOutcome, CoreError> {
        let name = record.package_name().to_owned();
        let decision = evaluate_publish(record, &self.index, &self.scheme, released)?;
        info!(package = %name, "{decision}");

        let Some(category) = decision.publish_category() else {
            return Ok(PackageOutcome {
                decision,
                archive: None,
            });
        };

        let version = record.version();
        let path = self.layout().archive_path(category, &name, &version);
        if self.dry_run {
            info!(package = %name, "dry run, not writing {}", path.display());
        } else {
            debug!(package = %name, "creating/saving package to {}", path.display());
            write_package(&path, &record.control_text(), record.copyright(), record.items())?;
            record.clear_modified();
        }

        let parsed = self.scheme.parse(&version)?;
        self.index.record(&name, parsed, &self.scheme);
        Ok(PackageOutcome {
            decision,
            archive: Some(path),
        })
    }

    /// Publish one prepared source and note the result in `summary`. Errors
    /// are reported and recorded; they never stop the batch.
    pub fn publish_source(
        &mut self,
        label: &str,
        source: Result<Option<PackageSource>, CoreError>,
        summary: &mut RunSummary,
    ) -> Option<PackageOutcome> {
        let mut source = match source {
            Ok(Some(source)) => source,
            Ok(None) => {
                info!(package = %label, "not packaged");
                summary.record(label, PackageStatus::Skipped, "not packaged");
                return None;
            }
            Err(e) => {
                error!(package = %label, "{e}");
                summary.record(label, PackageStatus::Error, e.to_string());
                return None;
            }
        };

        match self.publish(&mut source.record, source.released) {
            Ok(outcome) => {
                let status = outcome.status();
                if status == PackageStatus::Error {
                    error!(package = %source.name, "{}", outcome.decision);
                }
                summary.record(&source.name, status, outcome.decision.to_string());
                Some(outcome)
            }
            Err(e) => {
                error!(package = %source.name, "{e}");
                summary.record(&source.name, PackageStatus::Error, e.to_string());
                None
            }
        }
    }

    /// Run every extras directory and catalogue row in `config`.
    ///
    /// Requires a `&StoreLock` as proof that the caller holds the packages
    /// root lock for the length of the run.
    pub fn run(
        &mut self,
        _lock: &StoreLock,
        config: &PublisherConfig,
        summary: &mut RunSummary,
    ) -> Result<(), CoreError> {
        self.run_with_cancel(config, summary, crate::shutdown_requested)
    }

    /// As [`run`](Self::run), checking `should_stop` before each package.
    /// Packages not reached are recorded as skipped.
    pub fn run_with_cancel(
        &mut self,
        config: &PublisherConfig,
        summary: &mut RunSummary,
        should_stop: impl Fn() -> bool,
    ) -> Result<(), CoreError> {
        let defaults = config.source_defaults()?;
        let catalogue = match &config.catalogue {
            Some(path) => {
                info!("reading catalogue {}", path.display());
                Some(Catalogue::load(path, config.catalogue_header_lines)?)
            }
            None => None,
        };
        let extras = match &config.extras_dir {
            Some(dir) => extras_dirs(dir)?,
            None => Vec::new(),
        };

        if !self.dry_run {
            self.layout().initialize()?;
        }

        let rows = catalogue.as_ref().map(Catalogue::iter).into_iter().flatten();
        let total = extras.len() + catalogue.as_ref().map_or(0, Catalogue::len);
        info!("{total} packages to check/create");

        let mut registry = NameRegistry::new();
        let mut done = 0;
        let mut stopped = false;

        for dir in &extras {
            if should_stop() {
                stopped = true;
                break;
            }
            let label = dir
                .file_name()
                .map_or_else(|| dir.display().to_string(), |n| n.to_string_lossy().into_owned());
            let source = extras_source(dir, &defaults, &mut registry);
            self.publish_source(&label, source, summary);
            done += 1;
        }

        for (i, row) in rows.enumerate() {
            if stopped || should_stop() {
                break;
            }
            let label = match row.get("Package") {
                "" => format!("row {}", i + 1),
                name => name.to_owned(),
            };
            let source = catalogue_source(row, &config.sources_dir, &defaults, &mut registry);
            self.publish_source(&label, source, summary);
            done += 1;
        }

        if done < total {
            warn!("run stopped early, {} packages not processed", total - done);
            for _ in done..total {
                summary.record("-", PackageStatus::Skipped, "shutdown requested");
            }
        }

        if let Some(logs) = &config.logs_dir {
            summary.write_to(logs)?;
        }
        Ok(())
    }
}

// Sub-directories of the extras root in name order. Only those holding a
// Control file turn out to be package sources.
fn extras_dirs(root: &std::path::Path) -> Result<Vec<PathBuf>, CoreError> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use packwright_schema::{ComponentFlag, InstallItem};
    use packwright_store::{Category, PublishedPackages};
    use std::fs;
    use std::path::Path;

    fn record(source: &Path) -> MetadataRecord {
        let mut r = MetadataRecord::new();
        r.set_package_name("Foo");
        r.set_upstream_version("1.0");
        r.set_section("Games");
        r.set_maintainer("Jo Bloggs <jo@example.com>");
        r.set_summary("Foo game");
        r.set_licence("Free");
        r.set_copyright("Copyright Jo");
        r.set_item(InstallItem::new(source, "Apps.Games", ComponentFlag::Movable));
        r
    }

    fn app(root: &Path) -> PathBuf {
        let app = root.join("src").join("!Foo");
        fs::create_dir_all(&app).unwrap();
        fs::write(app.join("!Run"), b"run").unwrap();
        app
    }

    #[test]
    fn republishing_tracks_revisions() {
        let dir = tempfile::tempdir().unwrap();
        let source = app(dir.path());
        let layout = PackageLayout::new(dir.path().join("packages"));
        let mut publisher = Publisher::open(&layout).unwrap();

        let outcome = publisher.publish(&mut record(&source), true).unwrap();
        assert_eq!(outcome.status(), PackageStatus::New);
        let first = outcome.archive.unwrap();
        assert_eq!(first, layout.archive_path(Category::Release, "Foo", "1.0-1"));
        assert!(first.is_file());

        let outcome = publisher.publish(&mut record(&source), true).unwrap();
        assert_eq!(outcome.status(), PackageStatus::Unchanged);
        assert!(outcome.archive.is_none());

        fs::write(source.join("!Run"), b"RUN").unwrap();
        let mut changed = record(&source);
        let outcome = publisher.publish(&mut changed, true).unwrap();
        assert_eq!(outcome.status(), PackageStatus::Upgraded);
        assert_eq!(changed.version(), "1.0-2");
        assert!(layout.archive_path(Category::Release, "Foo", "1.0-2").is_file());
        assert_eq!(publisher.index().latest("Foo").unwrap().to_string(), "1.0-2");
    }

    #[test]
    fn written_record_is_no_longer_modified() {
        let dir = tempfile::tempdir().unwrap();
        let source = app(dir.path());
        let layout = PackageLayout::new(dir.path().join("packages"));

        let mut dry = record(&source);
        Publisher::open(&layout)
            .unwrap()
            .dry_run(true)
            .publish(&mut dry, true)
            .unwrap();
        assert!(dry.is_modified());

        let mut saved = record(&source);
        Publisher::open(&layout)
            .unwrap()
            .publish(&mut saved, true)
            .unwrap();
        assert!(!saved.is_modified());
    }

    #[test]
    fn dry_run_writes_nothing_but_tracks_index() {
        let dir = tempfile::tempdir().unwrap();
        let source = app(dir.path());
        let layout = PackageLayout::new(dir.path().join("packages"));
        let mut publisher = Publisher::open(&layout).unwrap().dry_run(true);

        let outcome = publisher.publish(&mut record(&source), false).unwrap();
        let path = outcome.archive.unwrap();
        assert!(!path.exists());
        assert_eq!(publisher.index().len(), 1);
    }

    #[test]
    fn publish_source_records_every_kind_of_result() {
        let dir = tempfile::tempdir().unwrap();
        let layout = PackageLayout::new(dir.path().join("packages"));
        let mut publisher = Publisher::open(&layout).unwrap();
        let mut summary = RunSummary::new(false);

        publisher.publish_source("row 3", Ok(None), &mut summary);
        publisher.publish_source(
            "Gone",
            Err(CoreError::Source("Unable to find package directory".to_owned())),
            &mut summary,
        );
        let invalid = PackageSource {
            name: "Bad".to_owned(),
            directory: dir.path().to_path_buf(),
            record: MetadataRecord::new(),
            released: false,
        };
        publisher.publish_source("Bad", Ok(Some(invalid)), &mut summary);

        let c = summary.counts();
        assert_eq!(c.skipped, 1);
        assert_eq!(c.errors, 2);
        assert!(summary.packages[2].message.starts_with("invalid package - Package name must be entered"));
    }

    #[test]
    fn cancelled_run_skips_remaining_packages() {
        let dir = tempfile::tempdir().unwrap();
        let extras = dir.path().join("extras");
        for name in ["A", "B"] {
            fs::create_dir_all(extras.join(name)).unwrap();
        }
        let mut config = PublisherConfig::new(
            dir.path().join("packages"),
            dir.path().join("games"),
            "Jo <jo@example.com>",
        );
        config.extras_dir = Some(extras);

        let mut publisher = Publisher::open(&config.layout()).unwrap();
        let mut summary = RunSummary::new(false);
        publisher
            .run_with_cancel(&config, &mut summary, || true)
            .unwrap();
        assert_eq!(summary.counts().skipped, 2);
        assert!(summary.packages.iter().all(|p| p.message == "shutdown requested"));
    }
}
