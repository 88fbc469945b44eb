//! End-of-run reporting.

use crate::CoreError;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    New,
    Upgraded,
    Unchanged,
    Error,
    /// Not packaged at all, e.g. a catalogue row without a package name.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageReport {
    pub name: String,
    pub status: PackageStatus,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCounts {
    pub new: usize,
    pub upgraded: usize,
    pub errors: usize,
    pub unchanged: usize,
    pub skipped: usize,
    /// Every package except the skipped ones.
    pub total: usize,
}

/// Per-package outcomes of one publishing run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Local>,
    pub dry_run: bool,
    pub packages: Vec<PackageReport>,
}

impl RunSummary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            started_at: Local::now(),
            dry_run,
            packages: Vec::new(),
        }
    }

    pub fn record(&mut self, name: &str, status: PackageStatus, message: impl Into<String>) {
        self.packages.push(PackageReport {
            name: name.to_owned(),
            status,
            message: message.into(),
        });
    }

    pub fn count(&self, status: PackageStatus) -> usize {
        self.packages.iter().filter(|p| p.status == status).count()
    }

    pub fn counts(&self) -> SummaryCounts {
        let new = self.count(PackageStatus::New);
        let upgraded = self.count(PackageStatus::Upgraded);
        let errors = self.count(PackageStatus::Error);
        let unchanged = self.count(PackageStatus::Unchanged);
        SummaryCounts {
            new,
            upgraded,
            errors,
            unchanged,
            skipped: self.count(PackageStatus::Skipped),
            total: new + upgraded + errors + unchanged,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.packages.iter().any(|p| p.status == PackageStatus::Error)
    }

    fn names(&self, status: PackageStatus) -> impl Iterator<Item = &PackageReport> + '_ {
        self.packages.iter().filter(move |p| p.status == status)
    }

    /// The summary as plain text: counts first, then the names in each
    /// non-empty group.
    pub fn render(&self) -> String {
        let c = self.counts();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Summary of packaging on {}\n",
            self.started_at.format("%c")
        );
        let _ = writeln!(out, "New packages         {}", c.new);
        let _ = writeln!(out, "Upgraded packages    {}", c.upgraded);
        let _ = writeln!(out, "Packages with errors {}", c.errors);
        let _ = writeln!(out, "Unchanged packages   {}", c.unchanged);
        if c.skipped > 0 {
            let _ = writeln!(out, "Skipped packages     {}", c.skipped);
        }
        let _ = writeln!(out, "\nTotal                {}", c.total);

        for (title, status) in [
            ("New packages", PackageStatus::New),
            ("Upgrade packages", PackageStatus::Upgraded),
            ("Error packages", PackageStatus::Error),
        ] {
            let mut group = self.names(status).peekable();
            if group.peek().is_none() {
                continue;
            }
            let _ = writeln!(out, "\n{title}\n{}", "-".repeat(title.len()));
            for report in group {
                if status == PackageStatus::Error {
                    let _ = writeln!(out, "{} - {}", report.name, report.message);
                } else {
                    let _ = writeln!(out, "{}", report.name);
                }
            }
        }
        out
    }

    /// File name the summary is saved under, e.g. `20240131093000summary`.
    pub fn file_name(&self) -> String {
        format!("{}summary", self.started_at.format("%Y%m%d%H%M%S"))
    }

    /// Write the rendered summary into `dir`, returning the file's path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, CoreError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(self.render().as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| CoreError::Io(e.error))?;
        info!("summary written to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunSummary {
        let mut summary = RunSummary::new(false);
        summary.record("Foo", PackageStatus::New, "new release package");
        summary.record("Bar", PackageStatus::Upgraded, "upgrade (beta to release)");
        summary.record("Baz", PackageStatus::Unchanged, "is up to date");
        summary.record("Qux", PackageStatus::Error, "Invalid package - Summary must be entered");
        summary.record("row 7", PackageStatus::Skipped, "no package name");
        summary
    }

    #[test]
    fn counts_exclude_skipped_from_total() {
        let c = sample().counts();
        assert_eq!(
            c,
            SummaryCounts {
                new: 1,
                upgraded: 1,
                errors: 1,
                unchanged: 1,
                skipped: 1,
                total: 4,
            }
        );
        assert!(sample().has_errors());
        assert!(!RunSummary::new(true).has_errors());
    }

    #[test]
    fn render_lists_groups() {
        let text = sample().render();
        assert!(text.starts_with("Summary of packaging on "));
        assert!(text.contains("New packages         1\n"));
        assert!(text.contains("Packages with errors 1\n"));
        assert!(text.contains("Skipped packages     1\n"));
        assert!(text.contains("\nTotal                4\n"));
        assert!(text.contains("\nNew packages\n------------\nFoo\n"));
        assert!(text.contains("\nUpgrade packages\n----------------\nBar\n"));
        assert!(text.contains("\nError packages\n--------------\nQux - Invalid package"));
        assert!(!text.contains("Baz"));
    }

    #[test]
    fn empty_groups_are_omitted() {
        let text = RunSummary::new(false).render();
        assert!(!text.contains("----"));
        assert!(!text.contains("Skipped"));
    }

    #[test]
    fn write_to_uses_timestamped_name() {
        let dir = tempfile::tempdir().unwrap();
        let summary = sample();
        let path = summary.write_to(&dir.path().join("logs")).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("summary"));
        assert_eq!(name.len(), "YYYYmmddHHMMSS".len() + "summary".len());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), summary.render());
    }

    #[test]
    fn summary_serializes_to_json() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["packages"][0]["status"], "new");
        assert_eq!(json["packages"][4]["status"], "skipped");
        assert_eq!(json["dry_run"], false);
    }
}
