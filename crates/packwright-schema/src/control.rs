//! Reading and writing the `RiscPkg/Control` record.
//!
//! The record is a list of `Name: value` lines. A line starting with
//! whitespace continues the previous value, a lone `.` on a continuation line
//! stands for an empty line, and the first blank line ends the record.
//!
//! Two description shapes do not survive a write and re-read unchanged: a
//! line holding only whitespace comes back empty, and a line holding only
//! `.` is indistinguishable from the blank-line marker and also comes back
//! empty.

use crate::record::{ComponentFlag, MetadataRecord};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("line {line}: continuation line not allowed here in RiscPkg/Control")]
    OrphanContinuation { line: usize },
    #[error("line {line}: syntax error in RiscPkg/Control field name")]
    FieldNameSyntax { line: usize },
    #[error("line {line}: ':' expected in RiscPkg/Control")]
    MissingColon { line: usize },
    #[error("unable to process field '{0}' in RiscPkg/Control")]
    UnknownField(String),
    #[error("failed to read control record {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

const KNOWN_FIELDS: [&str; 13] = [
    "Package",
    "Version",
    "Section",
    "Priority",
    "Maintainer",
    "Standards-Version",
    "Description",
    "Licence",
    "Depends",
    "Recommends",
    "Suggests",
    "Conflicts",
    "Components",
];

/// Split control text into `(name, value)` pairs, checking syntax and field
/// names. Nothing is applied to a record here.
fn parse_fields(text: &str) -> Result<Vec<(String, String)>, ControlError> {
    let mut fields: Vec<(String, String)> = Vec::new();

    for (idx, raw) in text.split('\n').enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end();

        if line.is_empty() {
            break;
        }

        let mut chars = line.chars();
        let first = chars.next().unwrap_or_default();
        if first.is_whitespace() {
            let Some((_, value)) = fields.last_mut() else {
                return Err(ControlError::OrphanContinuation { line: line_no });
            };
            let rest = chars.as_str();
            value.push('\n');
            if rest != "." {
                value.push_str(rest);
            }
            continue;
        }

        let Some(colon) = line.find(':') else {
            if line.contains(char::is_whitespace) {
                return Err(ControlError::FieldNameSyntax { line: line_no });
            }
            return Err(ControlError::MissingColon { line: line_no });
        };
        let name = &line[..colon];
        if name.contains(char::is_whitespace) {
            return Err(ControlError::FieldNameSyntax { line: line_no });
        }
        if !KNOWN_FIELDS.contains(&name) {
            return Err(ControlError::UnknownField(name.to_owned()));
        }
        let value = line[colon + 1..].trim_start();
        fields.push((name.to_owned(), value.to_owned()));
    }

    Ok(fields)
}

/// Parse control text into a fresh record.
pub fn parse_control(text: &str) -> Result<MetadataRecord, ControlError> {
    let mut record = MetadataRecord::new();
    record.read_control(text)?;
    Ok(record)
}

impl MetadataRecord {
    /// Apply every field of a control record. On a format error the record is
    /// left untouched.
    pub fn read_control(&mut self, text: &str) -> Result<(), ControlError> {
        let fields = parse_fields(text)?;
        for (name, value) in fields {
            self.set_control_field(&name, value);
        }
        Ok(())
    }

    pub fn read_control_file(&mut self, path: &Path) -> Result<(), ControlError> {
        let text = std::fs::read_to_string(path).map_err(|source| ControlError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.read_control(&text)
    }

    fn set_control_field(&mut self, name: &str, value: String) {
        match name {
            "Package" => self.set_package_name(value),
            "Version" => match value.rsplit_once('-') {
                Some((upstream, revision)) => {
                    self.set_upstream_version(upstream);
                    self.set_package_revision(revision);
                }
                None => {
                    self.set_upstream_version(value);
                    self.set_package_revision("");
                }
            },
            "Section" => self.set_section(value),
            "Priority" => self.set_priority(value),
            "Maintainer" => self.set_maintainer(value),
            "Standards-Version" => self.set_standards_version(value),
            "Description" => match value.split_once('\n') {
                Some((summary, description)) => {
                    self.set_summary(summary);
                    self.set_description(description);
                }
                None => self.set_summary(value),
            },
            "Licence" => self.set_licence(value),
            "Depends" => self.set_depends(value),
            "Recommends" => self.set_recommends(value),
            "Suggests" => self.set_suggests(value),
            "Conflicts" => self.set_conflicts(value),
            "Components" => self.set_declared_components(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_owned)
                    .collect(),
            ),
            // parse_fields has already rejected anything else
            _ => {}
        }
    }

    /// Render the control record. Empty fields are left out.
    pub fn control_text(&self) -> String {
        let mut out = String::new();

        push_field(&mut out, "Package", self.package_name());
        if !self.upstream_version().is_empty() {
            push_field(&mut out, "Version", &self.version());
        }
        push_field(&mut out, "Section", self.section());
        push_field(&mut out, "Priority", self.priority());
        push_field(&mut out, "Maintainer", self.maintainer());
        push_field(&mut out, "Standards-Version", self.standards_version());
        push_field(&mut out, "Licence", self.licence());
        push_description(&mut out, self.summary(), self.description());
        push_field(&mut out, "Depends", self.depends());
        push_field(&mut out, "Recommends", self.recommends());
        push_field(&mut out, "Suggests", self.suggests());
        push_field(&mut out, "Conflicts", self.conflicts());

        let components: Vec<String> = self
            .items()
            .iter()
            .filter(|i| i.flag == ComponentFlag::Movable)
            .map(|i| format!("{} (Movable)", i.component()))
            .collect();
        push_field(&mut out, "Components", &components.join(","));

        out
    }
}

fn push_field(out: &mut String, name: &str, value: &str) {
    if !value.is_empty() {
        let _ = writeln!(out, "{name}: {value}");
    }
}

// Blank lines, including whitespace-only ones, are held back and written as
// ` .` only once another line follows, so trailing blank lines are dropped.
fn push_description(out: &mut String, summary: &str, description: &str) {
    if summary.is_empty() && description.is_empty() {
        return;
    }
    if summary.is_empty() {
        out.push_str("Description:\n");
    } else {
        let _ = writeln!(out, "Description: {summary}");
    }

    let mut pending_blank = 0usize;
    for line in description.split('\n') {
        if line.trim().is_empty() {
            pending_blank += 1;
            continue;
        }
        for _ in 0..pending_blank {
            out.push_str(" .\n");
        }
        pending_blank = 0;
        let _ = writeln!(out, " {line}");
    }
}
