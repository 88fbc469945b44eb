//! Comma-delimited catalogue of packages to build.
//!
//! A catalogue starts with a fixed number of free-form header lines, then a
//! row of column labels, then one row per package. Cells may be quoted with
//! `"` to include commas or line breaks.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::Chars;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("unable to load catalogue file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to read header row")]
    MissingHeader,
    #[error("No data found in catalogue")]
    Empty,
}

/// One catalogue row keyed by column label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogueRow {
    cells: BTreeMap<String, String>,
}

impl CatalogueRow {
    /// Value of the `label` column; empty when the row has no such cell.
    pub fn get(&self, label: &str) -> &str {
        self.cells.get(label).map_or("", String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    labels: Vec<String>,
    rows: Vec<CatalogueRow>,
}

impl Catalogue {
    pub fn load(path: &Path, header_lines: usize) -> Result<Self, CatalogueError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, header_lines)
    }

    pub fn parse(text: &str, header_lines: usize) -> Result<Self, CatalogueError> {
        let mut reader = RowReader {
            chars: text.chars(),
        };
        for _ in 0..header_lines {
            reader.skip_line();
        }

        let labels: Vec<String> = reader
            .next_row()
            .ok_or(CatalogueError::MissingHeader)?
            .iter()
            .map(|l| tidy_label(l))
            .collect();

        let mut rows = Vec::new();
        while let Some(cells) = reader.next_row() {
            if cells.first().is_none_or(String::is_empty) {
                continue;
            }
            let cells = labels.iter().cloned().zip(cells).collect();
            rows.push(CatalogueRow { cells });
        }

        if rows.is_empty() {
            return Err(CatalogueError::Empty);
        }
        Ok(Self { labels, rows })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CatalogueRow> {
        self.rows.iter()
    }
}

impl<'a> IntoIterator for &'a Catalogue {
    type Item = &'a CatalogueRow;
    type IntoIter = std::slice::Iter<'a, CatalogueRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

// Labels are often typed with line breaks and markers for spreadsheet
// display; strip those so rows can be looked up by plain names.
fn tidy_label(label: &str) -> String {
    let mut tidy: String = label
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n' | '>'))
        .collect();
    tidy.truncate(tidy.trim_end_matches(' ').len());
    while tidy.contains("  ") {
        tidy = tidy.replace("  ", " ");
    }
    tidy
}

struct RowReader<'a> {
    chars: Chars<'a>,
}

impl RowReader<'_> {
    fn skip_line(&mut self) {
        for c in self.chars.by_ref() {
            if c == '\n' {
                break;
            }
        }
    }

    /// Next row of cells, or `None` once the text is exhausted.
    fn next_row(&mut self) -> Option<Vec<String>> {
        let mut cells = Vec::new();
        let mut cell = String::new();
        let mut in_quotes = false;
        let mut consumed = false;

        for c in self.chars.by_ref() {
            consumed = true;
            if in_quotes {
                if c == '"' {
                    in_quotes = false;
                } else {
                    cell.push(c);
                }
                continue;
            }
            match c {
                ',' => cells.push(std::mem::take(&mut cell)),
                '\r' => {}
                '\n' => {
                    cells.push(cell);
                    return Some(cells);
                }
                '"' => in_quotes = true,
                _ => cell.push(c),
            }
        }

        if !consumed {
            return None;
        }
        cells.push(cell);
        Some(cells)
    }
}
