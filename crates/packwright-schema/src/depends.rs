//! Dependency relation grammar: `name [ ( op version ) ] { , ... }`.
//!
//! Only syntax is checked here. Whether a relation can be satisfied is left
//! to the package manager that installs the archive.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    #[error("empty dependency, have you got too many commas")]
    EmptyClause,
    #[error("Extra ')' in a dependency")]
    ExtraCloseParen,
    #[error("dependency package name must end with a comma or a '('")]
    NameNotTerminated,
    #[error("version operator '=', '<<', '>>', '<=' or '>=' missing")]
    MissingOperator,
    #[error("'<' must be followed by another '<' or an '='")]
    BadLess,
    #[error("'>' must be followed by another '>' or an '='")]
    BadGreater,
    #[error("version number missing")]
    MissingVersion,
    #[error("extra symbol in version operator")]
    ExtraOperatorSymbol,
    #[error("missing ')' or a space in the version number")]
    MissingCloseParen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Relation {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">>")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::Eq => "=",
            Relation::Lt => "<<",
            Relation::Le => "<=",
            Relation::Gt => ">>",
            Relation::Ge => ">=",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub name: String,
    pub constraint: Option<(Relation, String)>,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some((rel, version)) => write!(f, "{} ({rel} {version})", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Check every comma-separated clause of a dependency field and report the
/// first problem. An empty field is valid.
pub fn check_dependencies(value: &str) -> Result<(), DependencyError> {
    parse_dependencies(value).map(drop)
}

pub fn parse_dependencies(value: &str) -> Result<Vec<Dependency>, DependencyError> {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    value.split(',').map(parse_clause).collect()
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) {
        if self.pos < self.text.len() {
            self.pos += 1;
        }
    }

    fn skip_spaces(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    // `stop` only ever matches ASCII bytes, so both ends are char boundaries.
    fn take_until(&mut self, stop: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(|b| !stop(b)) {
            self.pos += 1;
        }
        &self.text[start..self.pos]
    }
}

fn parse_clause(clause: &str) -> Result<Dependency, DependencyError> {
    let mut cur = Cursor {
        text: clause,
        pos: 0,
    };

    cur.skip_spaces();
    match cur.peek() {
        None => return Err(DependencyError::EmptyClause),
        Some(b')') => return Err(DependencyError::ExtraCloseParen),
        Some(_) => {}
    }

    let name = cur.take_until(|b| b == b'(' || b.is_ascii_whitespace()).to_owned();
    cur.skip_spaces();
    match cur.peek() {
        None => return Ok(Dependency { name, constraint: None }),
        Some(b'(') => cur.bump(),
        Some(_) => return Err(DependencyError::NameNotTerminated),
    }

    cur.skip_spaces();
    let relation = match cur.peek() {
        Some(b'=') => Relation::Eq,
        Some(b'<') => {
            cur.bump();
            match cur.peek() {
                Some(b'<') => Relation::Lt,
                Some(b'=') => Relation::Le,
                _ => return Err(DependencyError::BadLess),
            }
        }
        Some(b'>') => {
            cur.bump();
            match cur.peek() {
                Some(b'>') => Relation::Gt,
                Some(b'=') => Relation::Ge,
                _ => return Err(DependencyError::BadGreater),
            }
        }
        _ => return Err(DependencyError::MissingOperator),
    };
    cur.bump();

    cur.skip_spaces();
    match cur.peek() {
        None | Some(b')' | b',') => return Err(DependencyError::MissingVersion),
        Some(b'<' | b'>' | b'=') => return Err(DependencyError::ExtraOperatorSymbol),
        Some(_) => {}
    }

    let version = cur.take_until(|b| b == b')' || b.is_ascii_whitespace()).to_owned();
    cur.skip_spaces();
    if cur.peek() != Some(b')') {
        return Err(DependencyError::MissingCloseParen);
    }

    Ok(Dependency {
        name,
        constraint: Some((relation, version)),
    })
}
