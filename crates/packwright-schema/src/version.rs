//! Package version parsing and ordering.
//!
//! Ordering goes through [`VersionScheme`] so publishing logic can be run
//! against a deterministic comparator in tests. [`DebianVersionScheme`] is the
//! ordering package managers for this format apply.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("empty version")]
    Empty,
    #[error("version '{0}' has no upstream part")]
    EmptyUpstream(String),
    #[error("version '{0}' has a non-numeric epoch")]
    BadEpoch(String),
    #[error("version '{version}' contains invalid character '{ch}'")]
    InvalidCharacter { version: String, ch: char },
    #[error("package revision '{0}' is not a number")]
    NonNumericRevision(String),
    #[error("package revision '{0}' cannot be incremented")]
    RevisionOverflow(String),
}

/// A version split into `[epoch:]upstream[-revision]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ParsedVersion {
    pub epoch: u32,
    pub upstream: String,
    pub revision: String,
}

impl ParsedVersion {
    pub fn new(upstream: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            epoch: 0,
            upstream: upstream.into(),
            revision: revision.into(),
        }
    }

    /// The upstream part with its epoch prefix, as stored in a control
    /// record's version field.
    pub fn upstream_with_epoch(&self) -> String {
        if self.epoch == 0 {
            self.upstream.clone()
        } else {
            format!("{}:{}", self.epoch, self.upstream)
        }
    }
}

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}:", self.epoch)?;
        }
        f.write_str(&self.upstream)?;
        if !self.revision.is_empty() {
            write!(f, "-{}", self.revision)?;
        }
        Ok(())
    }
}

pub trait VersionScheme {
    fn parse(&self, text: &str) -> Result<ParsedVersion, VersionError>;

    fn compare(&self, a: &ParsedVersion, b: &ParsedVersion) -> Ordering;

    fn compare_str(&self, a: &str, b: &str) -> Result<Ordering, VersionError> {
        Ok(self.compare(&self.parse(a)?, &self.parse(b)?))
    }
}

/// dpkg-compatible parsing and ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebianVersionScheme;

impl VersionScheme for DebianVersionScheme {
    fn parse(&self, text: &str) -> Result<ParsedVersion, VersionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(VersionError::Empty);
        }

        let (epoch, rest) = match text.split_once(':') {
            Some((e, rest)) => {
                let epoch = e
                    .parse::<u32>()
                    .map_err(|_| VersionError::BadEpoch(text.to_owned()))?;
                (epoch, rest)
            }
            None => (0, text),
        };

        let (upstream, revision) = match rest.rsplit_once('-') {
            Some((u, r)) => (u, r),
            None => (rest, ""),
        };
        if upstream.is_empty() {
            return Err(VersionError::EmptyUpstream(text.to_owned()));
        }

        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '~' | '-' | ':');
        if let Some(ch) = upstream.chars().find(|&c| !allowed(c)) {
            return Err(VersionError::InvalidCharacter {
                version: text.to_owned(),
                ch,
            });
        }
        if let Some(ch) = revision
            .chars()
            .find(|&c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '~')))
        {
            return Err(VersionError::InvalidCharacter {
                version: text.to_owned(),
                ch,
            });
        }

        Ok(ParsedVersion {
            epoch,
            upstream: upstream.to_owned(),
            revision: revision.to_owned(),
        })
    }

    fn compare(&self, a: &ParsedVersion, b: &ParsedVersion) -> Ordering {
        a.epoch
            .cmp(&b.epoch)
            .then_with(|| compare_fragment(&a.upstream, &b.upstream))
            .then_with(|| compare_fragment(&a.revision, &b.revision))
    }
}

// Weight of a non-digit byte; end of string and digits weigh 0, `~` sorts
// below everything, letters below other punctuation.
fn weight(c: Option<u8>) -> i32 {
    match c {
        None => 0,
        Some(b'~') => -1,
        Some(c) if c.is_ascii_digit() => 0,
        Some(c) if c.is_ascii_alphabetic() => i32::from(c),
        Some(c) => i32::from(c) + 256,
    }
}

fn compare_fragment(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let (mut i, mut j) = (0, 0);

    while i < a.len() || j < b.len() {
        while (i < a.len() && !a[i].is_ascii_digit()) || (j < b.len() && !b[j].is_ascii_digit()) {
            let (wa, wb) = (weight(a.get(i).copied()), weight(b.get(j).copied()));
            if wa != wb {
                return wa.cmp(&wb);
            }
            i += 1;
            j += 1;
        }

        while a.get(i) == Some(&b'0') {
            i += 1;
        }
        while b.get(j) == Some(&b'0') {
            j += 1;
        }

        let mut first_diff = Ordering::Equal;
        while i < a.len() && j < b.len() && a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            if first_diff == Ordering::Equal {
                first_diff = a[i].cmp(&b[j]);
            }
            i += 1;
            j += 1;
        }
        if a.get(i).is_some_and(u8::is_ascii_digit) {
            return Ordering::Greater;
        }
        if b.get(j).is_some_and(u8::is_ascii_digit) {
            return Ordering::Less;
        }
        if first_diff != Ordering::Equal {
            return first_diff;
        }
    }
    Ordering::Equal
}

/// The package revision one above `revision`.
pub fn next_revision(revision: &str) -> Result<String, VersionError> {
    let n: u64 = revision
        .parse()
        .map_err(|_| VersionError::NonNumericRevision(revision.to_owned()))?;
    n.checked_add(1)
        .map(|n| n.to_string())
        .ok_or_else(|| VersionError::RevisionOverflow(revision.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(a: &str, b: &str) -> Ordering {
        DebianVersionScheme.compare_str(a, b).unwrap()
    }

    #[test]
    fn parse_splits_on_last_dash() {
        let v = DebianVersionScheme.parse("1.0-beta-3").unwrap();
        assert_eq!(v.upstream, "1.0-beta");
        assert_eq!(v.revision, "3");
        assert_eq!(v.epoch, 0);
        assert_eq!(v.to_string(), "1.0-beta-3");
    }

    #[test]
    fn parse_epoch_and_bare_upstream() {
        let v = DebianVersionScheme.parse("2:4.1").unwrap();
        assert_eq!(v.epoch, 2);
        assert_eq!(v.upstream, "4.1");
        assert_eq!(v.revision, "");
        assert_eq!(v.to_string(), "2:4.1");
        assert_eq!(v.upstream_with_epoch(), "2:4.1");
        assert_eq!(ParsedVersion::new("1.0", "2").upstream_with_epoch(), "1.0");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert_eq!(DebianVersionScheme.parse(""), Err(VersionError::Empty));
        assert!(matches!(
            DebianVersionScheme.parse("x:1.0"),
            Err(VersionError::BadEpoch(_))
        ));
        assert!(matches!(
            DebianVersionScheme.parse("-2"),
            Err(VersionError::EmptyUpstream(_))
        ));
        assert!(matches!(
            DebianVersionScheme.parse("1.0 beta-1"),
            Err(VersionError::InvalidCharacter { ch: ' ', .. })
        ));
    }

    #[test]
    fn numeric_segments_compare_by_value() {
        assert_eq!(cmp("1.10-1", "1.9-1"), Ordering::Greater);
        assert_eq!(cmp("1.01-1", "1.1-1"), Ordering::Equal);
        assert_eq!(cmp("2.0-1", "10.0-1"), Ordering::Less);
    }

    #[test]
    fn revision_breaks_ties() {
        assert_eq!(cmp("1.0-2", "1.0-1"), Ordering::Greater);
        assert_eq!(cmp("1.0-1", "1.0-2"), Ordering::Less);
        assert_eq!(cmp("1.0-10", "1.0-9"), Ordering::Greater);
    }

    #[test]
    fn tilde_sorts_before_everything() {
        assert_eq!(cmp("1.0~rc1-1", "1.0-1"), Ordering::Less);
        assert_eq!(cmp("1.0~~-1", "1.0~-1"), Ordering::Less);
    }

    #[test]
    fn letters_sort_before_punctuation() {
        assert_eq!(cmp("1.0a-1", "1.0+-1"), Ordering::Less);
        assert_eq!(cmp("1.0a-1", "1.0-1"), Ordering::Greater);
    }

    #[test]
    fn epoch_dominates() {
        assert_eq!(cmp("1:0.1-1", "9.9-9"), Ordering::Greater);
    }

    #[test]
    fn next_revision_increments_by_one() {
        assert_eq!(next_revision("2").unwrap(), "3");
        assert_eq!(next_revision("9").unwrap(), "10");
        assert_eq!(
            next_revision("2a"),
            Err(VersionError::NonNumericRevision("2a".to_owned()))
        );
    }

    #[test]
    fn next_revision_refuses_to_wrap() {
        let max = u64::MAX.to_string();
        assert_eq!(
            next_revision(&max),
            Err(VersionError::RevisionOverflow(max.clone()))
        );
        assert_eq!(next_revision(&(u64::MAX - 1).to_string()).unwrap(), max);
    }
}
