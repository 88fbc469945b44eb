use std::cmp::Ordering;
use thiserror::Error;

/// Lowest `Standards-Version` a package may declare.
pub const STANDARDS_BASELINE: &str = "0.4.0";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StandardsVersionError {
    #[error("must be entered")]
    Empty,
    #[error("maximum of 4 components separated by dots ('.')")]
    TooManyComponents,
    #[error("must contain at least 3 components separated by dots ('.')")]
    TooFewComponents,
    #[error("must be up to 4 numbers separated by dots ('.')")]
    Malformed,
    #[error("must be at least 0.4.0")]
    BelowBaseline,
}

pub fn validate_standards_version(value: &str) -> Result<(), StandardsVersionError> {
    if value.is_empty() {
        return Err(StandardsVersionError::Empty);
    }

    let parts: Vec<&str> = value.split('.').collect();
    if parts.len() > 4 {
        return Err(StandardsVersionError::TooManyComponents);
    }
    if parts.len() < 3 {
        return Err(StandardsVersionError::TooFewComponents);
    }
    if parts
        .iter()
        .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(StandardsVersionError::Malformed);
    }
    if compare_dotted(value, STANDARDS_BASELINE) == Ordering::Less {
        return Err(StandardsVersionError::BelowBaseline);
    }
    Ok(())
}

/// Compare two dot-separated numeric versions segment by segment.
///
/// A segment that is missing on one side orders below any present segment,
/// so `0.4.0 < 0.4.0.0`. Non-numeric segments order below every numeric one.
pub fn compare_dotted(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = segment_value(l).cmp(&segment_value(r));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn segment_value(segment: &str) -> Option<u64> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
