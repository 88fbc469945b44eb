//! Destination paths for packaged items, e.g. `Apps.Games`.

use thiserror::Error;

/// Top-level directories an item may be installed under.
pub const INSTALL_CATEGORIES: [&str; 6] = ["Apps", "Manuals", "Resources", "Boot", "!Boot", "System"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstallPathError {
    #[error("must be entered")]
    Empty,
    #[error("must not end with a full stop")]
    TrailingDot,
    #[error("must start with one of Apps, Manuals, Resources, Boot, !Boot, System")]
    UnknownCategory,
    #[error("should not have two dots ('.') together")]
    DoubleDot,
}

pub fn validate_install_path(path: &str) -> Result<(), InstallPathError> {
    if path.is_empty() {
        return Err(InstallPathError::Empty);
    }
    if path.ends_with('.') {
        return Err(InstallPathError::TrailingDot);
    }
    let root = path.split('.').next().unwrap_or(path);
    if !INSTALL_CATEGORIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(root))
    {
        return Err(InstallPathError::UnknownCategory);
    }
    if path.contains("..") {
        return Err(InstallPathError::DoubleDot);
    }
    Ok(())
}

/// Host directory form of an install path: `Apps.Games` becomes `Apps/Games`.
pub fn install_path_to_dir(path: &str) -> String {
    path.replace('.', "/")
}
