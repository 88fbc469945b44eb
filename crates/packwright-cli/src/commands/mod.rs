pub mod check;
pub mod completions;
pub mod diff;
pub mod index;
pub mod publish;
pub mod show;

use indicatif::{ProgressBar, ProgressStyle};
use packwright_core::{PackageStatus, PublisherConfig, SourceDefaults};
use std::path::Path;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONTROL_ERROR: u8 = 2;
pub const EXIT_STORE_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn load_config(path: &Path) -> Result<PublisherConfig, String> {
    PublisherConfig::load(path).map_err(|e| e.to_string())
}

/// Defaults for building a package source outside a batch run: those of
/// the configuration when it exists, otherwise the built-in ones.
pub fn source_defaults(config_path: &Path) -> Result<SourceDefaults, String> {
    if config_path.is_file() {
        return load_config(config_path)?
            .source_defaults()
            .map_err(|e| e.to_string());
    }
    let config = PublisherConfig::new("", "", "");
    Ok(SourceDefaults {
        maintainer: String::new(),
        base_install: config.base_install,
        section: config.default_section,
        licence: config.default_licence,
        standard_copyright: None,
    })
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_status(status: PackageStatus) -> String {
    use console::Style;
    match status {
        PackageStatus::New => Style::new().green().apply_to("new").to_string(),
        PackageStatus::Upgraded => Style::new().cyan().bold().apply_to("upgraded").to_string(),
        PackageStatus::Unchanged => Style::new().dim().apply_to("unchanged").to_string(),
        PackageStatus::Error => Style::new().red().bold().apply_to("error").to_string(),
        PackageStatus::Skipped => Style::new().yellow().apply_to("skipped").to_string(),
    }
}
