//! CLI subprocess integration tests.
//!
//! These tests invoke the `packwright` binary as a subprocess and verify
//! exit codes, stdout content, and JSON output.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn packwright_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_packwright"));
    cmd.env_remove("PACKWRIGHT_LOG");
    cmd
}

fn write(path: &Path, text: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

const VALID_CONTROL: &str = "Package: Foo\n\
Version: 1.0-1\n\
Section: Games\n\
Maintainer: Jo Bloggs <jo@example.com>\n\
Licence: Free\n\
Description: Foo, a game\n";

// A packages tree with one extras package and a config file pointing at it.
fn write_project(root: &Path) -> PathBuf {
    let extras = root.join("extras");
    write(&extras.join("Tool").join("Control"), "Description: A handy tool\n");
    write(&extras.join("Tool").join("Copyright"), "Copyright Tool Author");
    write(&extras.join("Tool").join("!Tool").join("!Run"), "run tool");
    std::fs::create_dir_all(root.join("games")).unwrap();

    let config = root.join("packwright.toml");
    write(
        &config,
        "packages_dir = \"packages\"\n\
         sources_dir = \"games\"\n\
         extras_dir = \"extras\"\n\
         logs_dir = \"logs\"\n\
         maintainer = \"Jo Bloggs <jo@example.com>\"\n",
    );
    config
}

fn run_with_config(config: &Path, args: &[&str]) -> Output {
    packwright_bin()
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .unwrap()
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout must be JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
fn cli_version_exits_zero() {
    let output = packwright_bin().arg("--version").output().unwrap();
    assert!(output.status.success(), "packwright --version must exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("packwright"), "version output: {stdout}");
}

#[test]
fn cli_help_lists_commands() {
    let output = packwright_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["check", "show", "diff", "publish", "index", "completions"] {
        assert!(stdout.contains(command), "help must list '{command}'");
    }
}

#[test]
fn cli_check_valid_control_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let control = dir.path().join("Control");
    write(&control, VALID_CONTROL);

    let output = packwright_bin().arg("check").arg(&control).output().unwrap();
    assert!(
        output.status.success(),
        "check must exit 0. stdout: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("no problems found"));
}

#[test]
fn cli_check_reports_missing_maintainer() {
    let dir = tempfile::tempdir().unwrap();
    let control = dir.path().join("Control");
    write(&control, &VALID_CONTROL.replace("Maintainer: Jo Bloggs <jo@example.com>\n", ""));

    let output = packwright_bin()
        .args(["--json", "check"])
        .arg(&control)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let json = stdout_json(&output);
    assert_eq!(json["package"], "Foo");
    assert_eq!(json["valid"], false);
    let errors = json["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["field"], "Maintainer");
    assert_eq!(errors[0]["message"], "must be entered");
}

#[test]
fn cli_check_malformed_control_is_control_error() {
    let dir = tempfile::tempdir().unwrap();
    let control = dir.path().join("Control");
    write(&control, "Package Foo\n");

    let output = packwright_bin().arg("check").arg(&control).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("control record error"), "stderr: {stderr}");
}

#[test]
fn cli_check_source_directory_uses_config_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path());
    let tool = dir.path().join("extras").join("Tool");

    let output = run_with_config(&config, &["--json", "check", &tool.to_string_lossy()]);
    assert!(
        output.status.success(),
        "stdout: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    let json = stdout_json(&output);
    assert_eq!(json["package"], "Tool");
    assert_eq!(json["version"], "0-1");
}

#[test]
fn cli_show_prints_normalized_record() {
    let dir = tempfile::tempdir().unwrap();
    let control = dir.path().join("Control");
    write(
        &control,
        &format!("{VALID_CONTROL}Components: Apps.Games.!Foo (Movable)\n"),
    );

    let output = packwright_bin().arg("show").arg(&control).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Package: Foo\nVersion: 1.0-1\n"), "stdout: {stdout}");
    assert!(stdout.contains("Description: Foo, a game\n"));
    assert!(stdout.contains("Components: Apps.Games.!Foo (Movable)\n"));
}

#[test]
fn cli_show_json_lists_normalized_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    let control = dir.path().join("Control");
    write(&control, &format!("{VALID_CONTROL}Depends: PkgA(>=1.2), PkgB\n"));

    let output = packwright_bin()
        .args(["--json", "show"])
        .arg(&control)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["depends"][0], "PkgA (>= 1.2)");
    assert_eq!(json["depends"][1], "PkgB");
    assert_eq!(json["conflicts"].as_array().unwrap().len(), 0);
}

#[test]
fn cli_publish_then_index_and_diff() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path());

    let output = run_with_config(&config, &["--json", "publish"]);
    assert!(
        output.status.success(),
        "publish must exit 0. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json = stdout_json(&output);
    assert_eq!(json["counts"]["new"], 1);
    assert_eq!(json["packages"][0]["name"], "Tool");
    assert_eq!(json["packages"][0]["status"], "new");

    let archive = dir.path().join("packages").join("beta").join("Tool_0-1");
    assert!(archive.is_file());
    assert!(dir.path().join("logs").is_dir());

    let output = run_with_config(&config, &["--json", "index"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json[0]["package"], "Tool");
    assert_eq!(json[0]["version"], "0-1");
    assert_eq!(json[0]["category"], "beta");

    let tool = dir.path().join("extras").join("Tool");
    let output = run_with_config(
        &config,
        &["--json", "diff", &tool.to_string_lossy(), &archive.to_string_lossy()],
    );
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["unchanged"], true);

    write(&tool.join("!Tool").join("!Run"), "RUN TOOL");
    let output = run_with_config(
        &config,
        &["diff", &tool.to_string_lossy(), &archive.to_string_lossy()],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("!Run contents changed"), "stdout: {stdout}");

    let output = run_with_config(&config, &["--json", "publish"]);
    let json = stdout_json(&output);
    assert_eq!(json["counts"]["upgraded"], 1);
    assert!(dir.path().join("packages").join("beta").join("Tool_0-2").is_file());
}

#[test]
fn cli_publish_dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path());

    let output = run_with_config(&config, &["publish", "--dry-run"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("dry run: no archives written"));
    assert!(stdout.contains("Summary of packaging on"));
    assert!(!dir.path().join("packages").join("beta").exists());
}

#[test]
fn cli_publish_missing_config_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_with_config(&dir.path().join("packwright.toml"), &["publish"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid configuration"), "stderr: {stderr}");
}

#[test]
fn cli_index_empty_packages_root() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path());

    let output = run_with_config(&config, &["index"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("no published packages found"));
}

#[test]
fn cli_diff_missing_archive_is_store_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_project(dir.path());
    let tool = dir.path().join("extras").join("Tool");
    let missing = dir.path().join("packages").join("beta").join("Tool_0-1");

    let output = run_with_config(
        &config,
        &["diff", &tool.to_string_lossy(), &missing.to_string_lossy()],
    );
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn cli_completions_bash() {
    let output = packwright_bin().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("packwright"));
}
