// tests/integration_test.rs
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const SENTINEL_XCCONFIG: &str = "MARKETING_VERSION = 0.0.0\nCURRENT_PROJECT_VERSION = 0\n";

fn app_release(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_app-release"))
        .current_dir(dir)
        .env_remove("CRASH_REPORTER_TOKEN")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute app-release")
}

/// Workspace whose collaborators are plain shell commands. The build
/// command records the descriptor it sees in `build/seen.txt`.
fn workspace(build_command: &str, remote: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("Config")).unwrap();
    fs::write(dir.path().join("Config/Version.xcconfig"), SENTINEL_XCCONFIG).unwrap();

    let config = format!(
        r#"
[signing]
command = ["true"]

[build]
command = ["sh", "-c", "{build_command}"]
package = "build/{{scheme}}.ipa"
symbols = "build/{{scheme}}.app.dSYM.zip"

[distribution]
query_command = ["echo", "{remote}"]
upload_command = ["sh", "-c", "echo {{artifact}} > build/uploaded.txt"]

[crash_reporting]
access_token = ""
command = ["sh", "-c", "touch build/symbols-uploaded"]

[configurations.test]
bundle_id = "com.example.library.test"
scheme = "Library"
"#
    );
    let config_path = dir.path().join("release.toml");
    fs::write(&config_path, config).unwrap();
    (dir, config_path)
}

const BUILD_OK: &str =
    "mkdir -p build && cp Config/Version.xcconfig build/seen.txt && touch build/{scheme}.ipa";

#[test]
fn test_app_release_help() {
    let dir = TempDir::new().unwrap();
    let output = app_release(dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("app-release"));
    assert!(stdout.contains("Bump, build and upload iOS app releases"));
    assert!(stdout.contains("release"));
    assert!(stdout.contains("reset"));
}

#[test]
fn test_list_empty_config() {
    let dir = TempDir::new().unwrap();
    let output = app_release(dir.path(), &["--config", "/dev/null", "list"]);

    // an empty file has no configurations
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No build configurations"));
}

#[test]
fn test_list_from_config() {
    let (dir, config) = workspace(BUILD_OK, "1.2.0 5");
    let output = app_release(dir.path(), &["--config", config.to_str().unwrap(), "list"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("com.example.library.test"));
    assert!(stdout.contains("major, minor, patch, build"));
}

#[test]
fn test_release_writes_descriptor_for_build_then_restores() {
    let (dir, config) = workspace(BUILD_OK, "1.2.0 5");
    let output = app_release(
        dir.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "release",
            "test",
            "--bump",
            "minor",
            "--force",
        ],
    );

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let seen = fs::read_to_string(dir.path().join("build/seen.txt")).unwrap();
    assert!(seen.contains("MARKETING_VERSION = 1.3.0"));
    assert!(seen.contains("CURRENT_PROJECT_VERSION = 1"));

    let uploaded = fs::read_to_string(dir.path().join("build/uploaded.txt")).unwrap();
    assert_eq!(uploaded.trim(), "build/Library.ipa");

    // empty token: symbols skipped
    assert!(!dir.path().join("build/symbols-uploaded").exists());

    assert_eq!(
        fs::read_to_string(dir.path().join("Config/Version.xcconfig")).unwrap(),
        SENTINEL_XCCONFIG
    );
}

#[test]
fn test_release_uploads_symbols_with_env_token() {
    let build = format!("{} && touch build/{{scheme}}.app.dSYM.zip", BUILD_OK);
    let (dir, config) = workspace(&build, "1.2.0 5");
    let output = Command::new(env!("CARGO_BIN_EXE_app-release"))
        .current_dir(dir.path())
        .env("CRASH_REPORTER_TOKEN", "env-token")
        .args([
            "--config",
            config.to_str().unwrap(),
            "release",
            "test",
            "--bump",
            "build",
            "--force",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(dir.path().join("build/symbols-uploaded").exists());
}

#[test]
fn test_failed_build_restores_descriptor_and_exits_non_zero() {
    let (dir, config) = workspace("mkdir -p build && exit 65", "1.2.0 5");
    let output = app_release(
        dir.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "release",
            "test",
            "--bump",
            "build",
            "--force",
        ],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("builder failed"), "stderr: {}", stderr);
    assert!(!dir.path().join("build/uploaded.txt").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("Config/Version.xcconfig")).unwrap(),
        SENTINEL_XCCONFIG
    );
}

#[test]
fn test_first_release_rejects_non_major() {
    let (dir, config) = workspace(BUILD_OK, "");
    let output = app_release(
        dir.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "release",
            "test",
            "--bump",
            "patch",
            "--force",
        ],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("must be a major bump"));
    assert!(!dir.path().join("build").exists());
}

#[test]
fn test_invalid_bump_argument() {
    let (dir, config) = workspace(BUILD_OK, "1.2.0 5");
    let output = app_release(
        dir.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "release",
            "test",
            "--bump",
            "hotfix",
        ],
    );

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_force_without_bump_does_not_prompt() {
    let (dir, config) = workspace(BUILD_OK, "1.2.0 5");
    let output = app_release(
        dir.path(),
        &["--config", config.to_str().unwrap(), "release", "test", "--force"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No bump type given"), "stderr: {}", stderr);
    assert!(stderr.contains("major, minor, patch, build"));
    assert!(!dir.path().join("build").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("Config/Version.xcconfig")).unwrap(),
        SENTINEL_XCCONFIG
    );
}

#[test]
fn test_overflowing_remote_build_is_an_error() {
    let (dir, config) = workspace(BUILD_OK, "1.2.0 18446744073709551615");
    let output = app_release(
        dir.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "release",
            "test",
            "--bump",
            "build",
            "--force",
        ],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("out of range"));
    assert!(!dir.path().join("build").exists());
}

#[test]
fn test_dry_run_changes_nothing() {
    let (dir, config) = workspace(BUILD_OK, "1.2.0 5");
    let output = app_release(
        dir.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "release",
            "test",
            "--bump",
            "major",
            "--dry-run",
        ],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2.0.0 (1)"));
    assert!(!dir.path().join("build").exists());
}

#[test]
fn test_status_shows_candidates() {
    let (dir, config) = workspace(BUILD_OK, "1.2.0 5");
    let output = app_release(
        dir.path(),
        &["--config", config.to_str().unwrap(), "status", "test"],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1.2.0 (5)"));
    assert!(stdout.contains("1.2.0 (6)"));
    assert!(stdout.contains("1.3.0 (1)"));
}

#[test]
fn test_reset_restores_sentinel() {
    let (dir, config) = workspace(BUILD_OK, "1.2.0 5");
    let xcconfig = dir.path().join("Config/Version.xcconfig");
    fs::write(
        &xcconfig,
        "MARKETING_VERSION = 1.3.0\nCURRENT_PROJECT_VERSION = 4\n",
    )
    .unwrap();

    let output = app_release(dir.path(), &["--config", config.to_str().unwrap(), "reset"]);

    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&xcconfig).unwrap(), SENTINEL_XCCONFIG);
}

#[test]
fn test_unknown_configuration() {
    let (dir, config) = workspace(BUILD_OK, "1.2.0 5");
    let output = app_release(
        dir.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "release",
            "staging",
            "--bump",
            "major",
            "--force",
        ],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown build configuration"));
}
