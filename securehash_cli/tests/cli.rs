use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
const ABC_MD5: &str = "900150983cd24fb0d6963f7d28e17f72";

/// A `securehash` command isolated from the user's configuration
fn securehash(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("securehash").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.path())
        .env_remove("SECUREHASH_OUTPUT__DEFAULT_FORMAT")
        .env_remove("SECUREHASH_REGISTRY__PATH")
        .env("NO_COLOR", "1");
    cmd
}

fn write_registry(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("algorithms.json");
    fs::write(
        &path,
        r#"{
  "algorithms": [
    {"name": "SHA-256", "type": "hashlib", "hashlib_name": "sha256"},
    {"name": "MD5", "type": "hashlib", "hashlib_name": "md5"},
    {"name": "SHA-256 (helper)", "type": "executable",
     "executable": "securehash-helper", "args": ["--algorithm", "sha256"]},
    {"name": "Broken", "type": "executable", "executable": "no-such-helper"},
    {"name": "Invalid", "type": "mystery"}
  ]
}"#,
    )
    .unwrap();
    path
}

#[test]
fn test_version() {
    let home = TempDir::new().unwrap();
    securehash(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_text_with_default_registry() {
    let home = TempDir::new().unwrap();
    securehash(&home)
        .args(["text", "abc", "-a", "SHA-256"])
        .assert()
        .success()
        .stdout(format!("SHA-256: {ABC_SHA256}\n"));
}

#[test]
fn test_text_without_algorithms_uses_whole_registry() {
    let home = TempDir::new().unwrap();
    securehash(&home)
        .args(["text", "abc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SHA-256: "))
        .stdout(predicate::str::contains("SHA-384: "))
        .stdout(predicate::str::contains("SHA-512: "));
}

#[test]
fn test_text_json_output() {
    let home = TempDir::new().unwrap();
    let output = securehash(&home)
        .args(["--format", "json", "text", "abc", "-a", "SHA-256"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["SHA-256"]["digest"], ABC_SHA256);
}

#[test]
fn test_text_helper_and_failure_isolation() {
    let home = TempDir::new().unwrap();
    let registry = write_registry(home.path());

    securehash(&home)
        .arg("--registry")
        .arg(&registry)
        .args(["text", "abc", "-a", "SHA-256 (helper)", "-a", "Broken", "-a", "MD5"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(format!("SHA-256 (helper): {ABC_SHA256}")))
        .stdout(predicate::str::contains(format!("MD5: {ABC_MD5}")))
        .stdout(predicate::str::contains("Broken: Error: "))
        .stderr(predicate::str::contains("1 of 3 algorithm(s) failed"));
}

#[test]
fn test_unknown_algorithm_is_rejected() {
    let home = TempDir::new().unwrap();
    securehash(&home)
        .args(["text", "abc", "-a", "Whirlpool"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown algorithm 'Whirlpool'"));
}

#[test]
fn test_file_single() {
    let home = TempDir::new().unwrap();
    let registry = write_registry(home.path());
    let file = home.path().join("input.txt");
    fs::write(&file, b"abc").unwrap();

    securehash(&home)
        .arg("--registry")
        .arg(&registry)
        .arg("file")
        .arg(&file)
        .args(["-a", "MD5", "-a", "SHA-256 (helper)"])
        .assert()
        .success()
        .stdout(format!("MD5: {ABC_MD5}\nSHA-256 (helper): {ABC_SHA256}\n"));
}

#[test]
fn test_file_directory_csv() {
    let home = TempDir::new().unwrap();
    let data = home.path().join("data");
    fs::create_dir_all(data.join("nested")).unwrap();
    fs::write(data.join("a.bin"), b"abc").unwrap();
    fs::write(data.join("skip.txt"), b"abc").unwrap();
    fs::write(data.join("nested/b.bin"), b"abc").unwrap();

    let output = securehash(&home)
        .args(["--format", "csv", "file", "-r", "-i", "*.bin", "-a", "SHA-256"])
        .arg(&data)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines[0], "file,algorithm,hash,size,time_ms");
    assert_eq!(lines.len(), 3, "{stdout}");
    assert!(lines[1].contains("a.bin,SHA-256,"));
    assert!(lines[2].contains("b.bin,SHA-256,"));
    assert!(!stdout.contains("skip.txt"));
}

#[test]
fn test_file_helper_failure_fails_the_file() {
    let home = TempDir::new().unwrap();
    let registry = write_registry(home.path());
    let file = home.path().join("input.txt");
    fs::write(&file, b"abc").unwrap();

    securehash(&home)
        .arg("--registry")
        .arg(&registry)
        .arg("file")
        .arg(&file)
        .args(["-a", "SHA-256", "-a", "Broken"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Error: External tool for 'Broken' failed"))
        .stdout(predicate::str::contains(ABC_SHA256).not());
}

#[test]
fn test_file_missing_path() {
    let home = TempDir::new().unwrap();
    securehash(&home)
        .args(["file", "/nonexistent/securehash/input.bin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Path not found"));
}

#[test]
fn test_list_shows_kinds_and_skips_invalid_records() {
    let home = TempDir::new().unwrap();
    let registry = write_registry(home.path());

    securehash(&home)
        .arg("--registry")
        .arg(&registry)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("in-process"))
        .stdout(predicate::str::contains("external"))
        .stdout(predicate::str::contains("--algorithm sha256"))
        .stdout(predicate::str::contains("Invalid").not());
}

#[test]
fn test_config_path_honours_xdg() {
    let home = TempDir::new().unwrap();
    securehash(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("securehash"))
        .stdout(predicate::str::contains("config.toml"))
        .stdout(predicate::str::contains(
            home.path().to_string_lossy().into_owned(),
        ));
}

#[test]
fn test_config_set_get_show() {
    let home = TempDir::new().unwrap();

    securehash(&home)
        .args(["config", "set", "engine.text_timeout_secs", "9"])
        .assert()
        .success();

    securehash(&home)
        .args(["config", "get", "engine.text_timeout_secs"])
        .assert()
        .success()
        .stdout("9\n");

    securehash(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[engine]"))
        .stdout(predicate::str::contains("text_timeout_secs = 9"));
}

#[test]
fn test_env_overrides_output_format() {
    let home = TempDir::new().unwrap();
    securehash(&home)
        .env("SECUREHASH_OUTPUT__DEFAULT_FORMAT", "csv")
        .args(["text", "abc", "-a", "SHA-256"])
        .assert()
        .success()
        .stdout(format!("algorithm,hash\nSHA-256,{ABC_SHA256}\n"));
}

#[test]
fn test_completions() {
    let home = TempDir::new().unwrap();
    securehash(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("securehash"));
}
