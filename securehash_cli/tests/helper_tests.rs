//! The reference helper binary speaks the helper protocol

use assert_cmd::Command;
use predicates::prelude::*;

fn helper() -> Command {
    Command::cargo_bin("securehash-helper").unwrap()
}

#[test]
fn test_digest_on_stdout() {
    helper()
        .args(["--algorithm", "md5"])
        .write_stdin("hello")
        .assert()
        .success()
        .stdout("5d41402abc4b2a76b9719d911017c592\n")
        .stderr("");
}

#[test]
fn test_progress_with_size_argument() {
    let input = vec![b'x'; 200_000];
    helper()
        .args(["--algorithm", "sha1", "200000"])
        .write_stdin(input)
        .assert()
        .success()
        .stderr(predicate::str::starts_with("PROGRESS:0\n"))
        .stderr(predicate::str::ends_with("PROGRESS:100\n"));
}

#[test]
fn test_unsupported_digest_exits_2() {
    helper()
        .args(["--algorithm", "md2"])
        .write_stdin("x")
        .assert()
        .code(2)
        .stdout("")
        .stderr(predicate::str::contains("unsupported digest 'md2'"));
}

#[test]
fn test_list() {
    helper()
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("sha256"))
        .stdout(predicate::str::contains("crc32"));
}
