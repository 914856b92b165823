//! Integration tests for the `shardsplit` binary.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

use crate::helpers::{assert_same_lines, numbered_lines, read_shard, read_shard_lines, write_input};

fn shardsplit() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_shardsplit"));
    command.env("RUST_LOG", "info");
    command
}

#[test]
fn test_split_command_plain() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let lines = numbered_lines("plain", 1_234);
    let input = temp_dir.path().join("input.txt");
    write_input(&input, &lines);
    let prefix = temp_dir.path().join("shards/part-").to_str().unwrap().to_string();

    let status = shardsplit()
        .args(["-s", "3", "-p", &prefix, input.to_str().unwrap()])
        .status()
        .expect("Failed to run shardsplit");

    assert!(status.success(), "shardsplit failed");
    assert_same_lines(read_shard_lines(&prefix, 3, ""), &lines);
}

#[test]
fn test_split_command_gzip_mixed_inputs() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut expected = Vec::new();
    let mut args: Vec<String> = Vec::new();
    for name in ["a.txt", "b.txt.gz", "c.txt.bz2"] {
        let lines = numbered_lines(name, 500);
        let path = temp_dir.path().join(name);
        write_input(&path, &lines);
        args.push(path.to_str().unwrap().to_string());
        expected.extend(lines);
    }
    let prefix = temp_dir.path().join("out-").to_str().unwrap().to_string();

    let status = shardsplit()
        .args(["--split", "2", "--prefix", &prefix, "--compress", "gzip", "-j", "2"])
        .args(&args)
        .status()
        .expect("Failed to run shardsplit");

    assert!(status.success(), "shardsplit failed");
    assert!(!temp_dir.path().join("out-000").exists());
    assert_same_lines(read_shard_lines(&prefix, 2, ".gz"), &expected);
}

#[test]
fn test_split_command_reads_stdin_with_verbose_diagnostics() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let prefix = temp_dir.path().join("out-").to_str().unwrap().to_string();

    let mut child = shardsplit()
        .env("RUST_LOG", "off")
        .args(["-v", "-s", "1", "-j", "1", "-p", &prefix, "-"])
        .stdin(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to run shardsplit");
    child.stdin.take().unwrap().write_all(b"line1\nline2\nline3\n").unwrap();
    let output = child.wait_with_output().expect("Failed to wait for shardsplit");

    assert!(output.status.success(), "shardsplit failed");
    assert_eq!(read_shard(&temp_dir.path().join("out-000")), "line1\nline2\nline3\n");
    assert_eq!(String::from_utf8_lossy(&output.stderr), "-\n-, total=3\n");
}

#[test]
fn test_split_command_missing_input_exits_with_failure() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let missing = temp_dir.path().join("missing.txt");
    let prefix = temp_dir.path().join("out-").to_str().unwrap().to_string();

    let output = shardsplit()
        .args(["-p", &prefix, missing.to_str().unwrap()])
        .output()
        .expect("Failed to run shardsplit");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.txt"));
}

#[test]
fn test_split_command_usage_errors_exit_2() {
    let no_inputs = shardsplit().output().expect("Failed to run shardsplit");
    assert_eq!(no_inputs.status.code(), Some(2));

    let bad_number = shardsplit().args(["-s", "many", "in.txt"]).output().unwrap();
    assert_eq!(bad_number.status.code(), Some(2));

    for args in [
        &["-s", "0", "in.txt"][..],
        &["-j", "0", "in.txt"],
        &["--max-line-length", "0", "in.txt"],
        &["--timeout", "0", "in.txt"],
        &["-c", "gzip", "--compression-level", "12", "in.txt"],
    ] {
        let output = shardsplit().args(args).output().unwrap();
        assert_eq!(output.status.code(), Some(2), "{args:?}");
        assert!(String::from_utf8_lossy(&output.stderr).contains("Usage:"), "{args:?}");
    }
}

#[test]
fn test_split_command_unknown_compression() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let input = temp_dir.path().join("input.txt");
    write_input(&input, &numbered_lines("x", 3));
    let prefix = temp_dir.path().join("out-").to_str().unwrap().to_string();

    let output = shardsplit()
        .args(["-c", "lzo", "-p", &prefix, input.to_str().unwrap()])
        .output()
        .expect("Failed to run shardsplit");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid value 'lzo'"));
    assert!(stderr.contains("Usage:"));
    assert!(!temp_dir.path().join("out-000").exists());
}

#[test]
fn test_split_command_version() {
    let output = shardsplit().arg("--version").output().expect("Failed to run shardsplit");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("shardsplit "));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}
