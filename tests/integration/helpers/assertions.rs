//! Assertion helpers for verifying shard contents.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

/// Decodes shard bytes, gunzipping when `path` ends in `.gz`.
pub fn decode_shard(path: &Path, bytes: &[u8]) -> String {
    if path.to_string_lossy().ends_with(".gz") {
        let mut out = String::new();
        MultiGzDecoder::new(bytes).read_to_string(&mut out).expect("Shard is not valid gzip");
        out
    } else {
        String::from_utf8(bytes.to_vec()).expect("Shard is not UTF-8")
    }
}

/// Reads a shard from disk.
pub fn read_shard(path: &Path) -> String {
    let bytes = fs::read(path).unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));
    decode_shard(path, &bytes)
}

/// Lines of every shard `<prefix>000<ext>` .. `<prefix><count-1><ext>` on disk.
///
/// # Panics
///
/// Panics if a shard is missing or does not end with a newline.
pub fn read_shard_lines(prefix: &str, count: usize, ext: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for index in 0..count {
        let path = PathBuf::from(format!("{prefix}{index:03}{ext}"));
        assert!(path.exists(), "Shard {} was not created", path.display());
        lines.extend(shard_lines(&path, &read_shard(&path)));
    }
    lines
}

/// Lines of every in-memory shard.
pub fn memory_shard_lines(shards: &BTreeMap<PathBuf, Vec<u8>>) -> Vec<String> {
    shards.iter().flat_map(|(path, bytes)| shard_lines(path, &decode_shard(path, bytes))).collect()
}

fn shard_lines(path: &Path, content: &str) -> Vec<String> {
    if content.is_empty() {
        return Vec::new();
    }
    assert!(content.ends_with('\n'), "Shard {} is not newline-terminated", path.display());
    content.lines().map(str::to_string).collect()
}

/// Asserts that `actual` and `expected` hold the same lines, ignoring order.
pub fn assert_same_lines(mut actual: Vec<String>, expected: &[String]) {
    let mut expected = expected.to_vec();
    actual.sort();
    expected.sort();
    assert_eq!(actual.len(), expected.len(), "Line count mismatch");
    assert_eq!(actual, expected, "Line multiset mismatch");
}
