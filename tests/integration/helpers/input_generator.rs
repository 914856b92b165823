//! Builders for test inputs in each supported encoding.

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::Path;

use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;

/// `count` distinct lines: `<tag>-0`, `<tag>-1`, ...
pub fn numbered_lines(tag: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{tag}-{i}")).collect()
}

/// Joins lines, terminating each with `\n`.
pub fn text(lines: &[String]) -> Vec<u8> {
    let mut out = Vec::new();
    for line in lines {
        out.extend_from_slice(line.as_bytes());
        out.push(b'\n');
    }
    out
}

pub fn gzip(content: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(content).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

pub fn bzip2(content: &[u8]) -> Vec<u8> {
    let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::fast());
    encoder.write_all(content).expect("bzip2 write");
    encoder.finish().expect("bzip2 finish")
}

/// Writes `lines` to `path`, compressed according to the path's suffix.
pub fn write_input(path: &Path, lines: &[String]) {
    let plain = text(lines);
    let name = path.to_string_lossy();
    let content = if name.ends_with(".gz") {
        gzip(&plain)
    } else if name.ends_with(".bz2") {
        bzip2(&plain)
    } else {
        plain
    };
    fs::write(path, content).expect("Failed to write test input");
}
