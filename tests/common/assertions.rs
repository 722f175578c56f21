//! Assertion helpers for tests.

use std::path::Path;

use pretty_assertions::assert_eq;

/// A parsed stamp line `x,y,number` with tenths kept as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampLine {
    pub x: String,
    pub y: String,
    pub number: i32,
}

/// Read a text artifact, failing with the path on error
pub fn read_text(path: &Path) -> String {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()))
}

/// Split a stamp file into its header and point lines
pub fn parse_stamp(text: &str) -> (String, Vec<StampLine>) {
    let mut lines = text.lines();
    let header = lines.next().expect("stamp file is empty").to_string();
    let points = lines.map(parse_point).collect();
    (header, points)
}

pub fn parse_point(line: &str) -> StampLine {
    let parts: Vec<&str> = line.split(',').collect();
    assert_eq!(parts.len(), 3, "Malformed stamp line: {line:?}");
    StampLine {
        x: parts[0].to_string(),
        y: parts[1].to_string(),
        number: parts[2]
            .parse()
            .unwrap_or_else(|_| panic!("Bad color number in {line:?}")),
    }
}

/// Split `frames.txt` into `(block header, lines)` pairs
pub fn parse_frames(text: &str) -> Vec<(String, Vec<StampLine>)> {
    let mut blocks: Vec<(String, Vec<StampLine>)> = Vec::new();
    for line in text.lines() {
        if line.starts_with("frame,") {
            blocks.push((line.to_string(), Vec::new()));
        } else {
            let block = blocks.last_mut().expect("point line before first frame header");
            block.1.push(parse_point(line));
        }
    }
    blocks
}

/// Assert the file starts with the PNG signature
pub fn assert_png_file(path: &Path) {
    let bytes = std::fs::read(path).expect("Failed to read preview");
    assert!(
        bytes.starts_with(b"\x89PNG\r\n\x1a\n"),
        "Expected PNG at {}, got {} bytes starting with {:?}",
        path.display(),
        bytes.len(),
        &bytes[..8.min(bytes.len())]
    );
}

/// Assert the file starts with a GIF header
pub fn assert_gif_file(path: &Path) {
    let bytes = std::fs::read(path).expect("Failed to read preview");
    assert!(
        bytes.starts_with(b"GIF89a") || bytes.starts_with(b"GIF87a"),
        "Expected GIF at {}",
        path.display()
    );
}

/// Assert the directory holds no temporary or partial files
pub fn assert_no_leftovers(dir: &Path, allowed: &[&str]) {
    for entry in std::fs::read_dir(dir).expect("Failed to list output dir") {
        let name = entry.unwrap().file_name().to_string_lossy().into_owned();
        assert!(
            allowed.contains(&name.as_str()),
            "Unexpected file {name} in {}",
            dir.display()
        );
    }
}
