#![allow(dead_code)]

use consulator::{KvMap, KvPair};
use std::path::Path;
use tempfile::TempDir;

/// Create a temporary directory for input fixtures
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Write a fixture file, creating parent directories as needed
pub fn write_fixture(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    std::fs::write(path, content).expect("Failed to write fixture");
}

/// Build a local key/value map from string pairs
pub fn local_map(pairs: &[(&str, &str)]) -> KvMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
        .collect()
}

/// Build a remote listing from string pairs
pub fn remote_pairs(pairs: &[(&str, &str)]) -> Vec<KvPair> {
    pairs.iter().map(|(k, v)| KvPair::new(*k, *v)).collect()
}

/// Split captured report output into lines
pub fn output_lines(out: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(out)
        .lines()
        .map(str::to_string)
        .collect()
}
