//! Common test utilities and helpers.
//!
//! Everything here is hermetic: no sample corpus, no installed engines. PE
//! images are synthesized in memory and engines are stand-in shell scripts.

#![allow(dead_code)]


use filerisk::ScanConfig;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Configuration whose engines and `file` utility cannot be found.
pub fn hermetic_config() -> ScanConfig {
    let mut cfg = ScanConfig::default();
    cfg.engines.yara_candidates = vec![
        PathBuf::from("/nonexistent/filerisk-test/yara"),
        PathBuf::from("/nonexistent/filerisk-test/tools/yara/yara64"),
        PathBuf::from("/nonexistent/filerisk-test/tools/yara/yara"),
    ];
    cfg.engines.clamav_command = PathBuf::from("/nonexistent/filerisk-test/clamscan");
    cfg.engines.file_utility = None;
    cfg
}

/// Creates a temporary file with the given content.
pub fn create_temp_file(content: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Deterministic pseudo-random bytes (xorshift32); close to 8 bits/byte.
pub fn random_bytes(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

/// Write an executable shell script standing in for an external engine.
#[cfg(unix)]
pub fn fake_engine(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}
