//! Centralized module for cryptographic hashing algorithms.
//!
//! All three digests are fed from the same chunks, so a file is read once no
//! matter how many algorithms are reported.

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::io::{self, Read};

/// Chunk size for streaming digests (64 KiB).
pub const DIGEST_CHUNK_SIZE: usize = 64 * 1024;

/// Lowercase hex digests of one artifact: two legacy, one primary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestSet {
    pub sha256: String,
    pub md5: String,
    pub sha1: String,
}

impl DigestSet {
    /// Digest an in-memory buffer.
    pub fn of_bytes(data: &[u8]) -> Self {
        let mut dc = DigestComputer::new();
        for chunk in data.chunks(DIGEST_CHUNK_SIZE) {
            dc.update(chunk);
        }
        dc.finalize()
    }

    /// The primary digest used as the artifact identity.
    pub fn primary(&self) -> &str {
        &self.sha256
    }
}

/// Incremental digest state for md5, sha1 and sha256.
pub struct DigestComputer {
    sha256: Sha256,
    sha1: Sha1,
    md5: md5::Context,
    bytes: u64,
}

impl Default for DigestComputer {
    fn default() -> Self {
        Self::new()
    }
}

impl DigestComputer {
    pub fn new() -> Self {
        Self {
            sha256: Sha256::new(),
            sha1: Sha1::new(),
            md5: md5::Context::new(),
            bytes: 0,
        }
    }

    /// Feed one chunk to every algorithm.
    pub fn update(&mut self, chunk: &[u8]) {
        self.sha256.update(chunk);
        self.sha1.update(chunk);
        self.md5.consume(chunk);
        self.bytes += chunk.len() as u64;
    }

    /// Total bytes digested so far.
    pub fn bytes_digested(&self) -> u64 {
        self.bytes
    }

    pub fn finalize(self) -> DigestSet {
        DigestSet {
            sha256: hex::encode(self.sha256.finalize()),
            md5: format!("{:x}", self.md5.compute()),
            sha1: hex::encode(self.sha1.finalize()),
        }
    }
}

/// Stream `reader` in 64 KiB chunks and digest it in one pass.
pub fn compute_digests<R: Read>(mut reader: R) -> io::Result<DigestSet> {
    let mut dc = DigestComputer::new();
    let mut buf = vec![0u8; DIGEST_CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        dc.update(&buf[..n]);
    }
    Ok(dc.finalize())
}
