//! File artifact loading.
//!
//! The input is read exactly once: each chunk is digested and appended to the
//! in-memory buffer that every extractor then borrows read-only.

use crate::config::IoConfig;
use crate::error::{Result, ScanError};
use crate::hashing::{DigestComputer, DigestSet};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Immutable view of the file under analysis.
#[derive(Debug)]
pub struct FileArtifact {
    path: PathBuf,
    name: String,
    data: Vec<u8>,
}

impl FileArtifact {
    /// Open `path`, stream it into memory and digest it in the same pass.
    ///
    /// Any failure here is fatal to the scan.
    pub fn open(
        path: impl AsRef<Path>,
        name: impl Into<String>,
        limits: &IoConfig,
    ) -> Result<(Self, DigestSet)> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ScanError::input(e, path))?;
        let size = file
            .metadata()
            .map_err(|e| ScanError::input(e, path))?
            .len();

        debug!(
            "File size: {} bytes, limit: max_file={}",
            size, limits.max_file_size
        );
        if size > limits.max_file_size {
            warn!(
                "File too large: {} bytes (limit: {})",
                size, limits.max_file_size
            );
            return Err(ScanError::InputTooLarge {
                size,
                limit: limits.max_file_size,
            });
        }

        let (data, digests) = read_and_digest(file, size, limits)
            .map_err(|e| ScanError::input(e, path))?;

        let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        info!("Loaded {:?} ({} bytes)", absolute, data.len());
        Ok((Self::from_parts(absolute, name, data), digests))
    }

    /// Wrap an in-memory buffer (no file system access).
    pub fn from_parts(path: impl Into<PathBuf>, name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            data,
        }
    }

    /// Absolute path of the scanned file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Logical display name supplied by the caller.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Lowercased extension of the display name, with its leading dot, or "".
    pub fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default()
    }
}

fn read_and_digest<R: Read>(
    mut reader: R,
    size_hint: u64,
    limits: &IoConfig,
) -> io::Result<(Vec<u8>, DigestSet)> {
    let mut dc = DigestComputer::new();
    let mut data = Vec::with_capacity(size_hint.min(limits.max_file_size) as usize);
    let mut chunk = vec![0u8; limits.read_chunk_size.max(1)];
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        // The file may grow between stat and read.
        if data.len() as u64 + n as u64 > limits.max_file_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("file grew past limit of {} bytes", limits.max_file_size),
            ));
        }
        dc.update(&chunk[..n]);
        data.extend_from_slice(&chunk[..n]);
    }
    Ok((data, dc.finalize()))
}
