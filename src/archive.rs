//! Archive member listing.
//!
//! Fast magic checks decide the container; members are enumerated by name
//! only. Nothing is extracted and nested archives are not opened.

use crate::config::ArchiveConfig;
use memchr::memmem;
use serde::Serialize;
use std::fmt;
use std::io::{self, Cursor, Read};
use tracing::{debug, warn};

const ZIP_LOCAL_MAGIC: &[u8] = b"PK\x03\x04";
const ZIP_EOCD_MAGIC: &[u8] = b"PK\x05\x06";
/// EOCD record plus the largest possible trailing comment.
const ZIP_EOCD_SEARCH: usize = 22 + 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    Zip,
    Tar,
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zip => f.write_str("zip"),
            Self::Tar => f.write_str("tar"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveListing {
    NotArchive,
    Listed {
        format: ArchiveFormat,
        members: Vec<String>,
        /// More members exist than were listed.
        truncated: bool,
    },
    /// Recognized but malformed. Never fatal.
    Corrupt { format: ArchiveFormat, error: String },
}

/// List the members of a ZIP or TAR container held in `data`.
pub fn list_members(data: &[u8], cfg: &ArchiveConfig) -> ArchiveListing {
    if looks_like_zip(data) {
        return list_zip(data, cfg);
    }
    if is_tar(data) {
        return list_tar(data, cfg);
    }
    ArchiveListing::NotArchive
}

fn looks_like_zip(data: &[u8]) -> bool {
    if data.starts_with(ZIP_LOCAL_MAGIC) || data.starts_with(ZIP_EOCD_MAGIC) {
        return true;
    }
    // Self-extracting archives carry a prefix; the end record is still near the tail.
    let tail = &data[data.len().saturating_sub(ZIP_EOCD_SEARCH)..];
    memmem::rfind(tail, ZIP_EOCD_MAGIC).is_some()
}

fn list_zip(data: &[u8], cfg: &ArchiveConfig) -> ArchiveListing {
    match zip::ZipArchive::new(Cursor::new(data)) {
        Ok(archive) => {
            let members: Vec<String> = archive
                .file_names()
                .take(cfg.max_members)
                .map(str::to_string)
                .collect();
            let truncated = archive.len() > members.len();
            debug!("zip: {} members ({} listed)", archive.len(), members.len());
            ArchiveListing::Listed {
                format: ArchiveFormat::Zip,
                members,
                truncated,
            }
        }
        Err(e) if data.starts_with(ZIP_LOCAL_MAGIC) || data.starts_with(ZIP_EOCD_MAGIC) => {
            warn!("zip listing failed: {}", e);
            ArchiveListing::Corrupt {
                format: ArchiveFormat::Zip,
                error: e.to_string(),
            }
        }
        // A stray end-record signature inside some other file.
        Err(_) if is_tar(data) => list_tar(data, cfg),
        Err(_) => ArchiveListing::NotArchive,
    }
}

fn is_tar(data: &[u8]) -> bool {
    data.len() >= 262 && &data[257..262] == b"ustar"
}

fn list_tar(data: &[u8], cfg: &ArchiveConfig) -> ArchiveListing {
    let mut archive = tar::Archive::new(Cursor::new(data));
    match walk_tar(&mut archive, cfg.max_members) {
        Ok((members, truncated)) => {
            debug!("tar: {} members listed", members.len());
            ArchiveListing::Listed {
                format: ArchiveFormat::Tar,
                members,
                truncated,
            }
        }
        Err(e) => {
            warn!("tar listing failed: {}", e);
            ArchiveListing::Corrupt {
                format: ArchiveFormat::Tar,
                error: e.to_string(),
            }
        }
    }
}

/// Member paths in header order. GNU long-name and pax records are folded
/// into the entry they describe by the reader.
fn walk_tar<R: Read>(archive: &mut tar::Archive<R>, max: usize) -> io::Result<(Vec<String>, bool)> {
    let mut members = Vec::new();
    for entry in archive.entries()? {
        let entry = entry?;
        if entry.header().entry_type().is_pax_global_extensions() {
            continue;
        }
        if members.len() >= max {
            return Ok((members, true));
        }
        members.push(entry.path()?.to_string_lossy().into_owned());
    }
    Ok((members, false))
}
