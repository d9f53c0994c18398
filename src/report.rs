//! JSON report contract.
//!
//! Field names and shapes are stable: downstream consumers key on them.

use crate::archive::{ArchiveFormat, ArchiveListing};
use crate::engines::{EngineOutcome, EngineRun};
use crate::error::Result;
use crate::exe::{ExecutableAnalysis, PeFindings};
use crate::filetype::{FileTypeInfo, FileTypeResult};
use crate::hashing::DigestSet;
use crate::score::{Contribution, ThreatLevel};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const NOT_PE_MESSAGE: &str = "Not a PE file";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub size_bytes: u64,
    /// Lowercased, with the leading dot; empty when the name has none.
    pub extension: String,
    /// Whole-file entropy, rounded to three decimals.
    pub entropy: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FileTypeReport {
    Detected(FileTypeInfo),
    Warning { warning: String },
}

impl From<FileTypeResult> for FileTypeReport {
    fn from(r: FileTypeResult) -> Self {
        match r {
            FileTypeResult::Detected(info) => Self::Detected(info),
            FileTypeResult::Unknown { warning } => Self::Warning { warning },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PeReport {
    Findings(PeFindings),
    Marker { desc: String },
    Warning { warning: String },
    Error { error: String },
}

impl From<&ExecutableAnalysis> for PeReport {
    fn from(a: &ExecutableAnalysis) -> Self {
        match a {
            ExecutableAnalysis::Analyzed(f) => Self::Findings(f.clone()),
            ExecutableAnalysis::NotExecutable => Self::Marker {
                desc: NOT_PE_MESSAGE.to_string(),
            },
            ExecutableAnalysis::CapabilityUnavailable(w) => Self::Warning { warning: w.clone() },
            ExecutableAnalysis::ParseError(e) => Self::Error { error: e.clone() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum YaraReport {
    Matches {
        matches: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        yara: Option<String>,
    },
    Warning {
        warning: String,
    },
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        yara: Option<String>,
    },
}

impl From<&EngineRun> for YaraReport {
    fn from(run: &EngineRun) -> Self {
        match &run.outcome {
            EngineOutcome::Matches(m) => Self::Matches {
                matches: m.clone(),
                yara: run.tool.clone(),
            },
            EngineOutcome::Unavailable(w) => Self::Warning { warning: w.clone() },
            EngineOutcome::EngineError(e) => Self::Error {
                error: e.clone(),
                yara: run.tool.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AvStatus {
    Infected,
    Clean,
}

impl AvStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Infected => "infected",
            Self::Clean => "clean",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ClamAvReport {
    Status {
        status: AvStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    Warning {
        warning: String,
    },
    Error {
        error: String,
    },
}

impl ClamAvReport {
    pub fn status(&self) -> Option<AvStatus> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<&EngineRun> for ClamAvReport {
    fn from(run: &EngineRun) -> Self {
        match &run.outcome {
            EngineOutcome::Matches(hits) if hits.is_empty() => Self::Status {
                status: AvStatus::Clean,
                detail: None,
            },
            EngineOutcome::Matches(hits) => Self::Status {
                status: AvStatus::Infected,
                detail: Some(run.output.clone().unwrap_or_else(|| hits.join("\n"))),
            },
            EngineOutcome::Unavailable(w) => Self::Warning { warning: w.clone() },
            EngineOutcome::EngineError(e) => Self::Error { error: e.clone() },
        }
    }
}

/// Counts cross-referencing the rest of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Indicators {
    pub yara_match_count: usize,
    /// `null` when the antivirus engine did not produce a verdict.
    pub clamav_status: Option<AvStatus>,
    pub suspicious_strings: bool,
    pub suspicious_string_matches: Vec<String>,
    pub suspicious_imports_count: usize,
    pub suspicious_sections_count: usize,
    pub urls_found: usize,
}

/// Archive fields of the report, flattened in at the top level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_listing: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_format: Option<ArchiveFormat>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub archive_truncated: bool,
}

impl From<ArchiveListing> for ArchiveFields {
    fn from(listing: ArchiveListing) -> Self {
        match listing {
            ArchiveListing::NotArchive => Self::default(),
            ArchiveListing::Listed {
                format,
                members,
                truncated,
            } => Self {
                zip_listing: Some(members),
                archive_format: Some(format),
                archive_truncated: truncated,
                ..Self::default()
            },
            ArchiveListing::Corrupt { format, error } => Self {
                zip_error: Some(error),
                archive_format: Some(format),
                ..Self::default()
            },
        }
    }
}

/// The full scan report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub filename: String,
    /// Primary digest, duplicated from `hashes` for older consumers.
    pub sha256: String,
    pub file_info: FileInfo,
    pub file_type_info: FileTypeReport,
    pub strings_sample: Vec<String>,
    pub urls_extracted: Vec<String>,
    pub pe_analysis: PeReport,
    pub yara: YaraReport,
    pub clamav: ClamAvReport,
    #[serde(flatten)]
    pub archive: ArchiveFields,
    pub hashes: DigestSet,
    pub risk_score: u8,
    pub threat_level: ThreatLevel,
    pub malicious: bool,
    pub risk_breakdown: Vec<Contribution>,
    pub analysis_time_sec: f64,
    pub scanned_at: DateTime<Utc>,
    pub indicators: Indicators,
}

/// What the entry point prints: a report, or a single error field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScanOutput {
    Report(Box<ScanReport>),
    Failure { error: String },
}

impl ScanOutput {
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        let s = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(s)
    }
}
