//! Configuration for the scanning pipeline.
//!
//! Every section has working defaults, and every field
//! is optional when loading from JSON so a config file only needs to name what
//! it changes.

use crate::error::{Result, ScanError};
use crate::tables::IndicatorTables;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Master configuration for a scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Input loading limits.
    pub io: IoConfig,
    /// Printable string extraction.
    pub strings: StringsConfig,
    /// URL extraction from strings.
    pub urls: UrlConfig,
    /// Executable-format analysis.
    pub executable: ExecutableConfig,
    /// External detection engines.
    pub engines: EngineConfig,
    /// Archive member listing.
    pub archive: ArchiveConfig,
    /// Report sampling sizes.
    pub report: ReportConfig,
    /// Risk fusion weights, caps and bands.
    pub scoring: ScoringConfig,
    /// Indicator lookup tables.
    pub tables: IndicatorTables,
}

impl ScanConfig {
    /// Parse a (possibly partial) JSON configuration document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a (possibly partial) JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ScanError::Config(format!("cannot read {:?}: {}", path, e)))?;
        Self::from_json_str(&text)
    }

    /// Reject values that would make a component misbehave.
    pub fn validate(&self) -> Result<()> {
        let s = &self.strings;
        if s.min_len == 0 || s.min_len > s.max_len {
            return Err(ScanError::Config(format!(
                "strings.min_len ({}) must be in 1..=max_len ({})",
                s.min_len, s.max_len
            )));
        }
        for (name, cap) in [
            ("strings.max_strings", s.max_strings),
            ("urls.max_raw_matches", self.urls.max_raw_matches),
            ("archive.max_members", self.archive.max_members),
        ] {
            if cap == 0 {
                return Err(ScanError::Config(format!("{} must be > 0", name)));
            }
        }
        if self.io.read_chunk_size == 0 {
            return Err(ScanError::Config("io.read_chunk_size must be > 0".into()));
        }
        if self.engines.timeout_secs == 0 || self.engines.scan_timeout_secs == 0 {
            return Err(ScanError::Config("engine timeouts must be > 0".into()));
        }
        let sc = &self.scoring;
        if !(sc.low_threshold <= sc.medium_threshold
            && sc.medium_threshold <= sc.high_threshold
            && sc.high_threshold <= 100)
        {
            return Err(ScanError::Config(format!(
                "threat bands must satisfy low <= medium <= high <= 100 (got {}/{}/{})",
                sc.low_threshold, sc.medium_threshold, sc.high_threshold
            )));
        }
        let e = self.executable.suspicious_section_entropy;
        if !(0.0..=8.0).contains(&e) {
            return Err(ScanError::Config(format!(
                "executable.suspicious_section_entropy ({}) must be in [0, 8]",
                e
            )));
        }
        Ok(())
    }
}

/// Input loading limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Maximum file size to scan (default: 1 GiB).
    pub max_file_size: u64,
    /// Chunk size for the single streaming read (default: 64 KiB).
    pub read_chunk_size: usize,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            max_file_size: 1024 * 1024 * 1024,
            read_chunk_size: crate::hashing::DIGEST_CHUNK_SIZE,
        }
    }
}

/// Printable string extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StringsConfig {
    /// Minimum run length (default: 4).
    pub min_len: usize,
    /// Maximum run length; longer runs are dropped (default: 128).
    pub max_len: usize,
    /// Soft cap on emitted tokens (default: 5000).
    pub max_strings: usize,
}

impl Default for StringsConfig {
    fn default() -> Self {
        Self {
            min_len: 4,
            max_len: 128,
            max_strings: 5000,
        }
    }
}

/// URL extraction from strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlConfig {
    /// Stop scanning once this many raw matches have accumulated (default: 200).
    pub max_raw_matches: usize,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            max_raw_matches: 200,
        }
    }
}

/// Executable-format analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutableConfig {
    /// Bytes of each section fed to the entropy estimate (default: 64 KiB).
    pub section_entropy_window: usize,
    /// Entropy at or above which a section is suspicious (default: 7.2).
    pub suspicious_section_entropy: f64,
}

impl Default for ExecutableConfig {
    fn default() -> Self {
        Self {
            section_entropy_window: 64 * 1024,
            suspicious_section_entropy: 7.2,
        }
    }
}

/// External detection engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rule file handed to the rule-matching engine.
    pub rules_path: PathBuf,
    /// Rule engine executables, tried in order. Bare names go through `PATH`.
    pub yara_candidates: Vec<PathBuf>,
    /// Antivirus scanner command.
    pub clamav_command: PathBuf,
    /// Per-engine timeout in seconds (default: 60).
    pub timeout_secs: u64,
    /// Deadline for the whole engine phase of a scan (default: 300).
    pub scan_timeout_secs: u64,
    /// Treat a non-zero rule engine exit as an error even when it printed output.
    pub strict_exit_status: bool,
    /// Type-description utility; `None` skips the type lookup.
    pub file_utility: Option<PathBuf>,
    /// Timeout for the type-description utility (default: 10).
    pub file_utility_timeout_secs: u64,
    /// Maximum characters of engine diagnostics kept in reports.
    pub max_message_chars: usize,
}

/// Default rule-engine candidates: the search path, then the bundled tools dir.
pub fn default_yara_candidates() -> Vec<PathBuf> {
    let exe = std::env::consts::EXE_SUFFIX;
    vec![
        PathBuf::from(format!("yara{}", exe)),
        Path::new(".")
            .join("tools")
            .join("yara")
            .join(format!("yara64{}", exe)),
        Path::new(".")
            .join("tools")
            .join("yara")
            .join(format!("yara{}", exe)),
    ]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from("malware_rules.yar"),
            yara_candidates: default_yara_candidates(),
            clamav_command: PathBuf::from("clamscan"),
            timeout_secs: 60,
            scan_timeout_secs: crate::timeout::DEFAULT_TIMEOUT_SECONDS,
            strict_exit_status: false,
            file_utility: Some(PathBuf::from("file")),
            file_utility_timeout_secs: crate::timeout::FAST_TIMEOUT_SECONDS,
            max_message_chars: 200,
        }
    }
}

/// Archive member listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Maximum member names listed (default: 200).
    pub max_members: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self { max_members: 200 }
    }
}

/// Report sampling sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Tokens copied into `strings_sample` (default: 50).
    pub strings_sample: usize,
    /// URLs copied into `urls_extracted` (default: 50).
    pub urls_sample: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            strings_sample: 50,
            urls_sample: 50,
        }
    }
}

/// Risk fusion weights, caps and bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub rule_match_points: u32,
    pub rule_match_cap: u32,
    pub av_infected_points: u32,
    pub suspicious_import_points: u32,
    pub suspicious_import_cap: u32,
    pub suspicious_section_points: u32,
    pub suspicious_section_cap: u32,
    pub suspicious_strings_points: u32,
    pub large_file_points: u32,
    /// Size strictly above which the large-file contribution applies (default: 50 MiB).
    pub large_file_bytes: u64,
    pub high_threshold: u8,
    pub medium_threshold: u8,
    pub low_threshold: u8,
    /// Score at or above which the verdict is malicious (default: 50).
    pub malicious_threshold: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            rule_match_points: 10,
            rule_match_cap: 60,
            av_infected_points: 40,
            suspicious_import_points: 5,
            suspicious_import_cap: 20,
            suspicious_section_points: 5,
            suspicious_section_cap: 20,
            suspicious_strings_points: 10,
            large_file_points: 5,
            large_file_bytes: 50 * 1024 * 1024,
            high_threshold: 80,
            medium_threshold: 50,
            low_threshold: 20,
            malicious_threshold: 50,
        }
    }
}
