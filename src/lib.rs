//! Static file risk triage.
//!
//! A file is read once, digested, and examined by independent static signals
//! (printable strings, URLs, PE structure, archive members) and external
//! detection engines. The signals are fused into a bounded score, a threat
//! level and a malicious verdict, reported as a JSON document. The file is
//! never executed.

/// Archive member listing (ZIP, TAR)
pub mod archive;
/// Single-pass file loading
pub mod artifact;
/// Configuration for every component
pub mod config;
/// External detection engine adapters
pub mod engines;
/// Shannon entropy
pub mod entropy;
/// Error types
pub mod error;
/// Executable-format analysis
pub mod exe;
/// File type identification
pub mod filetype;
/// Digest computation
pub mod hashing;
/// Suspicious-string indicators
pub mod indicators;
/// Logging initialization
pub mod logging;
/// Scan orchestration
pub mod pipeline;
/// JSON report contract
pub mod report;
/// Risk fusion
pub mod score;
/// Printable string extraction
pub mod strings;
/// Indicator lookup tables
pub mod tables;
/// Timeouts and cancellation
pub mod timeout;
/// URL extraction
pub mod urls;

pub use config::ScanConfig;
pub use error::{Result, ScanError};
pub use pipeline::{ScanRequest, Scanner};
pub use report::{ScanOutput, ScanReport};
pub use score::{RiskAssessment, ThreatLevel};
