//! Executable-format analysis.
//!
//! Only the PE subset needed for heuristic scoring is parsed: named imports,
//! section sizes and entropies, packer section names and the COFF timestamp.
//! The parser is optional (`exe-parsers` feature); without it every input
//! reports [`ExecutableAnalysis::CapabilityUnavailable`].

#[cfg(feature = "exe-parsers")]
mod pe;

use crate::config::ExecutableConfig;
use crate::tables::IndicatorTables;
use serde::Serialize;

/// One PE section as reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionInfo {
    pub name: String,
    pub size: u64,
    /// Entropy of the first window of raw data, rounded to three decimals.
    pub entropy: f64,
}

/// Findings for a recognized PE image.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeFindings {
    pub imports: Vec<String>,
    pub num_imports: usize,
    pub suspicious_imports: Vec<String>,
    pub num_suspicious_imports: usize,
    pub sections: Vec<SectionInfo>,
    pub suspicious_sections: Vec<SectionInfo>,
    pub packer_hints: Vec<String>,
    pub compile_timestamp_raw: Option<u32>,
}

/// Outcome of executable analysis. Never an error past this boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutableAnalysis {
    Analyzed(PeFindings),
    /// The input is not a PE image.
    NotExecutable,
    /// No parser is compiled in.
    CapabilityUnavailable(String),
    /// The container was recognized but is malformed.
    ParseError(String),
}

impl ExecutableAnalysis {
    pub fn findings(&self) -> Option<&PeFindings> {
        match self {
            Self::Analyzed(f) => Some(f),
            _ => None,
        }
    }

    pub fn suspicious_import_count(&self) -> usize {
        self.findings().map_or(0, |f| f.num_suspicious_imports)
    }

    pub fn suspicious_section_count(&self) -> usize {
        self.findings().map_or(0, |f| f.suspicious_sections.len())
    }
}

/// Analyze `data` as a PE image.
#[cfg(feature = "exe-parsers")]
pub fn analyze(data: &[u8], cfg: &ExecutableConfig, tables: &IndicatorTables) -> ExecutableAnalysis {
    pe::analyze(data, cfg, tables)
}

#[cfg(not(feature = "exe-parsers"))]
pub fn analyze(
    _data: &[u8],
    _cfg: &ExecutableConfig,
    _tables: &IndicatorTables,
) -> ExecutableAnalysis {
    ExecutableAnalysis::CapabilityUnavailable("PE parser not available".to_string())
}

/// Table APIs present in `imports`, case-insensitively, in table order.
pub fn suspicious_imports(imports: &[String], tables: &IndicatorTables) -> Vec<String> {
    let present: std::collections::HashSet<String> =
        imports.iter().map(|i| i.to_lowercase()).collect();
    tables
        .suspicious_apis
        .iter()
        .filter(|api| present.contains(&api.to_lowercase()))
        .cloned()
        .collect()
}

/// Section names that carry a packer signature, matched upper-cased.
pub fn is_packer_section(name: &str, tables: &IndicatorTables) -> bool {
    let upper = name.to_uppercase();
    tables
        .packer_section_signatures
        .iter()
        .any(|sig| upper.contains(sig.to_uppercase().as_str()))
}
