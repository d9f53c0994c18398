//! Indicator lookup tables.
//!
//! These lists are data, not logic: they are versioned and can be replaced
//! wholesale through [`crate::config::ScanConfig`] without touching the
//! extractors or the fusion step.

use serde::{Deserialize, Serialize};

/// Version of the built-in tables. Bump whenever a list below changes.
pub const TABLES_VERSION: u32 = 1;

/// Security-relevant Windows APIs: process injection, remote execution,
/// download/network and keylogging primitives.
pub const SUSPICIOUS_APIS: &[&str] = &[
    "WinExec",
    "ShellExecuteA",
    "ShellExecuteW",
    "URLDownloadToFileA",
    "URLDownloadToFileW",
    "CreateRemoteThread",
    "WriteProcessMemory",
    "VirtualAlloc",
    "VirtualAllocEx",
    "VirtualProtect",
    "SetWindowsHookExA",
    "SetWindowsHookExW",
    "GetAsyncKeyState",
    "InternetOpenA",
    "InternetOpenUrlA",
    "InternetOpenW",
    "InternetOpenUrlW",
    "WSASocketA",
    "connect",
];

/// Section-name fragments left behind by common packers (matched upper-cased).
pub const PACKER_SECTION_SIGNATURES: &[&str] = &["UPX", "ASPACK", "MPRESS", "FSG"];

/// Lowercase prefixes of strings that launch a script host or shell.
pub const DANGEROUS_TOOL_PREFIXES: &[&str] = &["cmd.exe", "powershell", "wscript", "mshta"];

/// Living-off-the-land binaries used for lateral or proxied execution.
pub const LATERAL_EXECUTION_TOOLS: &[&str] = &["regsvr32", "rundll32"];

/// The full set of lookup tables consumed by the extractors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorTables {
    /// Table version, carried into logs so verdicts can be traced to data.
    pub version: u32,
    pub suspicious_apis: Vec<String>,
    pub packer_section_signatures: Vec<String>,
    pub dangerous_tool_prefixes: Vec<String>,
    pub lateral_execution_tools: Vec<String>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for IndicatorTables {
    fn default() -> Self {
        Self {
            version: TABLES_VERSION,
            suspicious_apis: owned(SUSPICIOUS_APIS),
            packer_section_signatures: owned(PACKER_SECTION_SIGNATURES),
            dangerous_tool_prefixes: owned(DANGEROUS_TOOL_PREFIXES),
            lateral_execution_tools: owned(LATERAL_EXECUTION_TOOLS),
        }
    }
}
