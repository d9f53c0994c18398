//! Best-effort file type identification.
//!
//! Uses `infer` for content-based detection, `mime_guess` for extension-based
//! hints and, when installed, the `file` utility for a human description.

use crate::config::EngineConfig;
use crate::engines::process::{run_tool, ToolInvocation, ToolRun};
use crate::timeout::CancelToken;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// What the sniffers agreed on. Absent fields are omitted from reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileTypeInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_guess: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FileTypeInfo {
    pub fn is_empty(&self) -> bool {
        self.mime.is_none() && self.extension_guess.is_none() && self.description.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileTypeResult {
    Detected(FileTypeInfo),
    Unknown { warning: String },
}

/// Content sniffing over the magic bytes.
pub struct ContentSniffer;

impl ContentSniffer {
    /// Returns `(mime, canonical extension)` when the content is recognized.
    pub fn sniff_bytes(data: &[u8]) -> Option<(String, String)> {
        let kind = infer::get(data)?;
        debug!("Content detected as {} ({})", kind.mime_type(), kind.extension());
        Some((kind.mime_type().to_string(), kind.extension().to_string()))
    }
}

/// Extension-based guess from the display name.
pub struct ExtensionSniffer;

impl ExtensionSniffer {
    pub fn sniff_name(name: &str) -> Option<String> {
        mime_guess::from_path(name).first().map(|m| m.to_string())
    }
}

/// Combine the in-process sniffers. Content wins over the extension.
pub fn sniff(data: &[u8], name: &str) -> FileTypeInfo {
    let mut info = FileTypeInfo::default();
    if let Some((mime, ext)) = ContentSniffer::sniff_bytes(data) {
        info.mime = Some(mime);
        info.extension_guess = Some(ext);
    } else {
        info.mime = ExtensionSniffer::sniff_name(name);
    }
    info
}

/// Run the `file` utility in brief mode, if configured and installed.
pub async fn describe(
    path: &Path,
    cfg: &EngineConfig,
    cancel: &CancelToken,
) -> Option<String> {
    let program = cfg.file_utility.as_ref()?;
    let inv = ToolInvocation::new("file", program)
        .arg("-b")
        .arg("--")
        .arg(path.as_os_str());
    let limit = Duration::from_secs(cfg.file_utility_timeout_secs);
    match run_tool(&inv, cancel, limit).await {
        ToolRun::Completed(out) if out.status.success() => {
            let text = String::from_utf8_lossy(&out.stdout).trim().to_string();
            (!text.is_empty()).then_some(text)
        }
        ToolRun::Completed(out) => {
            debug!("file utility exited with {:?}", out.status.code());
            None
        }
        ToolRun::NotFound => {
            debug!("file utility not installed");
            None
        }
        ToolRun::Failed(msg) => {
            debug!("file utility failed: {}", msg);
            None
        }
    }
}

/// Merge sniffed hints with the utility description.
pub fn resolve(mut info: FileTypeInfo, description: Option<String>) -> FileTypeResult {
    info.description = description;
    if info.is_empty() {
        FileTypeResult::Unknown {
            warning: "file type could not be determined".to_string(),
        }
    } else {
        FileTypeResult::Detected(info)
    }
}
