//! Antivirus engine adapter (`clamscan`).

use super::process::{run_tool, ToolInvocation, ToolRun};
use super::{EngineOutcome, EngineRun};
use crate::config::EngineConfig;
use crate::error::truncate_message;
use crate::timeout::CancelToken;
use memchr::memmem;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

pub const ENGINE_NAME: &str = "ClamAV";

/// Reported when the scanner command does not exist.
pub const NOT_FOUND_MESSAGE: &str = "ClamAV not found";

const FOUND_MARKER: &[u8] = b"FOUND";

/// Run `clamscan --no-summary <target>`.
///
/// `Matches` is empty for a clean file and holds the detection lines otherwise;
/// the full stdout rides along as the run's output.
pub async fn scan(
    target: &Path,
    cfg: &EngineConfig,
    cancel: &CancelToken,
    limit: Duration,
) -> EngineRun {
    let inv = ToolInvocation::new(ENGINE_NAME, &cfg.clamav_command)
        .arg("--no-summary")
        .arg(target.as_os_str());
    let tool = Some(cfg.clamav_command.display().to_string());
    match run_tool(&inv, cancel, limit).await {
        ToolRun::NotFound => {
            warn!("{}", NOT_FOUND_MESSAGE);
            EngineRun::new(EngineOutcome::Unavailable(NOT_FOUND_MESSAGE.to_string()), None)
        }
        ToolRun::Failed(msg) => {
            warn!("clamscan failed: {}", msg);
            let msg = format!("ClamAV error: {}", msg);
            EngineRun::new(
                EngineOutcome::EngineError(truncate_message(&msg, cfg.max_message_chars)),
                tool,
            )
        }
        ToolRun::Completed(out) => {
            debug!("clamscan exited with {:?}", out.status.code());
            EngineRun::new(interpret(&out.stdout), tool).with_output(&out.stdout)
        }
    }
}

/// Any `FOUND` in stdout means infected; anything else is clean.
pub fn interpret(stdout: &[u8]) -> EngineOutcome {
    if memmem::find(stdout, FOUND_MARKER).is_none() {
        return EngineOutcome::Matches(Vec::new());
    }
    let text = String::from_utf8_lossy(stdout);
    let mut hits: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| l.contains("FOUND"))
        .map(str::to_string)
        .collect();
    if hits.is_empty() {
        hits.push(text.trim().to_string());
    }
    EngineOutcome::Matches(hits)
}
