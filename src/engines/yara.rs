//! Rule-matching engine adapter (the `yara` command-line scanner).

use super::process::{run_tool, ToolInvocation, ToolRun};
use super::{EngineOutcome, EngineRun};
use crate::config::EngineConfig;
use crate::error::truncate_message;
use crate::timeout::CancelToken;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

pub const ENGINE_NAME: &str = "YARA";

/// Reported when no candidate executable exists.
pub const NOT_FOUND_MESSAGE: &str = "YARA not found in PATH or ./tools/yara/";

const NON_ZERO_MESSAGE: &str = "YARA returned non-zero";

/// Run the first available candidate as `<exe> <rules> <target>`.
pub async fn scan(
    target: &Path,
    cfg: &EngineConfig,
    cancel: &CancelToken,
    limit: Duration,
) -> EngineRun {
    for candidate in &cfg.yara_candidates {
        let inv = ToolInvocation::new(ENGINE_NAME, candidate)
            .arg(cfg.rules_path.as_os_str())
            .arg(target.as_os_str());
        let tool = Some(candidate.display().to_string());
        match run_tool(&inv, cancel, limit).await {
            ToolRun::NotFound => {
                debug!("yara candidate {:?} not found", candidate);
                continue;
            }
            ToolRun::Failed(msg) => {
                warn!("yara failed: {}", msg);
                let msg = format!("YARA error: {}", msg);
                return EngineRun::new(
                    EngineOutcome::EngineError(truncate_message(&msg, cfg.max_message_chars)),
                    tool,
                );
            }
            ToolRun::Completed(out) => {
                let outcome = interpret(
                    out.status.success(),
                    &out.stdout,
                    &out.stderr,
                    cfg.strict_exit_status,
                    cfg.max_message_chars,
                );
                return EngineRun::new(outcome, tool);
            }
        }
    }
    warn!("{}", NOT_FOUND_MESSAGE);
    EngineRun::new(EngineOutcome::Unavailable(NOT_FOUND_MESSAGE.to_string()), None)
}

/// Map a finished run to an outcome.
///
/// Some engine builds exit non-zero yet still print matches; unless `strict`
/// is set that output is accepted.
pub fn interpret(
    success: bool,
    stdout: &[u8],
    stderr: &[u8],
    strict: bool,
    max_message_chars: usize,
) -> EngineOutcome {
    let stdout = String::from_utf8_lossy(stdout);
    if !success {
        if stdout.trim().is_empty() || strict {
            let stderr = String::from_utf8_lossy(stderr);
            let msg = match stderr.trim() {
                "" => NON_ZERO_MESSAGE,
                s => s,
            };
            return EngineOutcome::EngineError(truncate_message(msg, max_message_chars));
        }
        warn!("yara exited non-zero but printed output; accepting it as matches");
    }
    let matches = stdout
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect();
    EngineOutcome::Matches(matches)
}
