//! External detection engine adapters.
//!
//! Each engine is an independent subprocess. Whatever happens inside an
//! adapter (missing binary, crash, garbage output, timeout) is folded into an
//! [`EngineOutcome`]; nothing propagates to the caller, and one engine's
//! failure never affects the other.

pub mod clamav;
pub mod process;
pub mod yara;

use std::time::Duration;

/// Uniform result of one engine invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutcome {
    /// The engine ran. An empty list means nothing matched.
    Matches(Vec<String>),
    /// The engine is not installed.
    Unavailable(String),
    /// The engine was found but failed, timed out or was cancelled.
    EngineError(String),
}

impl EngineOutcome {
    pub fn matches(&self) -> &[String] {
        match self {
            Self::Matches(m) => m,
            _ => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable(_))
    }
}

/// An engine outcome plus the executable that produced it, when one ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRun {
    pub outcome: EngineOutcome,
    pub tool: Option<String>,
    /// Trimmed stdout of a completed run, kept for report detail.
    pub output: Option<String>,
}

impl EngineRun {
    pub fn new(outcome: EngineOutcome, tool: Option<String>) -> Self {
        Self {
            outcome,
            tool,
            output: None,
        }
    }

    pub fn with_output(mut self, stdout: &[u8]) -> Self {
        let text = String::from_utf8_lossy(stdout).trim().to_string();
        self.output = (!text.is_empty()).then_some(text);
        self
    }
}

/// Time left for one engine: its own limit, bounded by the scan deadline.
pub fn engine_budget(per_engine: Duration, scan_remaining: Duration) -> Duration {
    per_engine.min(scan_remaining)
}
