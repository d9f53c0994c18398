//! Bounded subprocess execution for external tools.

use crate::error::ScanError;
use crate::timeout::{CancelToken, TimeoutConfig};
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// A tool to run: a display name, the program and its arguments.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub name: String,
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// How a tool run ended.
#[derive(Debug)]
pub enum ToolRun {
    /// The process exited (any status); output is captured.
    Completed(Output),
    /// The program does not exist.
    NotFound,
    /// Launch failure other than not-found, timeout or cancellation.
    Failed(String),
}

/// Run `inv` with stdin closed and output captured, bounded by `limit` and
/// `cancel`. On timeout or cancellation the child is killed.
pub async fn run_tool(inv: &ToolInvocation, cancel: &CancelToken, limit: Duration) -> ToolRun {
    let mut cmd = Command::new(&inv.program);
    cmd.args(&inv.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("launching {} ({:?})", inv.name, inv.program);
    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return ToolRun::NotFound,
        Err(e) => return ToolRun::Failed(e.to_string()),
    };

    let name = inv.name.clone();
    let config = TimeoutConfig::with_duration(limit, inv.name.clone());
    let wait = async move {
        child
            .wait_with_output()
            .await
            .map_err(|e| ScanError::engine(name, e.to_string()))
    };
    match cancel.run(config, wait).await {
        Ok(output) => ToolRun::Completed(output),
        Err(e) => ToolRun::Failed(e.to_string()),
    }
}
