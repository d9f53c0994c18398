use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use filerisk::logging::{init_tracing, init_tracing_json};
use filerisk::{ScanConfig, ScanOutput, ScanRequest, Scanner};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "filerisk",
    about = "Static file triage: prints a JSON risk report for one file",
    version
)]
struct Args {
    /// File to scan
    file_path: PathBuf,

    /// Name to report the file under (defaults to the file name)
    file_name: Option<String>,

    /// Rule file for the rule-matching engine
    #[arg(long)]
    rules: Option<PathBuf>,

    /// JSON configuration file (partial documents are fine)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs on stderr as JSON
    #[arg(long)]
    json_logs: bool,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,
}

fn build_scanner(args: &Args) -> anyhow::Result<Scanner> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::from_json_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => ScanConfig::default(),
    };
    if let Some(rules) = &args.rules {
        config.engines.rules_path = rules.clone();
    }
    Scanner::new(config).context("invalid configuration")
}

fn emit(output: &ScanOutput, pretty: bool) {
    match output.to_json_string(pretty) {
        Ok(json) => println!("{}", json),
        Err(e) => println!("{}", serde_json::json!({ "error": e.to_string() })),
    }
}

// The exit status is always zero: callers read the verdict from stdout.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let message = e.to_string();
            let first = message.lines().next().unwrap_or("invalid arguments");
            emit(
                &ScanOutput::failure(format!(
                    "{} (usage: filerisk <file_path> [file_name])",
                    first.trim_start_matches("error: ")
                )),
                false,
            );
            return ExitCode::SUCCESS;
        }
    };

    if args.json_logs {
        init_tracing_json();
    } else {
        init_tracing();
    }

    let request = match &args.file_name {
        Some(name) => ScanRequest::new(&args.file_path, name.clone()),
        None => ScanRequest::from_path(&args.file_path),
    };
    let output = match build_scanner(&args) {
        Ok(scanner) => scanner.scan_to_output(&request).await,
        Err(e) => ScanOutput::failure(format!("{:#}", e)),
    };
    emit(&output, args.pretty);
    ExitCode::SUCCESS
}
