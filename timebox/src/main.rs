//! timebox - run a command with a deadline
//!
//! Runs the given program through a bounded call executor and prints the
//! outcome as JSON. A timed-out program is not killed; timebox just stops
//! waiting for it and exits.

mod command;
mod report;

use anyhow::Context;
use bounded_call::{BoundedCallExecutor, ExecutorConfig, Value};
use clap::Parser;
use command::CommandOperation;
use report::{exit_code, Report};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit code for usage and setup errors.
const EXIT_USAGE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "timebox", version, about = "Run a command with a deadline")]
struct Cli {
    /// Deadline in milliseconds (0 checks once without waiting)
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// JSON executor configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// Program to run, followed by its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the report
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("timebox: {err:#}");
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            ExecutorConfig::from_json(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => ExecutorConfig::default(),
    };

    let timeout_ms = cli.timeout_ms.unwrap_or(config.default_timeout_ms);
    let (program, args) = cli
        .command
        .split_first()
        .context("no command given")?;
    let input_args: Vec<Value> = args.iter().cloned().map(Value::String).collect();

    tracing::info!(program = %program, timeout_ms, "running command");

    let mut executor = BoundedCallExecutor::with_config(config);
    let result = executor.invoke(timeout_ms, CommandOperation::new(program.as_str()), input_args)?;

    let report = Report::from_result(&result);
    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    Ok(exit_code(result.outcome()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_trailing_command() {
        let cli = Cli::try_parse_from(["timebox", "-t", "250", "--", "sleep", "-x", "1"]).unwrap();

        assert_eq!(cli.timeout_ms, Some(250));
        assert_eq!(cli.command, vec!["sleep", "-x", "1"]);
        assert!(!cli.pretty);
    }

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["timebox", "--timeout-ms", "5"]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_times_out() {
        let cli = Cli::try_parse_from(["timebox", "-t", "50", "sleep", "2"]).unwrap();
        assert_eq!(run(cli).unwrap(), report::EXIT_TIMED_OUT);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_passes_exit_status() {
        let cli = Cli::try_parse_from(["timebox", "-t", "5000", "sh", "-c", "exit 4"]).unwrap();
        assert_eq!(run(cli).unwrap(), 4);
    }

    #[test]
    fn test_run_missing_config() {
        let cli = Cli::try_parse_from(["timebox", "-c", "/nonexistent/timebox.json", "true"]).unwrap();
        let err = run(cli).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }
}
