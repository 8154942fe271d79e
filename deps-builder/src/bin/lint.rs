use clap::Parser;
use fm_core::{init_tracing, LogLevel, TracingConfig};
use fm_deps::lint::{run_lint, LintConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

/// Run cppcheck over a source tree and echo its report while it runs.
#[derive(Parser, Debug)]
#[command(name = "fm-lint", version, about)]
struct Args {
    /// Source tree to lint
    #[arg(long, default_value = "src")]
    source: PathBuf,

    /// Report file the linter writes
    #[arg(long, default_value = "cppcheck.log")]
    log: PathBuf,

    /// Linter executable
    #[arg(long, default_value = "cppcheck")]
    linter: String,

    /// Log polling interval in milliseconds
    #[arg(long, default_value_t = 200)]
    poll_ms: u64,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Extra linter arguments (after `--`)
    #[arg(last = true)]
    linter_args: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&TracingConfig::default().with_level(LogLevel::from_verbosity(args.verbose, 0)));

    let mut config = LintConfig::cppcheck(&args.source, &args.log);
    config.linter = args.linter;
    config.poll_interval = Duration::from_millis(args.poll_ms);
    if !args.linter_args.is_empty() {
        config.extra_args = args.linter_args;
    }

    match run_lint(&config, |line| println!("{line}")) {
        Ok(summary) => {
            info!("{} files, {} report lines", summary.files, summary.lines);
            match summary.exit_code {
                Some(0) => ExitCode::SUCCESS,
                Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
                None => ExitCode::FAILURE,
            }
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
