use anyhow::Context;
use clap::Parser;
use fm_core::{init_tracing, LogLevel, TracingConfig};
use fm_credits::{gather, render_json, render_text, GitCli, ScorerConfig};
use std::path::PathBuf;
use tracing::info;

/// Rank Freeminer contributors from git history.
#[derive(Parser, Debug)]
#[command(name = "gather-git-credits", version, about)]
struct Args {
    /// JSON settings file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Repository to read [default: .]
    #[arg(long)]
    repo: Option<PathBuf>,

    /// Report file [default: results.txt]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Recent window, active contributors [default: 5.11.0..HEAD]
    #[arg(long)]
    active_revs: Option<String>,

    /// All-time window, previous contributors [default: HEAD]
    #[arg(long)]
    previous_revs: Option<String>,

    /// Refuse histories with fewer commits than this [default: 11000]
    #[arg(long)]
    min_commits: Option<usize>,

    /// Write JSON instead of the plain-text list
    #[arg(long)]
    json: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&TracingConfig::default().with_level(LogLevel::from_verbosity(args.verbose, 0)));

    let mut config = match &args.config {
        Some(path) => ScorerConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ScorerConfig::default(),
    };
    if let Some(repo) = args.repo {
        config.repo = repo;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(revs) = args.active_revs {
        config.active_revs = revs;
    }
    if let Some(revs) = args.previous_revs {
        config.previous_revs = revs;
    }
    if let Some(min) = args.min_commits {
        config.min_commits = min;
    }

    let ranking = gather(&GitCli::new(&config.repo), &config)?;
    let report = if args.json {
        render_json(&ranking, config.active_cutoff, config.previous_cutoff)
    } else {
        render_text(&ranking, config.previous_cutoff)
    };
    std::fs::write(&config.output, report)
        .with_context(|| format!("writing {}", config.output.display()))?;

    info!(
        "{} active, {} previous contributors written to {}",
        ranking.active.len(),
        ranking.previous.len(),
        config.output.display()
    );
    Ok(())
}
