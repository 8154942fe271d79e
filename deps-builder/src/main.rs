use anyhow::Context;
use clap::Parser;
use fm_core::{
    init_tracing, init_tracing_default, BuildMode, CompletionCheck, LogLevel, OrchestratorConfig,
    ToolchainProfile,
};
use fm_deps::{
    catalog, project, toolchain, BuildError, HttpAcquirer, Layout, Orchestrator, ProcessRunner,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Build Freeminer's Windows dependencies, then Freeminer itself.
#[derive(Parser, Debug)]
#[command(name = "fm-deps", version, about)]
struct Args {
    /// `debug` for a Debug build; anything else builds Release
    mode: Option<String>,

    /// Toolchain profile: vs2013 or vs2015
    #[arg(long, value_parser = parse_profile)]
    profile: Option<ToolchainProfile>,

    /// Build directory holding deps/, project/ and install_tmp/
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Freeminer source tree (defaults to two levels above the root)
    #[arg(long)]
    source: Option<PathBuf>,

    /// RON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trust any existing dependency directory, stamp or not
    #[arg(long)]
    trust_existing: bool,

    /// Stop after the dependencies
    #[arg(long)]
    skip_project: bool,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Less output (-q warn, -qq error)
    #[arg(short, long, action = clap::ArgAction::Count)]
    quiet: u8,
}

fn parse_profile(name: &str) -> Result<ToolchainProfile, String> {
    ToolchainProfile::from_name(name).ok_or_else(|| format!("unknown profile `{name}`"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // no-op when the configured subscriber is already installed
            init_tracing_default();
            error!("{:#}", e);
            match e.downcast_ref::<BuildError>() {
                Some(build) if build.is_preflight() => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => OrchestratorConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => OrchestratorConfig::default(),
    };
    if let Some(profile) = args.profile {
        config.profile = profile;
    }
    if args.source.is_some() {
        config.source_dir = args.source.clone();
    }
    if args.trust_existing {
        config.completion = CompletionCheck::Directory;
    }

    let mut logging = config.logging.clone();
    if args.verbose > 0 || args.quiet > 0 {
        logging = logging.with_level(LogLevel::from_verbosity(args.verbose, args.quiet));
    }
    init_tracing(&logging);
    debug!("Configuration: {}", config.to_json());

    let mode = BuildMode::from_cli_hint(args.mode.as_deref());
    info!("Build type: {}, profile: {}", mode, config.profile.as_str());

    let path_var = std::env::var_os("PATH").unwrap_or_default();
    toolchain::preflight(&toolchain::required_tools(config.profile), &path_var)?;

    let root = std::path::absolute(&args.root)
        .with_context(|| format!("resolving {}", args.root.display()))?;
    let layout = Layout::new(root, config.source_dir.clone());
    info!("Dependencies go to {}", layout.deps.display());

    let orchestrator = Orchestrator::new(
        layout.clone(),
        mode,
        config.completion,
        Arc::new(HttpAcquirer::new()?),
        Arc::new(ProcessRunner),
    );

    let deps = catalog(config.profile, mode, config.fetch_nuget_packages);
    orchestrator.ensure_all(&deps).await?;

    if args.skip_project {
        info!("Skipping main project");
        return Ok(());
    }

    orchestrator
        .build_project(&project::project_steps(&config, mode, &layout))
        .await?;
    info!("Freeminer {} build finished in {}", mode, layout.project.display());
    Ok(())
}
