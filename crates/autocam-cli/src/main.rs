use anyhow::{Context, Result, bail};
use autocam_nav::{CameraState, NavSettings, NavigationEngine, ViewDirections};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

mod script;

use script::{ReplayReport, ScriptStep};

const MAX_FRAMES: usize = 100_000;

#[derive(Parser)]
#[command(name = "autocam")]
#[command(about = "Headless driver for the autocam navigation engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Align(AlignArgs),
    Replay(ReplayArgs),
    Check(CheckArgs),
}

#[derive(Args)]
struct AlignArgs {
    #[arg(long)]
    dir: String,
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long, default_value_t = 60.0)]
    fps: f64,
}

#[derive(Args)]
struct ReplayArgs {
    #[arg(long)]
    script: PathBuf,
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(Args)]
struct CheckArgs {
    #[arg(long)]
    settings: PathBuf,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Align(args) => align(args),
        Command::Replay(args) => replay(args),
        Command::Check(args) => check(args),
    }
}

fn align(args: AlignArgs) -> Result<()> {
    if !args.fps.is_finite() || args.fps <= 0.0 {
        bail!("--fps must be a positive number, got {}", args.fps);
    }
    let directions: ViewDirections = args
        .dir
        .parse()
        .with_context(|| format!("invalid --dir {:?}", args.dir))?;
    let settings = load_settings(args.settings.as_deref())?;
    let mut engine = NavigationEngine::new(CameraState::default(), settings);

    if !engine.align_to(directions) {
        bail!("alignment to {directions} was not started");
    }
    let frames = run_to_completion(&mut engine, 1.0 / args.fps)?;
    info!(%directions, frames, "alignment complete");
    println!("{}", serde_json::to_string_pretty(&engine.current_view())?);
    Ok(())
}

fn replay(args: ReplayArgs) -> Result<()> {
    let settings = load_settings(args.settings.as_deref())?;
    let text = std::fs::read_to_string(&args.script)
        .with_context(|| format!("failed to read script {}", args.script.display()))?;
    let steps: Vec<ScriptStep> = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse script {}", args.script.display()))?;

    let mut engine = NavigationEngine::new(CameraState::default(), settings);
    script::run(&mut engine, &steps)?;
    info!(steps = steps.len(), "replay complete");
    let report = ReplayReport::from_engine(&engine);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn check(args: CheckArgs) -> Result<()> {
    let settings = load_settings(Some(&args.settings))?;
    settings
        .validate()
        .with_context(|| format!("{} is not valid", args.settings.display()))?;
    info!(path = %args.settings.display(), "settings are valid");
    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<NavSettings> {
    let Some(path) = path else {
        return Ok(NavSettings::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse settings {}", path.display()))
}

pub(crate) fn run_to_completion(engine: &mut NavigationEngine, dt: f64) -> Result<usize> {
    let mut frames = 0;
    while engine.is_transition_running() {
        if frames >= MAX_FRAMES {
            bail!("transition did not finish within {MAX_FRAMES} frames");
        }
        engine.tick(dt);
        frames += 1;
    }
    Ok(frames)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
