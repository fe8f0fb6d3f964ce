//! loom-cli: a thin external collaborator over the `loom-daemon`
//! programmatic `Stream` API (spec.md §6). It starts the scheduler in
//! its own process and gives the user a live-coding REPL on top of it;
//! it does not re-implement any dispatch logic of its own.

mod commands;
mod repl;

use anyhow::{Context, Result};
use clap::Parser;
use loom_conf::LoomConfig;
use loom_daemon::Stream;
use owo_colors::OwoColorize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// loom: a live-coded pattern scheduler
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a loom.toml config file, overriding discovery
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Run one command non-interactively and exit instead of opening a REPL
    #[arg(short = 'e', long = "eval")]
    eval: Option<String>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let cli = Cli::parse();

    let config = LoomConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    let targets = config.targets.clone();

    info!(targets = targets.len(), "connecting to playback targets");
    let stream = Stream::start(config, targets).context("failed to start the scheduler")?;

    println!("{}", "loom".bright_cyan().bold());

    if let Some(line) = cli.eval {
        commands::run_line(&stream, &line);
        stream.shutdown();
        return Ok(());
    }

    repl::run(&stream);
    stream.shutdown();
    Ok(())
}
