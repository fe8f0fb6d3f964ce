//! loom-daemon binary: loads configuration, connects to every
//! configured playback target, and runs the tick loop and control
//! port until interrupted.

use anyhow::Result;
use loom_conf::LoomConfig;
use loom_daemon::Stream;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("loom-daemon {} starting", env!("CARGO_PKG_VERSION"));

    let config = LoomConfig::load()?;
    info!(targets = config.targets.len(), control_port = config.control_port, "configuration loaded");

    let targets = config.targets.clone();
    let stream = Stream::start(config, targets)?;

    ctrlc_wait();

    info!("shutting down");
    stream.shutdown();
    Ok(())
}

/// Block the main thread until interrupted, the way a long-running
/// daemon binary is expected to.
fn ctrlc_wait() {
    let (tx, rx) = std::sync::mpsc::channel();
    let _ = ctrlc::set_handler(move || {
        let _ = tx.send(());
    });
    let _ = rx.recv();
}
