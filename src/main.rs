mod cli;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use tls_posture::engine::Engine;
use tls_posture::notify::{notify_alerts, LogNotifier};
use tls_posture::output::OutputChannel;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = cli.into_config()?;

    let entries = tls_posture::input::load_targets(&cfg)
        .await
        .context("failed to load targets")?;
    let engine = Engine::new(&cfg)?;
    let results = engine.run(entries).await?;

    let sink = OutputChannel::new(cfg.output.clone())?;
    sink.emit_all(&results).await?;
    sink.shutdown().await?;

    notify_alerts(&LogNotifier, &results).await?;

    Ok(())
}
