//! Headless encounter simulator entry point.
mod cli;
mod report;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use runtime::{BrawlerController, IdleController, Runtime, Topic};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cli::{Args, EventFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = setup_logging(args.log_file.as_deref())?;
    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let combat = args.load_config()?;
    let catalog = args.load_catalog()?;

    let builder = Runtime::builder()
        .combat_config(combat)
        .catalog(catalog)
        .seed(args.seed);
    let mut runtime = if args.idle {
        builder.player_controller(IdleController)
    } else {
        builder.player_controller(BrawlerController::default())
    }
    .build()
    .await?;

    let topics: &[Topic] = match args.events {
        EventFilter::None => &[],
        EventFilter::Encounter => &[Topic::Encounter],
        EventFilter::All => &[Topic::Combat, Topic::Encounter],
    };
    let printers: Vec<_> = runtime
        .handle()
        .subscribe_multiple(topics)
        .into_values()
        .map(|rx| tokio::spawn(report::print_events(rx, args.format)))
        .collect();

    let mut snapshot = runtime.start().await?;
    tracing::info!(seed = args.seed, max_ticks = args.ticks, "encounter running");
    let deadline = args.ticks;
    while snapshot.player.alive
        && snapshot.tick.0 < deadline
        && args.waves.is_none_or(|waves| snapshot.wave <= waves)
    {
        let remaining = deadline - snapshot.tick.0;
        let ticks = u32::try_from(remaining)
            .map_or(args.ticks_per_step, |remaining| remaining.min(args.ticks_per_step))
            .max(1);
        snapshot = runtime.step(ticks).await?;
    }

    runtime.shutdown().await?;
    for printer in printers {
        printer.await.context("event printer panicked")?;
    }
    report::print_summary(&snapshot);
    Ok(())
}

/// Logs go to stderr, and to `log_file` as well when given.
fn setup_logging(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("log file path {} has no file name", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}
