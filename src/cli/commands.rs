//! Command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::container::AppContainer;
use crate::cli::args::{ClipArgs, DeliveryArgs, JoinArgs, ProbeArgs, ProgressFormat};
use crate::cli::progress::{sinks, ConsoleProgress, JsonProgress};
use crate::cli::Commands;
use crate::domain::model::{ClipName, ClipRequest, ClipSource, Timeline};
use crate::utils::time::format_hms;

/// Token cancelled on the first Ctrl-C
pub fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            token.cancel();
        }
    });
    cancel
}

/// Dispatch a parsed command
pub async fn run(container: &dyn AppContainer, command: Commands, cancel: CancellationToken) -> Result<()> {
    match command {
        Commands::Clip(args) => clip(container, args, &cancel).await,
        Commands::Join(args) => join(container, args, &cancel).await,
        Commands::Probe(args) => probe(container, args, &cancel).await,
    }
}

/// Execute the clip command
pub async fn clip(container: &dyn AppContainer, args: ClipArgs, cancel: &CancellationToken) -> Result<()> {
    let timelines = match &args.timelines {
        Some(path) => load_timelines(path)?,
        None => vec![Timeline::from_segments(args.segments.clone())],
    };
    info!(
        input = %args.input.display(),
        timelines = timelines.len(),
        "Starting clip operation"
    );

    let source = ClipSource::Timelines {
        source: args.input.clone(),
        timelines,
    };
    deliver(container, source, &args.delivery, cancel).await
}

/// Execute the join command
pub async fn join(container: &dyn AppContainer, args: JoinArgs, cancel: &CancellationToken) -> Result<()> {
    info!(files = args.files.len(), "Starting join operation");
    let source = ClipSource::Files(args.files.clone());
    deliver(container, source, &args.delivery, cancel).await
}

/// Execute the probe command
pub async fn probe(container: &dyn AppContainer, args: ProbeArgs, cancel: &CancellationToken) -> Result<()> {
    let probe = container.probe_port();
    for file in &args.files {
        let duration = probe
            .probe_duration(file, cancel)
            .await
            .with_context(|| format!("Failed to probe {}", file.display()))?;
        println!("{}\t{}", file.display(), format_hms(duration));
    }
    Ok(())
}

/// Read a JSON list of timelines, each a list of `{start, end, speed, zoom}`
pub fn load_timelines(path: &Path) -> Result<Vec<Timeline>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read timelines from {}", path.display()))?;
    let timelines: Vec<Timeline> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid timelines file {}", path.display()))?;
    Ok(timelines)
}

async fn deliver(
    container: &dyn AppContainer,
    source: ClipSource,
    delivery: &DeliveryArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let config = container.config();
    let library_dir: PathBuf = delivery
        .library_dir
        .clone()
        .unwrap_or_else(|| config.output.library_dir.clone());

    let request = ClipRequest {
        source,
        clip_name: delivery.name.clone(),
        encoder: delivery.encoder,
        force_widescreen: delivery.widescreen,
        destination: delivery.destination,
        library_dir: library_dir.clone(),
    };

    let (encode_sink, upload_sink) = sinks(delivery.progress);
    let result = container
        .clip_interactor()
        .clip_and_upload(&request, encode_sink, upload_sink, cancel)
        .await;

    match delivery.progress {
        ProgressFormat::Plain => ConsoleProgress::finish(),
        ProgressFormat::Json => {
            let outcome = match &result {
                Ok(_) => "complete",
                Err(e) if e.is_cancelled() => "cancel",
                Err(_) => "error",
            };
            eprintln!("{}", JsonProgress::event(outcome, serde_json::json!({})));
        }
        ProgressFormat::Quiet => {}
    }

    let remote_id = result.context("Clip operation failed")?;
    let name = ClipName::new(&delivery.name)?;
    match config.share_location(delivery.destination, name.as_str(), &remote_id, &library_dir) {
        Some(location) => println!("{}", location),
        None if !remote_id.is_empty() => println!("{}", remote_id),
        None => {}
    }
    info!(destination = %delivery.destination, "Clip delivered");
    Ok(())
}
