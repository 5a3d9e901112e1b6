mod cli;
mod config;
mod logging;
mod progress;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rangefetch::{Downloader, FileSink};
use tracing::info;

use crate::cli::Args;
use crate::config::Config;
use crate::progress::ProgressTracker;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = logging::init(args.verbose) {
        eprintln!("warning: {err}");
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let url = args.target().context("no URL given")?.clone();
    let config = Config::load(&args).context("failed to load configuration")?;

    let mut options = config.download_options();
    options.validate().context("invalid download options")?;
    let client = config.client().context("failed to build HTTP client")?;

    let sink = Arc::new(
        FileSink::create(&args.out)
            .with_context(|| format!("failed to create {}", args.out.display()))?,
    );

    if !args.no_progress {
        let name = args
            .out
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download".to_string());
        options = options.on_progress(ProgressTracker::new(&name).callback());
    }

    Downloader::new(client)
        .with_options(options)
        .download(&url, sink.clone())
        .await
        .with_context(|| format!("failed to download {url}"))?;

    sink.sync_all()
        .with_context(|| format!("failed to flush {}", args.out.display()))?;
    info!(path = %args.out.display(), "saved {url}");
    Ok(())
}
