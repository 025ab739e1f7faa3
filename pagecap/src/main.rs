//! pagecap binary.
//!
//! Takes one JSON capture configuration, drives a headless browser, and
//! writes the base64-encoded screenshot as a single line on stdout.
//! All diagnostics go to stderr; any fatal error exits with status 1.

use anyhow::Context;
use clap::Parser;
use pagecap_core::{CaptureConfig, SessionOptions};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "pagecap", about = "Headless browser screenshot tool")]
struct Cli {
    /// JSON capture configuration (see CaptureConfig for the fields)
    config: Option<String>,

    /// Read the JSON configuration from a file instead of the argument
    #[clap(long, conflicts_with = "config")]
    config_file: Option<PathBuf>,

    /// Custom Chrome/Chromium binary path
    #[clap(long)]
    browser_path: Option<String>,

    /// Connect to an already-running browser via CDP URL
    #[clap(long)]
    cdp_url: Option<String>,
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let payload = match (cli.config, cli.config_file) {
        (Some(payload), _) => payload,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?,
        (None, None) => anyhow::bail!("missing capture configuration (argument or --config-file)"),
    };

    let config = CaptureConfig::from_json(&payload)?;
    let options = SessionOptions {
        browser_path: cli.browser_path,
        cdp_url: cli.cdp_url,
    };

    let image = pagecap_core::capture::run(&config, &options).await?;

    // stdout carries exactly the payload; everything else is on stderr
    println!("{}", image);
    Ok(())
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
