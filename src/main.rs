// src/main.rs

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use site_analyzer::{lifecycle, EngineConfig, SiteAnalyzer};

/// Analyze a single web page and print the result as JSON.
#[derive(Parser, Debug)]
#[command(name = "site-analyzer")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Absolute http(s) URL of the page to analyze
    url: String,

    /// Pretty-print the JSON output
    #[arg(long, short)]
    pretty: bool,

    /// Skip PageSpeed Insights and start telemetry at the latency probe
    #[arg(long)]
    no_pagespeed: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    lifecycle::init_logging();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = EngineConfig::from_env().context("Invalid configuration")?;
    if args.no_pagespeed {
        config.pagespeed_enabled = false;
    }

    let analyzer = SiteAnalyzer::from_config(&config).context("Failed to initialize analyzer")?;
    let result = analyzer
        .analyze(&args.url)
        .await
        .with_context(|| format!("Analysis of {} failed", args.url))?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .context("Failed to serialize result")?;

    println!("{json}");
    Ok(())
}
