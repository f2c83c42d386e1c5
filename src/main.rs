use anyhow::Context;
use arbiter::rest;
use clap::Parser;
use std::{path::PathBuf, sync::Arc, time::Duration};

/// Submission-judging orchestrator for the coding-challenge platform.
#[derive(Parser)]
struct Args {
    /// Port that the service should listen on
    #[clap(long, default_value = "1789")]
    port: u16,
    /// Base URL of the execution sandbox
    #[clap(long, default_value = "https://judge0-extra-ce.p.rapidapi.com")]
    sandbox_url: String,
    /// Directory containing per-problem expected outputs
    #[clap(long, default_value = "problems")]
    problems_dir: PathBuf,
    /// Path to the submission ledger database
    #[clap(long, default_value = "submissions.db")]
    ledger_path: PathBuf,
    /// Seconds an in-flight evaluation stays pollable
    #[clap(long, default_value = "1800")]
    cache_ttl: u64,
}

async fn create_state(args: &Args) -> anyhow::Result<rest::State> {
    let api_key = std::env::var("JUDGE0_API_KEY").context("JUDGE0_API_KEY is not set")?;
    let api_host = std::env::var("JUDGE0_API_HOST").context("JUDGE0_API_HOST is not set")?;
    let ledger = ledger::Ledger::open(&args.ledger_path)
        .await
        .context("failed to open submission ledger")?;
    Ok(rest::State {
        cache: eval_cache::EvalCache::new(Duration::from_secs(args.cache_ttl)),
        sandbox: sandbox_client::Client::new(args.sandbox_url.clone(), api_key, api_host),
        outputs: output_store::Store::new(args.problems_dir.clone()),
        ledger,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args: Args = Args::parse();
    let state = create_state(&args)
        .await
        .context("failed to initialize service state")?;
    tracing::info!("Running REST API");
    let cfg = rest::RestConfig { port: args.port };
    rest::serve(cfg, Arc::new(state)).await?;
    Ok(())
}
