//! hotfix-verify CLI
//!
//! Audits node fee numerators and checks the deployed hotfix contract.

use anyhow::{Context, Result};
use clap::Parser;
use hotfix_verify::config::{self, AuditConfig, Deployment, Network};
use hotfix_verify::{driver, report, Address};
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "hotfix-verify")]
#[command(about = "Verify the fee distributor hotfix against recomputed node fee numerators")]
struct Cli {
    /// Network to audit (goerli or mainnet)
    #[arg(long, env = "NETWORK", default_value = "goerli")]
    network: Network,
    /// JSON-RPC endpoint URL
    #[arg(long, env = "ETH_RPC")]
    rpc: String,
    /// Hotfix contract address (required on mainnet)
    #[arg(long, env = "HOTFIX_ADDRESS")]
    hotfix: Option<Address>,
    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
    /// Print progress every N nodes (0 disables)
    #[arg(long, default_value_t = 100)]
    progress_every: u64,
    /// Nodes checked concurrently
    #[arg(long, default_value_t = 1)]
    concurrency: usize,
    /// Print a JSON summary instead of the human report
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Before the filter is built, so `.env` may set RUST_LOG
    let env_file = config::load_dotenv().context("failed to load .env")?;

    tracing_subscriber::fmt()
        .with_env_filter(config::env_log_filter())
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = env_file {
        tracing::debug!(path = %path.display(), "loaded env file");
    }

    let cli = Cli::parse();

    let deployment = Deployment::for_network(cli.network, cli.hotfix)?;
    let mut config = AuditConfig::new(deployment, &cli.rpc, Duration::from_secs(cli.timeout_secs))?;
    config.progress_every = cli.progress_every;
    config.concurrency = cli.concurrency.max(1);

    let hotfix = config.deployment.hotfix;
    let validation = driver::run(&config)
        .await
        .with_context(|| format!("audit against {} failed", config.rpc.url))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report::json_summary(&validation, &hotfix))?);
    } else {
        report::print(&validation, &hotfix);
        println!("Done");
    }

    Ok(if validation.is_verified() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
