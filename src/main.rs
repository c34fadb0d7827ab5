//! mining-pool-monitor entry point.
//!
//! Sets up logging and configuration, then dispatches the subcommand.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mining_pool_monitor::cli::{self, Cli, Command};
use mining_pool_monitor::config::MonitorConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = MonitorConfig::from_env()?;

    // Initialize tracing; stdout is reserved for command output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Command::Run { pool } => {
            let failed = cli::run_cycles(&config, pool.as_deref()).await?;
            if failed > 0 {
                anyhow::bail!("{failed} pool cycle(s) failed");
            }
        }
        Command::Serve => cli::serve(&config).await?,
        Command::Pools { action } => cli::run_pools(&config, action).await?,
        Command::Stats => cli::run_stats(&config).await?,
    }

    Ok(())
}
