//! Command-line surface of the `mining-pool-monitor` binary.
//!
//! Argument parsing uses `clap` derive; each subcommand has an async runner
//! here so the binary only sets up logging and dispatches.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::api;
use crate::app_state::AppState;
use crate::config::{MonitorConfig, PoolConfig, PoolsFile};
use crate::domain::{PoolId, PoolIdentity, PoolUpdate};
use crate::error::MonitorError;
use crate::extract::{Extractor, HttpPageSource, Vocabulary};
use crate::persistence::SqliteStore;
use crate::remote::PostgrestClient;
use crate::service::{PoolPipeline, PoolTarget, Synchronizer};

/// Scrapes mining pool observer dashboards into SQLite and mirrors them
/// to a PostgREST backend.
#[derive(Debug, Parser)]
#[command(name = "mining-pool-monitor", version, about)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one scrape cycle for every active pool, or for one pool.
    Run {
        /// Only run this pool (active or not).
        #[arg(long)]
        pool: Option<String>,
    },
    /// Serve the read-only query API.
    Serve,
    /// Manage the pool directory.
    Pools {
        /// Pool administration action.
        #[command(subcommand)]
        action: PoolsCommand,
    },
    /// Print row counts of the local store.
    Stats,
}

/// Pool administration actions.
#[derive(Debug, Subcommand)]
pub enum PoolsCommand {
    /// List registered pools.
    List {
        /// Only list active pools.
        #[arg(long)]
        active_only: bool,
    },
    /// Show one pool.
    Show {
        /// Pool id.
        pool_id: String,
    },
    /// Register a new pool.
    Add {
        /// Pool id.
        pool_id: String,
        /// Observer dashboard URL.
        #[arg(long)]
        observer_url: String,
        /// Descriptive metadata.
        #[command(flatten)]
        fields: PoolFields,
        /// Register the pool as inactive.
        #[arg(long)]
        inactive: bool,
    },
    /// Change metadata of an existing pool.
    Update {
        /// Pool id.
        pool_id: String,
        /// New observer dashboard URL.
        #[arg(long)]
        observer_url: Option<String>,
        /// Descriptive metadata to change.
        #[command(flatten)]
        fields: PoolFields,
    },
    /// Resume scraping a pool.
    Activate {
        /// Pool id.
        pool_id: String,
    },
    /// Stop scraping a pool without deleting its data.
    Deactivate {
        /// Pool id.
        pool_id: String,
    },
    /// Delete a pool and all of its data.
    Delete {
        /// Pool id.
        pool_id: String,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    /// Write the pool directory as a pools JSON file.
    Export {
        /// Output path; defaults to the configured pools file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Optional descriptive pool fields shared by `add` and `update`.
#[derive(Debug, Clone, Default, Args)]
pub struct PoolFields {
    /// Display name.
    #[arg(long)]
    pub name: Option<String>,
    /// Client the pool belongs to.
    #[arg(long)]
    pub client: Option<String>,
    /// Country.
    #[arg(long)]
    pub country: Option<String>,
    /// Owning company.
    #[arg(long)]
    pub company: Option<String>,
    /// Physical location.
    #[arg(long)]
    pub location: Option<String>,
    /// Contact email.
    #[arg(long)]
    pub email: Option<String>,
    /// Tag; repeat for several. Replaces the tag list on update.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

impl PoolFields {
    fn into_update(self, observer_url: Option<String>) -> PoolUpdate {
        PoolUpdate {
            pool_name: self.name,
            observer_url,
            client_name: self.client,
            country: self.country,
            company: self.company,
            location: self.location,
            contact_email: self.email,
            tags: (!self.tags.is_empty()).then_some(self.tags),
            active: None,
        }
    }
}

/// Opens the configured store.
///
/// # Errors
///
/// Returns [`MonitorError::Persistence`] if the database cannot be opened.
pub async fn open_store(config: &MonitorConfig) -> Result<SqliteStore, MonitorError> {
    SqliteStore::connect(
        &config.database_url,
        config.database_max_connections,
        Duration::from_secs(config.database_connect_timeout_secs),
    )
    .await
}

/// Runs `run`: registers the pools file, then one cycle per selected pool.
///
/// Returns the number of failed cycles.
///
/// # Errors
///
/// Returns an error if setup fails (store, page supplier, remote client)
/// or if `--pool` names an unknown pool.
pub async fn run_cycles(config: &MonitorConfig, only: Option<&str>) -> anyhow::Result<usize> {
    let store = open_store(config).await?;

    let pool_configs =
        PoolsFile::load_or_env(&config.pools_config_path, config.env_pool.as_ref()).await;
    for pool in &pool_configs {
        store.register_pool(&pool.to_identity()).await?;
    }
    let by_id: HashMap<&str, &PoolConfig> = pool_configs
        .iter()
        .map(|p| (p.pool_id.as_str(), p))
        .collect();

    let records = match only {
        Some(id) => vec![store.get_pool(&PoolId::new(id)).await?],
        None => store.list_pools(true).await?,
    };
    if records.is_empty() {
        tracing::warn!(path = %config.pools_config_path.display(), "no active pools to scrape");
        return Ok(0);
    }
    let targets: Vec<PoolTarget> = records
        .into_iter()
        .map(|record| {
            let file_entry = by_id.get(record.identity.pool_id.as_str()).copied();
            PoolTarget::new(record, file_entry)
        })
        .collect();

    let source = HttpPageSource::new(Duration::from_secs(config.page_timeout_secs))?;
    let synchronizer = match &config.remote {
        Some(remote) => {
            let client = PostgrestClient::new(remote)?;
            Some(Synchronizer::new(store.clone(), Arc::new(client)))
        }
        None => {
            tracing::info!("remote sync disabled");
            None
        }
    };
    let pipeline = PoolPipeline::new(
        Arc::new(source),
        Extractor::new(Vocabulary::default()),
        store,
        synchronizer,
    );

    let results = pipeline.run_all(&targets, config.max_concurrent_pools).await;
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    for (pool_id, result) in &results {
        match result {
            Ok(report) => tracing::info!(
                pool_id = %pool_id,
                run_id = %report.run_id,
                workers = report.persisted.workers_written,
                earnings = report.persisted.earnings_written,
                anomalies = report.anomalies.len(),
                sync_complete = report.sync.as_ref().map(|s| s.is_complete()),
                "pool done"
            ),
            Err(e) => tracing::error!(pool_id = %pool_id, error = %e, "pool failed"),
        }
    }
    tracing::info!(pools = results.len(), failed, "run finished");
    Ok(failed)
}

/// Runs `serve` until the process is stopped.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the address cannot be
/// bound.
pub async fn serve(config: &MonitorConfig) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let app = api::build_app(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Runs a `pools` action, printing results as JSON.
///
/// # Errors
///
/// Returns an error if the store fails, the pool does not exist, or
/// `delete` is missing `--yes`.
pub async fn run_pools(config: &MonitorConfig, action: PoolsCommand) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    match action {
        PoolsCommand::List { active_only } => print_json(&store.list_pools(active_only).await?),
        PoolsCommand::Show { pool_id } => print_json(&store.get_pool(&PoolId::new(pool_id)).await?),
        PoolsCommand::Add {
            pool_id,
            observer_url,
            fields,
            inactive,
        } => {
            let mut identity = PoolIdentity {
                pool_id: PoolId::new(pool_id),
                pool_name: String::new(),
                observer_url: String::new(),
                client_name: String::new(),
                country: String::new(),
                company: String::new(),
                location: String::new(),
                contact_email: String::new(),
                tags: Vec::new(),
                active: !inactive,
            };
            fields.into_update(Some(observer_url)).apply(&mut identity);
            print_json(&store.add_pool(&identity).await?)
        }
        PoolsCommand::Update {
            pool_id,
            observer_url,
            fields,
        } => {
            let update = fields.into_update(observer_url);
            if update.is_empty() {
                return Err(MonitorError::InvalidRequest("nothing to update".into()).into());
            }
            print_json(&store.update_pool(&PoolId::new(pool_id), update).await?)
        }
        PoolsCommand::Activate { pool_id } => {
            store.set_active(&PoolId::new(pool_id), true).await?;
            Ok(())
        }
        PoolsCommand::Deactivate { pool_id } => {
            store.set_active(&PoolId::new(pool_id), false).await?;
            Ok(())
        }
        PoolsCommand::Delete { pool_id, yes } => {
            if !yes {
                anyhow::bail!("refusing to delete {pool_id} and all of its data without --yes");
            }
            let rows = store.delete_pool(&PoolId::new(pool_id.clone())).await?;
            tracing::info!(pool_id = %pool_id, rows, "pool deleted");
            Ok(())
        }
        PoolsCommand::Export { output } => {
            let path = output.unwrap_or_else(|| config.pools_config_path.clone());
            let count = store.export_config(&path).await?;
            tracing::info!(path = %path.display(), pools = count, "pools exported");
            Ok(())
        }
    }
}

/// Runs `stats`, printing the counts as JSON.
///
/// # Errors
///
/// Returns an error if the store fails.
pub async fn run_stats(config: &MonitorConfig) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    print_json(&store.stats().await?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
