use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use parkpos_lib::domain::value_objects::OperationId;
use parkpos_lib::infrastructure::offline::metrics;
use parkpos_lib::infrastructure::remote::StaticTokenProvider;
use parkpos_lib::{AppConfig, AppContext, QueuedOperation, RetrySelection, SyncIndicator};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "parkpos-queue")]
#[command(about = "Inspect and drain the offline operation queue", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database URL (defaults to the per-user data directory)
    #[arg(long, env = "PARKPOS_DATABASE_URL")]
    database_url: Option<String>,

    /// Access token used when replaying operations
    #[arg(long, env = "PARKPOS_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log filter (trace, debug, info, warn, error)
    #[arg(short, long, env = "LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show queue counters and the sync indicator
    Status,
    /// List outstanding operations, oldest first
    List {
        /// Include synced operations
        #[arg(long)]
        all: bool,
    },
    /// Replay pending operations now
    Sync,
    /// Send errored operations again
    Retry {
        /// Operation ids to retry; all errored operations when omitted
        #[arg(long = "id")]
        ids: Vec<i64>,
    },
    /// Archive synced operations older than the retention window
    Prune {
        /// Retention in days (defaults to the configured window)
        #[arg(long)]
        days: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    parkpos_lib::init_logging(cli.log_level.as_deref());

    let mut config = AppConfig::from_env();
    if let Some(url) = cli.database_url.clone() {
        config.database.url = url;
    }
    let tokens = Arc::new(StaticTokenProvider::new(cli.token.clone())?);
    let ctx = AppContext::new(config, tokens, true)
        .await
        .context("failed to open offline queue")?;

    let outcome = run(&ctx, cli.command).await;
    ctx.shutdown().await;
    outcome
}

async fn run(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Status => {
            let counts = ctx.queue.counts().await?;
            let indicator = SyncIndicator::derive(&ctx.monitor.current(), &counts);
            println!(
                "pending: {}  errored: {}  synced: {}",
                counts.pending, counts.errored, counts.synced
            );
            println!("indicator: {}", serde_json::to_string(&indicator)?);
        }
        Commands::List { all } => {
            let operations = if all {
                ctx.queue.list_all().await?
            } else {
                ctx.queue.list_pending_and_errors().await?
            };
            if operations.is_empty() {
                println!("queue is empty");
            }
            for op in &operations {
                println!("{}", describe(op));
            }
        }
        Commands::Sync => {
            let result = ctx.sync_engine.sync_now("cli").await?;
            report(ctx, result.synced, result.failed);
        }
        Commands::Retry { ids } => {
            let selection = if ids.is_empty() {
                RetrySelection::AllErrored
            } else {
                let ids = ids
                    .into_iter()
                    .map(OperationId::new)
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(anyhow::Error::msg)?;
                RetrySelection::Only(ids)
            };
            let result = ctx.sync_engine.retry_sync(selection).await?;
            report(ctx, result.synced, result.failed);
        }
        Commands::Prune { days } => {
            let mut sync = ctx.config.sync.clone();
            if let Some(days) = days {
                sync.synced_retention_days = days;
            }
            let archived = ctx.queue.prune_synced(sync.synced_retention()).await?;
            info!(archived, "prune finished");
            println!("archived {archived} synced operation(s)");
        }
    }
    Ok(())
}

fn report(ctx: &AppContext, synced: u32, failed: u32) {
    println!("synced: {synced}  failed: {failed}");
    if let Some(kind) = ctx.monitor.current().last_sync_error {
        println!("pass stopped early: {kind:?}");
    }
    let totals = metrics::snapshot();
    info!(
        passes = totals.total_passes,
        synced = totals.operations_synced,
        failed = totals.operations_failed,
        "sync metrics"
    );
}

fn describe(op: &QueuedOperation) -> String {
    let mut line = format!(
        "#{:<5} {:<7} {:<8} {:<12} {} {}",
        op.id.value(),
        op.status.as_str(),
        op.kind.as_str(),
        op.subject_key.as_str(),
        op.entity_id,
        op.created_at.to_rfc3339()
    );
    if let Some(message) = &op.error_message {
        line.push_str(&format!("  ({message})"));
    }
    line
}
