use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use clipdeck_seed_core::{
    AssetResolver, EntityFamily, MaintenanceApi, MemoryStore, SeedBackend, SeedResult,
};
use clipdeck_seed_pipeline::{Pipeline, PipelineOptions, RunReport, Snapshot};
use clipdeck_seed_store::{SeedConfig, SeedStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Command::Seed(args) => seed(args).await,
        Command::Counts(args) => counts(args).await,
    }
}

#[derive(Parser)]
#[command(author, version, about = "Developer utilities for Clipdeck datastores")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Clear the datastore and reconcile a snapshot directory into it.
    Seed(SeedArgs),
    /// Print per-family record counts as JSON.
    Counts(CountsArgs),
}

#[derive(Parser)]
struct SeedArgs {
    /// Directory holding the snapshot export files (user.json, video.json, ...).
    #[arg(long)]
    data: PathBuf,
    /// Directory where the datastore (config + sqlite file) lives.
    #[arg(long, default_value = ".clipdeck")]
    datastore: PathBuf,
    /// Base URL that relative asset paths are appended to.
    #[arg(long, env = "CLIPDECK_ASSET_BASE")]
    asset_base: Option<String>,
    /// Records applied concurrently per chunk (overrides the config file).
    #[arg(long)]
    chunk_size: Option<usize>,
    /// Reconcile into an in-memory store instead of the configured database.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Parser)]
struct CountsArgs {
    /// Directory where the datastore lives.
    #[arg(long, default_value = ".clipdeck")]
    datastore: PathBuf,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // `try_init` also installs the `log` bridge.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

async fn seed(args: SeedArgs) -> Result<()> {
    let config = SeedConfig::load_or_init(&args.datastore)
        .with_context(|| format!("load config in {}", args.datastore.display()))?;
    let options = pipeline_options(&config, &args)?;
    let snapshot = Snapshot::load_dir(&args.data)
        .with_context(|| format!("load snapshot from {}", args.data.display()))?;

    if args.dry_run {
        let store = MemoryStore::new();
        let report = run_pipeline(&store, options, snapshot).await?;
        log::info!("dry run complete; nothing was written to the datastore");
        return print_report(&report);
    }

    let store = SeedStore::connect(&config, &args.datastore)
        .await
        .with_context(|| format!("open datastore {}", args.datastore.display()))?;
    let outcome = run_pipeline(&store, options, snapshot).await;
    let report = close_after(outcome, store.close().await)?;
    print_report(&report)
}

/// The run's own error wins over a failed close, which is then only logged.
fn close_after<T>(outcome: Result<T>, closed: SeedResult<()>) -> Result<T> {
    match (outcome, closed) {
        (Ok(value), closed) => {
            closed.context("close datastore")?;
            Ok(value)
        }
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            log::warn!("close datastore after failure: {close_err}");
            Err(err)
        }
    }
}

async fn run_pipeline(
    store: &dyn SeedBackend,
    options: PipelineOptions,
    snapshot: Snapshot,
) -> Result<RunReport> {
    let pipeline = Pipeline::new(store, options).context("configure pipeline")?;
    let report = pipeline.run(snapshot).await.context("run pipeline")?;
    Ok(report)
}

fn pipeline_options(config: &SeedConfig, args: &SeedArgs) -> Result<PipelineOptions> {
    let assets = match &args.asset_base {
        Some(base) => AssetResolver::new(base.clone()),
        None => config.assets.resolver().ok_or_else(|| {
            anyhow!("asset base not configured; pass --asset-base or set CLIPDECK_ASSET_BASE")
        })?,
    };
    let reconcile = &config.reconcile;
    let mut options = PipelineOptions::new(assets)
        .with_chunk_size(args.chunk_size.unwrap_or(reconcile.chunk_size));
    options.owner_user_ids = reconcile.owner_user_ids;
    options.owner_video_ids = reconcile.owner_video_ids;
    Ok(options)
}

fn print_report(report: &RunReport) -> Result<()> {
    let payload = serde_json::to_string_pretty(report).context("serialize report")?;
    println!("{payload}");
    Ok(())
}

async fn counts(args: CountsArgs) -> Result<()> {
    let store = open_existing(&args.datastore).await?;
    let result = collect_counts(&store).await;
    let counts = close_after(result, store.close().await)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&counts).context("serialize counts")?
    );
    Ok(())
}

async fn open_existing(datastore: &Path) -> Result<SeedStore> {
    if !datastore.exists() {
        return Err(anyhow!(
            "datastore '{}' does not exist; run `seed` first",
            datastore.display()
        ));
    }
    SeedStore::open(datastore)
        .await
        .with_context(|| format!("open datastore {}", datastore.display()))
}

async fn collect_counts(store: &SeedStore) -> Result<BTreeMap<&'static str, u64>> {
    let mut counts = BTreeMap::new();
    for family in EntityFamily::RECONCILE_ORDER {
        let total = store
            .count_family(family)
            .await
            .with_context(|| format!("count {family}"))?;
        counts.insert(family.as_str(), total);
    }
    Ok(counts)
}
