use anyhow::{Context, Result};
use clap::Parser;
use retrolog::background_jobs::{jobs::EnrichmentPassJob, JobContext, JobScheduler};
use retrolog::catalog_store::{CatalogStore, SqliteCatalogStore};
use retrolog::config::{AppConfig, CliConfig, FileConfig};
use retrolog::enrichment::EnrichmentSettings;
use retrolog::rawg::RawgClient;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the catalog database.
    #[clap(value_parser = parse_path)]
    pub db_dir: PathBuf,

    /// Path to a TOML config file. File values override CLI values.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// RAWG API key. Falls back to the RAWG_API_KEY environment variable.
    #[clap(long)]
    pub api_key: Option<String>,

    /// Base URL of a proxy that injects the API key server-side.
    #[clap(long)]
    pub proxy_url: Option<String>,

    /// Maximum items enriched per pass.
    #[clap(long, default_value_t = 10)]
    pub batch_size: usize,

    /// Seconds between enrichment passes.
    #[clap(long, default_value_t = 300)]
    pub interval_secs: u64,

    /// Milliseconds to pause between items within a pass.
    #[clap(long, default_value_t = 500)]
    pub item_delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        db_dir: Some(cli_args.db_dir),
        api_key: cli_args
            .api_key
            .or_else(|| std::env::var("RAWG_API_KEY").ok()),
        proxy_url: cli_args.proxy_url,
        batch_size: cli_args.batch_size,
        interval_secs: cli_args.interval_secs,
        item_delay_ms: cli_args.item_delay_ms,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    let db_path = config.catalog_db_path();
    info!("Opening SQLite catalog database at {:?}...", db_path);
    let catalog_store = Arc::new(SqliteCatalogStore::new(&db_path)?);
    info!(
        "Catalog holds {} item(s) and {} cached screenshot(s)",
        catalog_store.count_items()?,
        catalog_store.count_screenshots()?
    );

    let remote = Arc::new(RawgClient::new(
        config.api_key.clone(),
        config.proxy_url.clone(),
    )?);

    let shutdown_token = CancellationToken::new();
    let (hook_sender, hook_receiver) = mpsc::channel(100);

    let job_context = JobContext::new(
        shutdown_token.child_token(),
        catalog_store.clone(),
        remote.clone(),
    );
    let mut scheduler = JobScheduler::new(hook_receiver, shutdown_token.clone(), job_context);
    scheduler.register_job(Arc::new(EnrichmentPassJob::new(
        config.enrichment.interval,
        EnrichmentSettings {
            batch_size: config.enrichment.batch_size,
            item_delay: config.enrichment.item_delay,
        },
    )));

    let scheduler_handle = tokio::spawn(async move { scheduler.run().await });

    info!("Enriching every {:?}; press Ctrl-C to stop", config.enrichment.interval);
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutting down...");

    shutdown_token.cancel();
    let _ = scheduler_handle.await;
    drop(hook_sender);

    Ok(())
}
