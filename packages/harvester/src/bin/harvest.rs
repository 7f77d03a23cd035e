//! Harvest CLI
//!
//! Runs one harvest against local storage (`./storage` in the Apify local
//! layout) or the Apify platform, and prints the run summary as JSON.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use apify_client::ApifyClient;
use clap::Parser;
use harvester::config::{read_input, Settings, StorageKind};
use harvester::{
    ApifyStore, Dataset, FileStore, HarvestConfig, Harvester, KeyValueStore, ProxyPool,
    ReqwestTransport, RunSummary, SourceClient,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "harvest")]
#[command(about = "Harvest justjoin.it job offers into a dataset")]
struct Cli {
    /// Input JSON file (defaults to the store's INPUT record)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Local storage directory
    #[arg(long)]
    storage_dir: Option<PathBuf>,

    /// Override maxItems from the input (0 or less means unlimited)
    #[arg(long)]
    max_items: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,harvester=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env().context("Failed to load settings")?;
    if let Some(dir) = cli.storage_dir {
        settings.storage_dir = dir;
    }
    let input_path = cli.input.or_else(|| settings.input_path.clone());

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    let summary = match settings.storage {
        StorageKind::Local => {
            let store = FileStore::open(&settings.storage_dir)
                .await
                .with_context(|| {
                    format!("Failed to open storage at {}", settings.storage_dir.display())
                })?;
            info!(dir = %settings.storage_dir.display(), "Using local storage");
            run(Arc::new(store), &settings, input_path.as_deref(), cli.max_items, cancel).await?
        }
        StorageKind::Apify => {
            let apify = &settings.apify;
            let token = apify.token.clone().context("APIFY_TOKEN must be set")?;
            let store_id = apify
                .key_value_store_id
                .clone()
                .context("APIFY_DEFAULT_KEY_VALUE_STORE_ID must be set")?;
            let dataset_id = apify
                .dataset_id
                .clone()
                .context("APIFY_DEFAULT_DATASET_ID must be set")?;
            info!(store_id = %store_id, dataset_id = %dataset_id, "Using Apify storage");

            let store = ApifyStore::new(ApifyClient::new(token), store_id, dataset_id);
            run(Arc::new(store), &settings, input_path.as_deref(), cli.max_items, cancel).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn run<S>(
    store: Arc<S>,
    settings: &Settings,
    input_path: Option<&Path>,
    max_items: Option<i64>,
    cancel: CancellationToken,
) -> Result<RunSummary>
where
    S: KeyValueStore + Dataset + 'static,
{
    let input = read_input(&store, input_path)
        .await
        .context("Failed to load run input")?;

    let mut config = HarvestConfig::from_input(&input);
    if let Some(n) = max_items {
        config = config.with_max_items(u64::try_from(n).ok().filter(|n| *n > 0));
    }

    let proxy = input
        .proxy_configuration
        .as_ref()
        .and_then(|p| ProxyPool::from_input(p, settings.apify.proxy_password.as_deref()));
    let transport = ReqwestTransport::new().context("Failed to build HTTP client")?;
    let client = SourceClient::new(transport)
        .with_proxy(proxy)
        .with_origin(config.endpoints.site_origin.clone());

    let harvester = Harvester::new(client, store.clone(), store, config);
    let summary = harvester.run(cancel).await.context("Harvest failed")?;
    Ok(summary)
}

/// Cancel `cancel` on Ctrl+C or SIGTERM.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Received shutdown signal, stopping harvest");
    cancel.cancel();
}
