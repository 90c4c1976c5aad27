//! wordup-ingest - Word list upload microservice
//!
//! Accepts `.txt`, `.xlsx` and `.json` uploads, enriches the words with
//! translations from the sharded reference dictionary, and merges them into
//! the persisted wordbook held in a GitHub repository.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wordup_common::config::TomlConfig;
use wordup_ingest::archive::RawArchive;
use wordup_ingest::dictionary::{GithubShardSource, LocalShardSource, ShardSource, StaticShardSource};
use wordup_ingest::merge::MergeStore;
use wordup_ingest::pipeline::IngestPipeline;
use wordup_ingest::store::github::{GithubContentsClient, GithubRepo};
use wordup_ingest::store::{ContentStore, MemoryContentStore};
use wordup_ingest::{build_router, AppState};

/// Commit message used for verbatim file archives
const ARCHIVE_COMMIT_MESSAGE: &str = "File uploaded via web app";

/// Command-line arguments for wordup-ingest
#[derive(Parser, Debug)]
#[command(name = "wordup-ingest")]
#[command(about = "Word list upload and enrichment service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "WORDUP_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Keep the collection in memory instead of a remote repository
    #[arg(long)]
    offline: bool,

    /// Read dictionary shards from this directory (offline mode)
    #[arg(long)]
    dict_dir: Option<PathBuf>,

    /// Access token for the contents API
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = args.host.clone() {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting wordup-ingest v{} (dedup: {:?}, conflict retries: {})",
        env!("CARGO_PKG_VERSION"),
        config.merge.dedup,
        config.merge.conflict_retries
    );

    let (store, shards) = if args.offline {
        build_offline(&args)
    } else {
        build_remote(&config, args.github_token.clone())?
    };

    let merge = MergeStore::new(
        store.clone(),
        config.store.collection_path.clone(),
        config.merge.dedup,
        config.store.commit_message.clone(),
    );
    let pipeline =
        IngestPipeline::new(shards, merge).with_conflict_retries(config.merge.conflict_retries);
    let archive = RawArchive::new(store, config.store.upload_dir.clone(), ARCHIVE_COMMIT_MESSAGE);

    let state = AppState::new(pipeline, archive, config.max_upload_bytes);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind to {}:{}", config.host, config.port))?;
    let addr = listener.local_addr()?;
    info!("wordup-ingest listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn build_offline(args: &Args) -> (Arc<dyn ContentStore>, Arc<dyn ShardSource>) {
    info!("Offline mode: collection is kept in memory and lost on exit");

    let shards: Arc<dyn ShardSource> = match &args.dict_dir {
        Some(dir) => {
            info!("Dictionary shards: {}", dir.display());
            Arc::new(LocalShardSource::new(dir))
        }
        None => {
            info!("No dictionary configured; every word gets the placeholder translation");
            Arc::new(StaticShardSource::new())
        }
    };

    let store: Arc<dyn ContentStore> = Arc::new(MemoryContentStore::new());
    (store, shards)
}

fn build_remote(
    config: &TomlConfig,
    token: Option<String>,
) -> Result<(Arc<dyn ContentStore>, Arc<dyn ShardSource>)> {
    config.validate_remote()?;

    if token.is_none() {
        tracing::warn!("GITHUB_TOKEN not set; writes to the collection repository will be rejected");
    }

    let store_repo = GithubRepo {
        api_base: config.store.api_base.clone(),
        owner: config.store.owner.clone(),
        repo: config.store.repo.clone(),
        branch: config.store.branch.clone(),
    };
    let dictionary_repo = GithubRepo {
        api_base: config.dictionary.api_base.clone(),
        owner: config.dictionary.owner.clone(),
        repo: config.dictionary.repo.clone(),
        branch: config.dictionary.branch.clone(),
    };

    info!(
        "Collection: {}/{}@{}:{}",
        store_repo.owner, store_repo.repo, store_repo.branch, config.store.collection_path
    );
    info!(
        "Dictionary: {}/{}@{}:{}",
        dictionary_repo.owner, dictionary_repo.repo, dictionary_repo.branch, config.dictionary.shard_dir
    );

    let store = GithubContentsClient::new(store_repo, token.clone())
        .context("Failed to create collection store client")?;
    let dictionary = GithubContentsClient::new(dictionary_repo, token)
        .context("Failed to create dictionary client")?;

    let store: Arc<dyn ContentStore> = Arc::new(store);
    let shards: Arc<dyn ShardSource> = Arc::new(GithubShardSource::new(
        Arc::new(dictionary),
        config.dictionary.shard_dir.clone(),
    ));

    Ok((store, shards))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
