//! kvstory server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, and serves the story API over HTTP.
//!
//! # Index repair
//!
//! To drop index ids whose story entry no longer exists and exit:
//!
//! ```
//! cargo run -p kvstory-server -- --prune-index
//! ```

mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use kvstory_api::AppState;
use kvstory_core::KvConnector as _;
use kvstory_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::{ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "kvstory story server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Remove index ids whose story entry is missing, then exit.
  #[arg(long)]
  prune_index: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg =
    ServerConfig::load(&cli.config).context("failed to load configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if cli.prune_index {
    let kv = store
      .connect(&server_cfg.namespace)
      .context("failed to connect to namespace")?;
    let pruned = kvstory_api::repair::prune_index(&kv)
      .await
      .context("index repair failed")?;
    println!("pruned {} orphaned id(s)", pruned.len());
    for id in pruned {
      println!("  {id}");
    }
    return Ok(());
  }

  let app = kvstory_api::router(AppState::new(store, server_cfg.namespace.as_str()));
  let address = server_cfg.address();

  tracing::info!(namespace = %server_cfg.namespace, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
